//! Task value types shared by extraction, planning and storage.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shortest task duration in minutes.
pub const MIN_DURATION: u32 = 15;
/// Longest task duration in minutes.
pub const MAX_DURATION: u32 = 480;
/// Duration used when none can be determined.
pub const DEFAULT_DURATION: u32 = 60;
/// Hour of day assigned to deadlines that carry no explicit time.
pub const DEFAULT_DEADLINE_HOUR: u32 = 18;
/// Upper bound for locally derived titles.
pub const MAX_TITLE_CHARS: usize = 50;

/// Task priority. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Accept only the exact lowercase wire names.
    pub fn from_exact(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Human-facing label ("Low", "Medium", "High").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp a duration in minutes into `[MIN_DURATION, MAX_DURATION]`.
pub fn clamp_duration(minutes: i64) -> u32 {
    minutes.clamp(MIN_DURATION as i64, MAX_DURATION as i64) as u32
}

/// The normalized result of task extraction.
///
/// Invariants: `title` is non-empty and `duration` lies within
/// `[MIN_DURATION, MAX_DURATION]`. Both extraction paths uphold them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredTask {
    pub title: String,
    /// Minutes
    pub duration: u32,
    pub deadline: DateTime<FixedOffset>,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Lifecycle state of a stored task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// A task row as persisted by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub duration: u32,
    pub deadline: DateTime<FixedOffset>,
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub duration: u32,
    pub deadline: DateTime<FixedOffset>,
    pub priority: Priority,
}

impl NewTask {
    /// Trimmed title and a duration clamped into range. Every store writes
    /// this form.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            duration: clamp_duration(self.duration as i64),
            ..self
        }
    }
}

impl From<StructuredTask> for NewTask {
    fn from(task: StructuredTask) -> Self {
        Self {
            title: task.title,
            description: task.description,
            duration: task.duration,
            deadline: task.deadline,
            priority: task.priority,
        }
    }
}

/// Partial update of a stored task. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    /// Same rules as [`NewTask::normalized`] for the fields present.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.map(|t| t.trim().to_string()),
            duration: self.duration.map(|d| clamp_duration(d as i64)),
            ..self
        }
    }

    /// Apply this patch onto a task, stamping `updated_at`.
    pub fn apply(&self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(duration) = self.duration {
            task.duration = clamp_duration(duration as i64);
        }
        if let Some(deadline) = self.deadline {
            task.deadline = deadline;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        task.updated_at = now;
    }
}

/// The date `days` calendar days after `now`, at `DEFAULT_DEADLINE_HOUR`
/// local to `now`'s time zone. `None` only when the date is out of range.
///
/// Counts calendar days rather than multiples of 24 hours, so across a DST
/// change the date still advances by exactly `days`.
pub fn deadline_in_days<Tz: TimeZone>(now: &DateTime<Tz>, days: u64) -> Option<DateTime<FixedOffset>> {
    let date = now.date_naive().checked_add_days(Days::new(days))?;
    // 18:00 can fall into a DST gap; fall back to the offset in effect now.
    at_deadline_hour(date, &now.timezone()).or_else(|| at_deadline_hour(date, &now.offset().fix()))
}

/// `date` at `DEFAULT_DEADLINE_HOUR:00:00.000` in `tz`.
pub fn at_deadline_hour<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<FixedOffset>> {
    let time = NaiveTime::from_hms_opt(DEFAULT_DEADLINE_HOUR, 0, 0)?;
    let local = tz.from_local_datetime(&date.and_time(time)).earliest()?;
    Some(local.with_timezone(&local.offset().fix()))
}
