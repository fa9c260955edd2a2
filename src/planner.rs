//! Daily study plan generation.
//!
//! The remote model is asked to lay out the day; whenever it cannot (no
//! tasks, endpoint down, unusable answer) a fixed default schedule is
//! returned instead. [`StudyPlanGenerator::generate`] never fails.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::json::extract_json_object;
use crate::llm::InferenceClient;
use crate::task::display::{clock_minutes, duration_display, format_time};
use crate::task::{ExtractionError, Priority, Task};

/// What the planner needs to know about a task. Clients may send this
/// shape directly; stored rows convert into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTask {
    /// Opaque to the planner, echoed back as `taskId`.
    pub id: String,
    pub title: String,
    pub duration: u32,
    pub deadline: DateTime<FixedOffset>,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&Task> for PlanTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.to_string(),
            title: task.title.clone(),
            duration: task.duration,
            deadline: task.deadline,
            priority: task.priority,
            description: task.description.clone(),
        }
    }
}

/// One block of the day: a study session or a break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
    /// `HH:MM`
    pub start: String,
    /// `HH:MM`
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(rename = "taskId", default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(rename = "break", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_break: bool,
}

impl ScheduleItem {
    pub fn session(start: &str, end: &str, task: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
            task: Some(task.to_string()),
            task_id: None,
            is_break: false,
        }
    }

    pub fn rest(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
            task: None,
            task_id: None,
            is_break: true,
        }
    }

    /// Length of the block in minutes, `None` if either bound is not `HH:MM`.
    pub fn minutes(&self) -> Option<i64> {
        let start = clock_minutes(&self.start)? as i64;
        let end = clock_minutes(&self.end)? as i64;
        Some(end - start)
    }
}

/// A day's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPlan {
    pub date: NaiveDate,
    pub schedule: Vec<ScheduleItem>,
}

impl StudyPlan {
    /// The fixed schedule used whenever generation is not possible.
    pub fn default_for(date: NaiveDate) -> Self {
        Self {
            date,
            schedule: vec![
                ScheduleItem::session("08:00", "09:00", "Morning Review"),
                ScheduleItem::rest("09:00", "09:15"),
                ScheduleItem::session("09:15", "10:15", "Main Task"),
                ScheduleItem::rest("10:15", "10:30"),
                ScheduleItem::session("10:30", "11:30", "Secondary Task"),
            ],
        }
    }

    /// Total minutes of non-break blocks.
    pub fn study_minutes(&self) -> i64 {
        self.schedule
            .iter()
            .filter(|item| !item.is_break)
            .filter_map(ScheduleItem::minutes)
            .sum()
    }

    /// Printable agenda: one line per block and a study-time total.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Study plan for {}", self.date)];
        for item in &self.schedule {
            let start = format_time(&item.start).unwrap_or_else(|| item.start.clone());
            let end = format_time(&item.end).unwrap_or_else(|| item.end.clone());
            let label = match (&item.task, item.is_break) {
                (_, true) => "Break",
                (Some(task), false) => task.as_str(),
                (None, false) => "Study",
            };
            lines.push(format!("  {} - {}  {}", start, end, label));
        }
        let total = u32::try_from(self.study_minutes()).unwrap_or(0);
        lines.push(format!("Total study time: {}", duration_display(total)));
        lines.join("\n")
    }
}

/// Remote-first plan generator with a static fallback.
pub struct StudyPlanGenerator {
    client: Option<Arc<dyn InferenceClient>>,
}

impl StudyPlanGenerator {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Generator that always returns the default schedule.
    pub fn local_only() -> Self {
        Self { client: None }
    }

    /// Plan today's schedule.
    pub async fn generate(&self, tasks: &[PlanTask]) -> StudyPlan {
        self.generate_for(tasks, Local::now().date_naive()).await
    }

    /// Plan the schedule for `today`.
    pub async fn generate_for(&self, tasks: &[PlanTask], today: NaiveDate) -> StudyPlan {
        if tasks.is_empty() {
            tracing::debug!("No tasks to schedule, using default plan");
            return StudyPlan::default_for(today);
        }

        let Some(client) = &self.client else {
            return StudyPlan::default_for(today);
        };

        match self.try_remote(client.as_ref(), tasks, today).await {
            Ok(plan) => {
                tracing::info!("Study plan generated with {} blocks", plan.schedule.len());
                plan
            }
            Err(e) => {
                tracing::warn!("Study plan generation failed, using fallback: {}", e);
                StudyPlan::default_for(today)
            }
        }
    }

    async fn try_remote(
        &self,
        client: &dyn InferenceClient,
        tasks: &[PlanTask],
        today: NaiveDate,
    ) -> Result<StudyPlan, ExtractionError> {
        let response = client.infer(&build_plan_prompt(tasks)).await?;
        let object = extract_json_object(&response).map_err(ExtractionError::MalformedResponse)?;
        validate_plan_object(object, today)
    }
}

/// Prompt describing the tasks and the scheduling rules.
pub fn build_plan_prompt(tasks: &[PlanTask]) -> String {
    let task_descriptions = tasks
        .iter()
        .map(|t| {
            format!(
                "- \"{}\" (id: {}, {} min, priority: {}, deadline: {})",
                t.title,
                t.id,
                t.duration,
                t.priority,
                t.deadline.to_rfc3339()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Create an optimized study schedule for today. Return ONLY valid JSON (no markdown, no extra text):

Tasks to schedule:
{task_descriptions}

Return JSON with this exact structure:
{{
  "date": "YYYY-MM-DD",
  "schedule": [
    {{ "start": "HH:MM", "end": "HH:MM", "task": "task name", "taskId": "id" }},
    {{ "start": "HH:MM", "end": "HH:MM", "break": true }}
  ]
}}

Rules:
- Schedule from 08:00 to 22:00
- Max 2 hours per study session
- Include 10-15 minute breaks between sessions
- Prioritize high priority tasks and urgent deadlines
- Schedule heavier tasks earlier in the day
- Return ONLY the JSON object, nothing else"#
    )
}

/// Accept a model-provided plan when `schedule` is an array of well-formed
/// blocks. A missing or unreadable `date` falls back to `today`.
pub fn validate_plan_object(
    mut object: serde_json::Map<String, Value>,
    today: NaiveDate,
) -> Result<StudyPlan, ExtractionError> {
    let schedule = match object.remove("schedule") {
        Some(Value::Array(items)) => items,
        _ => {
            return Err(ExtractionError::MalformedResponse(
                "missing schedule array".to_string(),
            ))
        }
    };

    let schedule: Vec<ScheduleItem> = serde_json::from_value(Value::Array(schedule))
        .map_err(|e| ExtractionError::MalformedResponse(format!("invalid schedule item: {}", e)))?;

    if let Some(bad) = schedule.iter().find(|item| item.minutes().is_none()) {
        return Err(ExtractionError::MalformedResponse(format!(
            "invalid block times {}-{}",
            bad.start, bad.end
        )));
    }

    let date = object
        .get("date")
        .and_then(Value::as_str)
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
        .unwrap_or(today);

    Ok(StudyPlan { date, schedule })
}
