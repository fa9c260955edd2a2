//! Storage collaborator for tasks and study plans.
//!
//! Persistence is owned by a hosted backend; this module only defines the
//! request/response contract and two implementations:
//! - [`SupabaseTaskStore`]: PostgREST over HTTP
//! - [`MemoryTaskStore`]: process-local, for development and tests
//!
//! Failures never surface as errors. They are logged and collapse into
//! `None`, an empty list or `false`.

mod memory;
mod supabase;

pub use memory::MemoryTaskStore;
pub use supabase::{SupabaseSession, SupabaseTaskStore};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::planner::StudyPlan;
use crate::task::{NewTask, Task, TaskPatch};

/// A study plan row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPlan {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub date: NaiveDate,
    pub plan: StudyPlan,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Trait for task storage backends.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a new pending task.
    async fn save(&self, task: NewTask) -> Option<Task>;

    /// All tasks ordered by deadline, earliest first.
    async fn list(&self) -> Vec<Task>;

    /// Tasks whose deadline falls on `date` in local time.
    async fn list_for_date(&self, date: NaiveDate) -> Vec<Task>;

    /// Apply a partial update and bump `updated_at`.
    async fn update(&self, id: Uuid, patch: TaskPatch) -> Option<Task>;

    async fn delete(&self, id: Uuid) -> bool;

    async fn study_plan(&self, date: NaiveDate) -> Option<StoredPlan>;

    /// Insert or replace the plan stored for `date`.
    async fn save_study_plan(&self, date: NaiveDate, plan: StudyPlan) -> Option<StoredPlan>;
}

/// `[start, end)` of `date` in local time, as UTC instants.
pub(crate) fn local_day_bounds(date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()?;
    let next = date.succ_opt()?;
    let end = Local
        .from_local_datetime(&next.and_time(NaiveTime::MIN))
        .earliest()?;
    Some((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}
