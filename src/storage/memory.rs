//! Process-local task store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{local_day_bounds, StoredPlan, TaskStore};
use crate::planner::StudyPlan;
use crate::task::{NewTask, Task, TaskPatch, TaskStatus};

/// In-memory store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
    plans: RwLock<HashMap<NaiveDate, StoredPlan>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn save(&self, input: NewTask) -> Option<Task> {
        let input = input.normalized();
        if input.title.is_empty() {
            tracing::warn!("Refusing to save task with empty title");
            return None;
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            user_id: None,
            title: input.title,
            description: input.description,
            duration: input.duration,
            deadline: input.deadline,
            priority: input.priority,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.tasks.write().await.insert(task.id, task.clone());
        tracing::debug!("Saved task {}", task.id);
        Some(task)
    }

    async fn list(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.read().await.values().cloned().collect();
        tasks.sort_by_key(|t| t.deadline);
        tasks
    }

    async fn list_for_date(&self, date: NaiveDate) -> Vec<Task> {
        let Some((start, end)) = local_day_bounds(date) else {
            return Vec::new();
        };
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| {
                let deadline = t.deadline.with_timezone(&Utc);
                deadline >= start && deadline < end
            })
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.deadline);
        tasks
    }

    async fn update(&self, id: Uuid, patch: TaskPatch) -> Option<Task> {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(&id) else {
            tracing::warn!("Task {} not found for update", id);
            return None;
        };
        patch.normalized().apply(task, Utc::now());
        Some(task.clone())
    }

    async fn delete(&self, id: Uuid) -> bool {
        self.tasks.write().await.remove(&id).is_some()
    }

    async fn study_plan(&self, date: NaiveDate) -> Option<StoredPlan> {
        self.plans.read().await.get(&date).cloned()
    }

    async fn save_study_plan(&self, date: NaiveDate, plan: StudyPlan) -> Option<StoredPlan> {
        let mut plans = self.plans.write().await;
        let now = Utc::now();
        let stored = match plans.get(&date) {
            Some(existing) => StoredPlan {
                plan,
                updated_at: Some(now),
                ..existing.clone()
            },
            None => StoredPlan {
                id: Uuid::new_v4(),
                user_id: None,
                date,
                plan,
                created_at: now,
                updated_at: None,
            },
        };
        plans.insert(date, stored.clone());
        Some(stored)
    }
}
