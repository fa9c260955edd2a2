//! Supabase client for the `tasks` and `study_plans` tables (PostgREST).

use async_trait::async_trait;
use chrono::{NaiveDate, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder};
use uuid::Uuid;

use super::{local_day_bounds, StoredPlan, TaskStore};
use crate::planner::StudyPlan;
use crate::task::{NewTask, Task, TaskPatch, TaskStatus};

/// The signed-in user on whose behalf rows are written.
#[derive(Debug, Clone)]
pub struct SupabaseSession {
    pub access_token: String,
    pub user_id: Uuid,
}

/// Supabase-backed task store.
pub struct SupabaseTaskStore {
    client: Client,
    url: String,
    api_key: String,
    session: Option<SupabaseSession>,
}

impl SupabaseTaskStore {
    /// Create a new Supabase store authenticated with the project API key only.
    pub fn new(url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            session: None,
        }
    }

    /// Act on behalf of a signed-in user. Row-level security sees their token.
    pub fn with_session(mut self, session: SupabaseSession) -> Self {
        self.session = Some(session);
        self
    }

    /// Get the PostgREST URL.
    fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.url)
    }

    /// Attach the API key and bearer token.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .session
            .as_ref()
            .map(|s| s.access_token.as_str())
            .unwrap_or(&self.api_key);
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    fn user_id(&self) -> anyhow::Result<Uuid> {
        self.session
            .as_ref()
            .map(|s| s.user_id)
            .ok_or_else(|| anyhow::anyhow!("User not authenticated"))
    }

    /// Read a `return=representation` body and take the first row.
    async fn first_row<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
        what: &str,
    ) -> anyhow::Result<Option<T>> {
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            anyhow::bail!("Failed to {}: {} - {}", what, status, text);
        }

        let rows: Vec<T> = serde_json::from_str(&text)?;
        Ok(rows.into_iter().next())
    }

    // ==================== Tasks ====================

    async fn try_save(&self, input: NewTask) -> anyhow::Result<Option<Task>> {
        let input = input.normalized();
        if input.title.is_empty() {
            anyhow::bail!("Task title must not be empty");
        }
        let body = serde_json::json!({
            "user_id": self.user_id()?,
            "title": input.title,
            "description": input.description,
            "duration": input.duration,
            "deadline": input.deadline.to_rfc3339(),
            "priority": input.priority,
            "status": TaskStatus::Pending,
        });

        let resp = self
            .authorize(self.client.post(format!("{}/tasks", self.rest_url())))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;

        Self::first_row(resp, "create task").await
    }

    async fn try_list(&self, date: Option<NaiveDate>) -> anyhow::Result<Vec<Task>> {
        let mut query: Vec<(&str, String)> = vec![
            ("select", "*".to_string()),
            ("order", "deadline.asc".to_string()),
        ];

        if let Some(date) = date {
            let (start, end) = local_day_bounds(date)
                .ok_or_else(|| anyhow::anyhow!("Date out of range: {}", date))?;
            query.push((
                "deadline",
                format!("gte.{}", start.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ));
            query.push((
                "deadline",
                format!("lt.{}", end.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ));
        }

        let resp = self
            .authorize(self.client.get(format!("{}/tasks", self.rest_url())))
            .query(&query)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            anyhow::bail!("Failed to list tasks: {} - {}", status, text);
        }

        Ok(serde_json::from_str(&text)?)
    }

    async fn try_update(&self, id: Uuid, patch: TaskPatch) -> anyhow::Result<Option<Task>> {
        let mut body = serde_json::to_value(patch.normalized())?;
        body["updated_at"] = serde_json::Value::String(Utc::now().to_rfc3339());

        let resp = self
            .authorize(
                self.client
                    .patch(format!("{}/tasks?id=eq.{}", self.rest_url(), id)),
            )
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;

        Self::first_row(resp, "update task").await
    }

    async fn try_delete(&self, id: Uuid) -> anyhow::Result<()> {
        let resp = self
            .authorize(
                self.client
                    .delete(format!("{}/tasks?id=eq.{}", self.rest_url(), id)),
            )
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            anyhow::bail!("Failed to delete task: {}", text);
        }

        Ok(())
    }

    // ==================== Study plans ====================

    async fn try_get_plan(&self, date: NaiveDate) -> anyhow::Result<Option<StoredPlan>> {
        let resp = self
            .authorize(self.client.get(format!(
                "{}/study_plans?date=eq.{}&limit=1",
                self.rest_url(),
                date
            )))
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            anyhow::bail!("Failed to fetch study plan: {} - {}", status, text);
        }

        let plans: Vec<StoredPlan> = serde_json::from_str(&text)?;
        Ok(plans.into_iter().next())
    }

    async fn try_save_plan(
        &self,
        date: NaiveDate,
        plan: StudyPlan,
    ) -> anyhow::Result<Option<StoredPlan>> {
        let user_id = self.user_id()?;

        let request = match self.try_get_plan(date).await? {
            Some(existing) => self
                .authorize(self.client.patch(format!(
                    "{}/study_plans?id=eq.{}",
                    self.rest_url(),
                    existing.id
                )))
                .json(&serde_json::json!({
                    "plan": plan,
                    "updated_at": Utc::now().to_rfc3339(),
                })),
            None => self
                .authorize(self.client.post(format!("{}/study_plans", self.rest_url())))
                .json(&serde_json::json!({
                    "user_id": user_id,
                    "date": date,
                    "plan": plan,
                })),
        };

        let resp = request
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .send()
            .await?;

        Self::first_row(resp, "save study plan").await
    }
}

#[async_trait]
impl TaskStore for SupabaseTaskStore {
    async fn save(&self, task: NewTask) -> Option<Task> {
        self.try_save(task).await.unwrap_or_else(|e| {
            tracing::error!("Error adding task: {}", e);
            None
        })
    }

    async fn list(&self) -> Vec<Task> {
        self.try_list(None).await.unwrap_or_else(|e| {
            tracing::error!("Error fetching tasks: {}", e);
            Vec::new()
        })
    }

    async fn list_for_date(&self, date: NaiveDate) -> Vec<Task> {
        self.try_list(Some(date)).await.unwrap_or_else(|e| {
            tracing::error!("Error fetching tasks for {}: {}", date, e);
            Vec::new()
        })
    }

    async fn update(&self, id: Uuid, patch: TaskPatch) -> Option<Task> {
        self.try_update(id, patch).await.unwrap_or_else(|e| {
            tracing::error!("Error updating task {}: {}", id, e);
            None
        })
    }

    async fn delete(&self, id: Uuid) -> bool {
        match self.try_delete(id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error deleting task {}: {}", id, e);
                false
            }
        }
    }

    async fn study_plan(&self, date: NaiveDate) -> Option<StoredPlan> {
        self.try_get_plan(date).await.unwrap_or_else(|e| {
            tracing::error!("Error fetching study plan: {}", e);
            None
        })
    }

    async fn save_study_plan(&self, date: NaiveDate, plan: StudyPlan) -> Option<StoredPlan> {
        self.try_save_plan(date, plan).await.unwrap_or_else(|e| {
            tracing::error!("Error saving study plan: {}", e);
            None
        })
    }
}
