//! Task extraction as a chain of resolvers.
//!
//! Resolvers are tried in order; the first one that produces a task wins.
//! The chain always ends in the [`HeuristicParser`], which cannot fail, so
//! [`TaskExtractor::extract`] has no error path.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, TimeZone};
use serde_json::{Map, Value};

use super::heuristic::HeuristicParser;
use super::types::{
    at_deadline_hour, clamp_duration, Priority, StructuredTask, DEFAULT_DURATION,
};
use crate::json::extract_json_object;
use crate::llm::{InferenceClient, LlmError};

/// Why a resolver could not produce a task.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The inference client failed (missing credential or unreachable endpoint).
    #[error(transparent)]
    Remote(#[from] LlmError),
    /// The model answered, but not with a usable task object.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// One tier of the extraction chain.
#[async_trait]
pub trait TaskResolver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn attempt(
        &self,
        text: &str,
        now: &DateTime<Local>,
    ) -> Result<StructuredTask, ExtractionError>;
}

/// Which tier produced an extracted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    Resolver(&'static str),
    Heuristic,
}

impl ExtractionSource {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Resolver(name) => name,
            Self::Heuristic => "heuristic",
        }
    }
}

/// A task together with the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub task: StructuredTask,
    pub source: ExtractionSource,
}

/// Ordered resolver chain with a guaranteed-total last resort.
pub struct TaskExtractor {
    resolvers: Vec<Box<dyn TaskResolver>>,
    fallback: HeuristicParser,
}

impl TaskExtractor {
    /// Build an extractor from an ordered list of resolvers.
    pub fn new(resolvers: Vec<Box<dyn TaskResolver>>) -> Self {
        Self {
            resolvers,
            fallback: HeuristicParser,
        }
    }

    /// Remote model first, heuristic parser second.
    pub fn with_remote(client: Arc<dyn InferenceClient>) -> Self {
        Self::new(vec![Box::new(RemoteResolver::new(client))])
    }

    /// Heuristic parser only.
    pub fn local_only() -> Self {
        Self::new(Vec::new())
    }

    pub fn resolver_names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Extract a task from free text, relative to the current local time.
    pub async fn extract(&self, text: &str) -> StructuredTask {
        self.extract_at(text, Local::now()).await.task
    }

    /// Extract a task relative to `now`, reporting which tier produced it.
    pub async fn extract_at(&self, text: &str, now: DateTime<Local>) -> Extraction {
        for resolver in &self.resolvers {
            match resolver.attempt(text, &now).await {
                Ok(task) => {
                    tracing::info!("Task extracted by {} resolver", resolver.name());
                    return Extraction {
                        task,
                        source: ExtractionSource::Resolver(resolver.name()),
                    };
                }
                Err(e) => {
                    tracing::warn!("{} resolver failed, trying next tier: {}", resolver.name(), e);
                }
            }
        }

        tracing::info!("Using local heuristic parser");
        Extraction {
            task: self.fallback.parse(text, &now),
            source: ExtractionSource::Heuristic,
        }
    }
}

/// Resolver backed by a remote inference client.
pub struct RemoteResolver {
    client: Arc<dyn InferenceClient>,
}

impl RemoteResolver {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TaskResolver for RemoteResolver {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn attempt(
        &self,
        text: &str,
        now: &DateTime<Local>,
    ) -> Result<StructuredTask, ExtractionError> {
        let response = self.client.infer(&build_task_prompt(text)).await?;
        let object = extract_json_object(&response).map_err(ExtractionError::MalformedResponse)?;
        validate_task_object(&object, now)
    }
}

/// Prompt asking the model for a single task object.
pub fn build_task_prompt(text: &str) -> String {
    format!(
        r#"Parse this task description and return ONLY valid JSON (no markdown, no extra text):
"{text}"

Return JSON with this exact structure:
{{
  "title": "subject/topic (string)",
  "duration": number in minutes,
  "deadline": "ISO 8601 datetime string",
  "priority": "low|medium|high",
  "description": "optional detailed description"
}}

Rules:
- If no time is mentioned, default to tomorrow at 6 PM
- If no duration is mentioned, default to 60 minutes
- Default priority is "medium"
- Duration must be between 15 and 480 minutes
- Return ONLY the JSON object, nothing else"#
    )
}

/// Turn a model-provided object into a task, repairing every field except
/// the title.
pub fn validate_task_object<Tz: TimeZone>(
    object: &Map<String, Value>,
    now: &DateTime<Tz>,
) -> Result<StructuredTask, ExtractionError> {
    let title = object
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ExtractionError::MalformedResponse("missing title".to_string()))?;

    let duration = object
        .get("duration")
        .and_then(numeric_value)
        .filter(|minutes| *minutes != 0.0)
        .map(|minutes| clamp_duration(minutes.round() as i64))
        .unwrap_or(DEFAULT_DURATION);

    let deadline = object
        .get("deadline")
        .and_then(Value::as_str)
        .and_then(|raw| parse_deadline(raw, &now.timezone()))
        .unwrap_or_else(|| {
            let tomorrow = now.clone() + Duration::hours(24);
            tomorrow.with_timezone(&tomorrow.offset().fix())
        });

    let priority = object
        .get("priority")
        .and_then(Value::as_str)
        .and_then(Priority::from_exact)
        .unwrap_or_default();

    let description = object
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Ok(StructuredTask {
        title: title.to_string(),
        duration,
        deadline,
        priority,
        description,
    })
}

/// Numbers, or strings holding a number.
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a model-provided deadline.
///
/// Offset-qualified timestamps are kept as given. Timestamps without an
/// offset are read as local to `tz`; bare dates get the default deadline
/// hour.
pub fn parse_deadline<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            let local = tz.from_local_datetime(&naive).earliest()?;
            return Some(local.with_timezone(&local.offset().fix()));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| at_deadline_hour(date, tz))
}
