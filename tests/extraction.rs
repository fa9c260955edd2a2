//! Extraction chain behavior with scripted inference clients.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Timelike};

use study_planner::llm::{GeminiClient, InferenceClient, LlmError};
use study_planner::task::{
    parse_task, ExtractionError, ExtractionSource, Priority, StructuredTask, TaskExtractor,
    TaskResolver, MAX_DURATION, MIN_DURATION,
};

/// Always unreachable.
struct UnavailableClient;

#[async_trait]
impl InferenceClient for UnavailableClient {
    async fn infer(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::network_error("connection refused"))
    }
}

/// Returns a fixed reply and records prompts.
struct CannedClient {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl CannedClient {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl InferenceClient for CannedClient {
    async fn infer(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

fn now() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
}

fn assert_valid(task: &StructuredTask) {
    assert!(!task.title.trim().is_empty(), "empty title for {task:?}");
    assert!((MIN_DURATION..=MAX_DURATION).contains(&task.duration));
}

#[tokio::test]
async fn remote_failure_matches_heuristic_parse() {
    let extractor = TaskExtractor::with_remote(Arc::new(UnavailableClient));
    let text = "Finish urgent report in 2 hours";

    let extraction = extractor.extract_at(text, now()).await;

    assert_eq!(extraction.source, ExtractionSource::Heuristic);
    assert_eq!(extraction.task, parse_task(text, &now()));
    assert_eq!(extraction.task.priority, Priority::High);
    assert_eq!(extraction.task.duration, 120);
    assert_eq!(extraction.task.title, "Finish urgent report in 2 hours");
}

#[tokio::test]
async fn missing_credential_falls_back() {
    let client = GeminiClient::with_endpoint(None, "http://127.0.0.1:9", "gemini-2.0-flash");
    let extractor = TaskExtractor::with_remote(Arc::new(client));

    let extraction = extractor.extract_at("review for 45 min", now()).await;

    assert_eq!(extraction.source, ExtractionSource::Heuristic);
    assert_eq!(extraction.task.duration, 45);
}

#[tokio::test]
async fn prose_without_json_falls_back() {
    let client = CannedClient::new("Sure! Here's your task.");
    let extractor = TaskExtractor::with_remote(client.clone());
    let text = "study for 1.5 hours tomorrow";

    let extraction = extractor.extract_at(text, now()).await;

    assert_eq!(client.calls(), 1);
    assert_eq!(extraction.source, ExtractionSource::Heuristic);
    assert_eq!(extraction.task, parse_task(text, &now()));
    assert_eq!(extraction.task.duration, 90);
}

#[tokio::test]
async fn empty_reply_falls_back() {
    let extractor = TaskExtractor::with_remote(CannedClient::new(""));
    let extraction = extractor.extract_at("work on it", now()).await;
    assert_eq!(extraction.source, ExtractionSource::Heuristic);
    assert_eq!(extraction.task.duration, 60);
}

#[tokio::test]
async fn object_without_title_falls_back() {
    let extractor =
        TaskExtractor::with_remote(CannedClient::new(r#"{"duration": 30, "priority": "low"}"#));
    let extraction = extractor.extract_at("Read notes, quickly", now()).await;
    assert_eq!(extraction.source, ExtractionSource::Heuristic);
    assert_eq!(extraction.task.title, "Read notes");
}

#[tokio::test]
async fn stray_braces_in_prose_fall_back() {
    let reply = r#"{"title": "Essay", "duration": 30} Let me know if you need {more}."#;
    let extractor = TaskExtractor::with_remote(CannedClient::new(reply));
    let extraction = extractor.extract_at("Essay draft", now()).await;
    assert_eq!(extraction.source, ExtractionSource::Heuristic);
}

#[tokio::test]
async fn remote_result_used_when_valid() {
    let reply = r#"Here it is:
```json
{"title": "Organic chemistry", "duration": 75, "deadline": "2024-01-03T09:00:00+00:00", "priority": "high", "description": "Chapter 7"}
```"#;
    let client = CannedClient::new(reply);
    let extractor = TaskExtractor::with_remote(client.clone());

    let extraction = extractor.extract_at("chem stuff", now()).await;

    assert_eq!(extraction.source, ExtractionSource::Resolver("remote"));
    let task = extraction.task;
    assert_eq!(task.title, "Organic chemistry");
    assert_eq!(task.duration, 75);
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.deadline.to_rfc3339(), "2024-01-03T09:00:00+00:00");
    assert_eq!(task.description.as_deref(), Some("Chapter 7"));

    let prompts = client.prompts.lock().unwrap();
    assert!(prompts[0].contains("\"chem stuff\""));
}

#[tokio::test]
async fn remote_durations_clamped() {
    for (raw, expected) in [(1000, 480), (-5, 15)] {
        let reply = format!(r#"{{"title": "Task", "duration": {raw}}}"#);
        let extractor = TaskExtractor::with_remote(CannedClient::new(&reply));
        let extraction = extractor.extract_at("anything", now()).await;
        assert_eq!(extraction.source, ExtractionSource::Resolver("remote"));
        assert_eq!(extraction.task.duration, expected);
    }
}

#[tokio::test]
async fn remote_defaults_fill_missing_fields() {
    let extractor = TaskExtractor::with_remote(CannedClient::new(
        r#"{"title": "Flashcards", "priority": "urgent"}"#,
    ));
    let task = extractor.extract_at("flashcards", now()).await.task;
    assert_eq!(task.duration, 60);
    assert_eq!(task.priority, Priority::Medium);
    assert_eq!(task.deadline, now() + chrono::Duration::hours(24));
    assert!(task.description.is_none());
}

#[tokio::test]
async fn heuristic_relative_dates() {
    let extractor = TaskExtractor::local_only();
    let cases = [
        ("due tomorrow", NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
        ("in 3 days", NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()),
        ("no date here", NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
    ];
    for (text, date) in cases {
        let deadline = extractor.extract_at(text, now()).await.task.deadline;
        assert_eq!(deadline.date_naive(), date, "input: {text}");
        assert_eq!((deadline.hour(), deadline.minute(), deadline.second()), (18, 0, 0));
    }
}

#[tokio::test]
async fn extraction_is_total() {
    let inputs = [
        "",
        "   ",
        "!!!",
        ",,,",
        "urgent whenever",
        "0 min",
        "100000 hours",
        "in 99999999999999999999 days",
        "émoji 🎓 study 2h",
        "{",
        "}{",
    ];
    let unavailable = TaskExtractor::with_remote(Arc::new(UnavailableClient));
    let malformed = TaskExtractor::with_remote(CannedClient::new("{not json}"));

    for text in inputs {
        for extractor in [&unavailable, &malformed] {
            let task = extractor.extract_at(text, now()).await.task;
            assert_valid(&task);
        }
        assert_valid(&TaskExtractor::local_only().extract(text).await);
    }
}

#[tokio::test]
async fn keyword_precedence_through_extractor() {
    let extractor = TaskExtractor::with_remote(Arc::new(UnavailableClient));
    let task = extractor
        .extract_at("urgent, but do it whenever", now())
        .await
        .task;
    assert_eq!(task.priority, Priority::High);
}

/// Resolver that records whether it ran.
struct Recording {
    name: &'static str,
    result: Option<StructuredTask>,
    ran: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl TaskResolver for Recording {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn attempt(
        &self,
        _text: &str,
        _now: &DateTime<Local>,
    ) -> Result<StructuredTask, ExtractionError> {
        self.ran.lock().unwrap().push(self.name);
        self.result
            .clone()
            .ok_or_else(|| ExtractionError::MalformedResponse("declined".to_string()))
    }
}

#[tokio::test]
async fn resolvers_tried_in_order() {
    let ran = Arc::new(Mutex::new(Vec::new()));
    let canned = parse_task("from second tier, 30 min", &now());
    let extractor = TaskExtractor::new(vec![
        Box::new(Recording {
            name: "first",
            result: None,
            ran: ran.clone(),
        }),
        Box::new(Recording {
            name: "second",
            result: Some(canned.clone()),
            ran: ran.clone(),
        }),
        Box::new(Recording {
            name: "third",
            result: Some(parse_task("never", &now())),
            ran: ran.clone(),
        }),
    ]);

    assert_eq!(extractor.resolver_names(), vec!["first", "second", "third"]);

    let extraction = extractor.extract_at("ignored", now()).await;
    assert_eq!(extraction.source, ExtractionSource::Resolver("second"));
    assert_eq!(extraction.task, canned);
    assert_eq!(*ran.lock().unwrap(), vec!["first", "second"]);
}
