//! Task module - task value types and natural-language extraction.
//!
//! Extraction is a tiered chain: a remote model resolver first, then the
//! deterministic heuristic parser. Every path yields a task satisfying the
//! same invariants:
//! - `title` is non-empty
//! - `15 <= duration <= 480`
//! - `deadline` is an absolute timestamp

pub mod display;
pub mod extractor;
pub mod heuristic;
mod types;

pub use extractor::{
    build_task_prompt, validate_task_object, Extraction, ExtractionError, ExtractionSource,
    RemoteResolver, TaskExtractor, TaskResolver,
};
pub use heuristic::{parse_task, HeuristicParser};
pub use types::{
    at_deadline_hour, clamp_duration, deadline_in_days, NewTask, Priority, StructuredTask, Task,
    TaskPatch, TaskStatus, DEFAULT_DEADLINE_HOUR, DEFAULT_DURATION, MAX_DURATION,
    MAX_TITLE_CHARS, MIN_DURATION,
};
