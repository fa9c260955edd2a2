//! Rule-based task parser used when the remote model cannot help.
//!
//! Pure and total: the same text and the same `now` always produce the same
//! task, and every input produces one. Nothing here touches the network.
//!
//! Rules, in order of evaluation:
//! - title: first clause before `. , ! ?`, capped at [`MAX_TITLE_CHARS`]
//! - priority: high keywords win over low keywords, otherwise medium
//! - duration: first `<number> <unit>` phrase, hours converted to minutes
//! - deadline: first matching relative phrase, always at 18:00

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Offset, TimeZone};
use regex::Regex;

use super::types::{
    clamp_duration, deadline_in_days, Priority, StructuredTask, DEFAULT_DURATION,
    MAX_TITLE_CHARS,
};

/// Title used when the input has no usable characters at all.
pub const UNTITLED: &str = "Untitled task";

const HIGH_PRIORITY_KEYWORDS: &[&str] = &["urgent", "asap", "critical"];
const LOW_PRIORITY_KEYWORDS: &[&str] = &["low priority", "whenever", "flexible"];

static RE_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]+(?:\.[0-9]+)?)\s*(hour|hr|h|minute|min|m)").expect("duration pattern")
});

static RE_IN_DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)in\s+([0-9]+)\s+day").expect("relative day pattern"));

/// Stateless handle on [`parse_task`], used as the last tier of extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicParser;

impl HeuristicParser {
    pub fn parse<Tz: TimeZone>(&self, text: &str, now: &DateTime<Tz>) -> StructuredTask {
        parse_task(text, now)
    }
}

/// Parse free text into a task relative to `now`.
pub fn parse_task<Tz: TimeZone>(text: &str, now: &DateTime<Tz>) -> StructuredTask {
    let lower = text.to_lowercase();

    StructuredTask {
        title: parse_title(text),
        duration: parse_duration(text),
        deadline: parse_deadline(text, &lower, now),
        priority: parse_priority(&lower),
        description: None,
    }
}

fn parse_title(text: &str) -> String {
    let first_clause = text
        .split(['.', ',', '!', '?'])
        .next()
        .unwrap_or_default()
        .trim();

    let title = if first_clause.is_empty() {
        truncate_chars(text, MAX_TITLE_CHARS).trim()
    } else {
        truncate_chars(first_clause, MAX_TITLE_CHARS).trim_end()
    };

    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title.to_string()
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn parse_priority(lower: &str) -> Priority {
    if HIGH_PRIORITY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Priority::High
    } else if LOW_PRIORITY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Priority::Low
    } else {
        Priority::Medium
    }
}

fn parse_duration(text: &str) -> u32 {
    let Some(caps) = RE_DURATION.captures(text) else {
        return DEFAULT_DURATION;
    };

    let Ok(value) = caps[1].parse::<f64>() else {
        return DEFAULT_DURATION;
    };

    let minutes = if caps[2].to_ascii_lowercase().starts_with('h') {
        value * 60.0
    } else {
        value
    };

    // `as` saturates for values beyond i64.
    clamp_duration(minutes.round() as i64)
}

fn parse_deadline<Tz: TimeZone>(text: &str, lower: &str, now: &DateTime<Tz>) -> DateTime<FixedOffset> {
    let days = if lower.contains("today") {
        0
    } else if lower.contains("tomorrow") {
        1
    } else if lower.contains("next week") {
        7
    } else if lower.contains("next month") {
        30
    } else if lower.contains("in") && lower.contains("day") {
        RE_IN_DAYS
            .captures(text)
            .and_then(|caps| caps[1].parse::<u64>().ok())
            .unwrap_or(1)
    } else {
        1
    };

    deadline_in_days(now, days)
        .or_else(|| deadline_in_days(now, 1))
        .unwrap_or_else(|| now.with_timezone(&now.offset().fix()))
}
