//! Formatting helpers for durations, clock times and deadlines.

use chrono::{DateTime, NaiveDate, TimeZone};

use super::StructuredTask;

/// Compact duration label: `45m`, `2h`, `1h 30m`.
pub fn duration_display(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{}m", minutes);
    }
    let hours = minutes / 60;
    let mins = minutes % 60;
    if mins == 0 {
        format!("{}h", hours)
    } else {
        format!("{}h {}m", hours, mins)
    }
}

/// Parse `HH:MM` into minutes since midnight.
pub fn clock_minutes(time: &str) -> Option<u32> {
    let (hours, minutes) = time.trim().split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Render `HH:MM` as a 12-hour clock time, e.g. `9:05 AM`.
pub fn format_time(time: &str) -> Option<String> {
    let total = clock_minutes(time)?;
    let (hour, minute) = (total / 60, total % 60);
    let ampm = if hour >= 12 { "PM" } else { "AM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    Some(format!("{}:{:02} {}", display_hour, minute, ampm))
}

/// Whole calendar days from `today` to the deadline's date, in the
/// deadline's own time zone. Negative once the deadline has passed.
pub fn days_until_deadline<Tz: TimeZone>(deadline: &DateTime<Tz>, today: NaiveDate) -> i64 {
    (deadline.date_naive() - today).num_days()
}

/// `due today`, `due tomorrow`, `due in 3 days`, `overdue by 2 days`.
pub fn due_label(days: i64) -> String {
    match days {
        0 => "due today".to_string(),
        1 => "due tomorrow".to_string(),
        -1 => "overdue by 1 day".to_string(),
        d if d < 0 => format!("overdue by {} days", -d),
        d => format!("due in {} days", d),
    }
}

/// One-line description of a task, e.g.
/// `Physics [High] 1h 30m, due tomorrow at 6:00 PM`.
pub fn task_summary(task: &StructuredTask, today: NaiveDate) -> String {
    let clock = task.deadline.format("%H:%M").to_string();
    format!(
        "{} [{}] {}, {} at {}",
        task.title,
        task.priority.label(),
        duration_display(task.duration),
        due_label(days_until_deadline(&task.deadline, today)),
        format_time(&clock).unwrap_or(clock),
    )
}
