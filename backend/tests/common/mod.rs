#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use prioritymatrix::models::{Task, TaskStatus};

pub fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A todo created on 2024-01-01, `id` hours after midnight.
pub fn task(id: &str, importance: i32, urgency: i32) -> Task {
    let hour = id.parse::<u32>().unwrap_or(0) % 24;
    Task {
        id: id.to_string(),
        title: format!("Task {}", id),
        due_date: None,
        importance,
        urgency,
        status: TaskStatus::Todo,
        completed_at: None,
        created_at: ts(2024, 1, 1, hour),
    }
}

pub fn with_status(mut task: Task, status: TaskStatus, completed_at: Option<DateTime<Utc>>) -> Task {
    task.status = status;
    task.completed_at = completed_at;
    task
}

pub fn ids(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.id.as_str()).collect()
}
