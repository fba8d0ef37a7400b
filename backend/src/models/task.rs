use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Board column a task lives in. The column id used by drag-and-drop is the
/// status itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Todo,
    Scheduled,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::Scheduled, TaskStatus::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Scheduled => "scheduled",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "scheduled" => Ok(TaskStatus::Scheduled),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(AppError::BadRequest(format!("Unknown task status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub importance: i32,
    pub urgency: i32,
    pub status: TaskStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn quadrant(&self) -> Quadrant {
        Quadrant::classify(self.importance, self.urgency)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTaskRequest {
    pub title: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub importance: i32,
    pub urgency: i32,
}

impl NewTaskRequest {
    /// Trims the title and checks the matrix coordinates.
    pub fn validate(self) -> Result<Self, AppError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::BadRequest("Title must not be empty".to_string()));
        }
        for (name, value) in [("importance", self.importance), ("urgency", self.urgency)] {
            if !(0..=100).contains(&value) {
                return Err(AppError::BadRequest(format!(
                    "{} must be between 0 and 100, got {}",
                    name, value
                )));
            }
        }
        Ok(Self { title, ..self })
    }
}

/// Eisenhower matrix quadrant. Urgency runs along x, importance along y,
/// both split at the midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    DoFirst,
    Schedule,
    Delegate,
    Eliminate,
}

impl Quadrant {
    const MIDPOINT: i32 = 50;

    pub fn classify(importance: i32, urgency: i32) -> Self {
        match (importance >= Self::MIDPOINT, urgency >= Self::MIDPOINT) {
            (true, true) => Quadrant::DoFirst,
            (true, false) => Quadrant::Schedule,
            (false, true) => Quadrant::Delegate,
            (false, false) => Quadrant::Eliminate,
        }
    }
}
