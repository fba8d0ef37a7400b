//! Priority scoring for the "To Do" column.
//!
//! A task's score blends its matrix position with how close its due date is:
//! `importance * 0.6 + urgency * 0.4 + due_date_bonus`. Everything here takes
//! `today` as an argument so ordering is reproducible.

use chrono::NaiveDate;

use crate::models::Task;

const IMPORTANCE_WEIGHT: f64 = 0.6;
const URGENCY_WEIGHT: f64 = 0.4;

/// Extra weight for tasks that are overdue or due soon.
pub fn due_date_bonus(due_date: Option<NaiveDate>, today: NaiveDate) -> f64 {
    let Some(due) = due_date else {
        return 0.0;
    };

    match (due - today).num_days() {
        days if days < 0 => 20.0,
        0..=1 => 15.0,
        2..=3 => 10.0,
        4..=7 => 5.0,
        _ => 0.0,
    }
}

pub fn score(task: &Task, today: NaiveDate) -> f64 {
    f64::from(task.importance) * IMPORTANCE_WEIGHT
        + f64::from(task.urgency) * URGENCY_WEIGHT
        + due_date_bonus(task.due_date, today)
}

/// Sorts by descending score. The sort is stable, so equal scores keep the
/// store's newest-first order.
pub fn sort_by_priority(tasks: &mut [Task], today: NaiveDate) {
    tasks.sort_by(|a, b| score(b, today).total_cmp(&score(a, today)));
}
