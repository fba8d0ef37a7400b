mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{ids, task, ts, with_status};
use prioritymatrix::error::{AppError, MESSAGE_RATE_LIMIT, MESSAGE_TASK_LIMIT};
use prioritymatrix::models::{NewTaskRequest, Quadrant, TaskStatus};
use prioritymatrix::services::board_service::DELETED_NOTICE;
use prioritymatrix::services::{BoardSession, MoveOutcome};
use prioritymatrix::store::InMemoryTaskStore;
use prioritymatrix::store::memory::FailOn;

async fn session_with(store: Arc<InMemoryTaskStore>) -> BoardSession {
    let session = BoardSession::new(store);
    session.refresh().await.expect("initial fetch");
    session
}

fn remote_error(message: &str) -> AppError {
    AppError::Remote {
        status: 400,
        message: message.to_string(),
    }
}

#[tokio::test]
async fn test_refresh_loads_store_order() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![task("1", 80, 70), task("2", 60, 30)]));
    let session = session_with(store.clone()).await;

    assert_eq!(ids(&session.tasks()), vec!["2", "1"]);
    let view = session.view(ts(2024, 1, 10, 9));
    assert_eq!(ids(&view.columns.todo), vec!["1", "2"]);
    assert_eq!(view.error, None);
}

#[tokio::test]
async fn test_failed_refresh_keeps_last_good_list() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![task("1", 80, 70)]));
    let session = session_with(store.clone()).await;

    store.fail_next(FailOn::Fetch, remote_error("network down"));
    let result = session.refresh().await;

    assert!(result.is_err());
    assert_eq!(ids(&session.tasks()), vec!["1"]);
    assert_eq!(session.error().as_deref(), Some("network down"));
}

#[tokio::test]
async fn test_failed_first_refresh_leaves_board_empty() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![task("1", 80, 70)]));
    store.fail_next(FailOn::Fetch, remote_error("network down"));
    let session = BoardSession::new(store);

    assert!(session.refresh().await.is_err());
    assert!(session.tasks().is_empty());
}

#[tokio::test]
async fn test_move_to_completed_persists() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![task("1", 80, 70), task("2", 60, 30)]));
    let session = session_with(store.clone()).await;
    let now = ts(2024, 1, 10, 12);

    let outcome = session.move_task("1", TaskStatus::Completed, now).await.unwrap();

    assert_eq!(outcome, MoveOutcome::Persisted);
    let updates = store.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].id, "1");
    assert_eq!(updates[0].status, TaskStatus::Completed);
    assert_eq!(updates[0].completed_at, Some(now));

    let view = session.view(now);
    assert_eq!(ids(&view.columns.todo), vec!["2"]);
    assert_eq!(ids(&view.columns.completed), vec!["1"]);
    assert_eq!(view.columns.completed[0].completed_at, Some(now));
    assert_eq!(store.tasks(), session.tasks());
}

#[tokio::test]
async fn test_noop_moves_send_nothing() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![task("1", 80, 70)]));
    let session = session_with(store.clone()).await;
    let now = ts(2024, 1, 10, 12);

    assert_eq!(session.move_task("1", TaskStatus::Todo, now).await.unwrap(), MoveOutcome::Unchanged);
    assert_eq!(session.move_task("404", TaskStatus::Completed, now).await.unwrap(), MoveOutcome::Unchanged);
    assert!(store.updates().is_empty());
    assert_eq!(session.error(), None);
}

#[tokio::test]
async fn test_failed_move_reconciles_from_store() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![task("1", 80, 70), task("2", 60, 30)]));
    let session = session_with(store.clone()).await;
    let fetches_before = store.fetch_count();

    store.fail_next(FailOn::Update, remote_error("permission denied"));
    let outcome = session
        .move_task("1", TaskStatus::Scheduled, ts(2024, 1, 10, 12))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        MoveOutcome::Reconciled {
            message: "permission denied".to_string()
        }
    );
    assert_eq!(store.fetch_count(), fetches_before + 1);
    assert!(session.tasks().iter().all(|t| t.status == TaskStatus::Todo));
    assert_eq!(session.error().as_deref(), Some("permission denied"));
}

#[tokio::test]
async fn test_failed_move_with_failed_refetch_keeps_update_error() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![task("1", 80, 70), task("2", 60, 30)]));
    let session = session_with(store.clone()).await;
    let now = ts(2024, 1, 10, 12);

    store.fail_next(FailOn::Update, remote_error("permission denied"));
    store.fail_next(FailOn::Fetch, remote_error("network down"));
    let outcome = session.move_task("1", TaskStatus::Completed, now).await.unwrap();

    assert_eq!(
        outcome,
        MoveOutcome::Reconciled {
            message: "permission denied".to_string()
        }
    );
    assert_eq!(session.error().as_deref(), Some("permission denied"));
    // Nothing to reconcile against, so the optimistic record stays cached.
    let moved = session.tasks().into_iter().find(|t| t.id == "1").unwrap();
    assert_eq!(moved.status, TaskStatus::Completed);
    assert_eq!(moved.completed_at, Some(now));
    assert!(store.tasks().iter().all(|t| t.status == TaskStatus::Todo));

    session.refresh().await.unwrap();
    assert!(session.tasks().iter().all(|t| t.status == TaskStatus::Todo));
    assert_eq!(session.error(), None);
}

#[tokio::test]
async fn test_second_move_on_same_task_rejected_while_in_flight() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![task("1", 80, 70)]));
    let gate = store.gate_updates();
    let session = Arc::new(session_with(store.clone()).await);
    let now = ts(2024, 1, 10, 12);

    let first = {
        let session = session.clone();
        tokio::spawn(async move { session.move_task("1", TaskStatus::Completed, now).await })
    };
    // The optimistic move shows up before the store answers.
    while session.tasks()[0].status != TaskStatus::Completed {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(!first.is_finished());

    let second = session.move_task("1", TaskStatus::Scheduled, now).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));
    assert!(matches!(session.delete_task("1").await, Err(AppError::Conflict(_))));

    gate.add_permits(1);
    assert_eq!(first.await.unwrap().unwrap(), MoveOutcome::Persisted);
    assert_eq!(store.updates().len(), 1);
    assert!(store.deletes().is_empty());

    gate.add_permits(1);
    let third = session.move_task("1", TaskStatus::Scheduled, now).await.unwrap();
    assert_eq!(third, MoveOutcome::Persisted);
}

#[tokio::test]
async fn test_delete_waits_for_confirmation() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![task("1", 80, 70), task("2", 60, 30)]));
    let session = session_with(store.clone()).await;

    session.delete_task("1").await.unwrap();

    assert_eq!(ids(&session.tasks()), vec!["2"]);
    assert_eq!(session.info().as_deref(), Some(DELETED_NOTICE));
    assert_eq!(store.deletes(), vec!["1".to_string()]);
}

#[tokio::test]
async fn test_failed_delete_leaves_state_untouched() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![task("1", 80, 70), task("2", 60, 30)]));
    let session = session_with(store.clone()).await;
    let before = session.tasks();

    store.fail_next(FailOn::Delete, remote_error("delete refused"));
    let result = session.delete_task("1").await;

    assert!(result.is_err());
    assert_eq!(session.tasks(), before);
    assert_eq!(session.info(), None);
    assert_eq!(session.error().as_deref(), Some("delete refused"));
}

#[tokio::test]
async fn test_next_action_clears_info_notice() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![task("1", 80, 70), task("2", 60, 30)]));
    let session = session_with(store.clone()).await;

    session.delete_task("1").await.unwrap();
    session.move_task("2", TaskStatus::Scheduled, ts(2024, 1, 10, 12)).await.unwrap();

    assert_eq!(session.info(), None);
}

#[tokio::test]
async fn test_add_task_inserts_and_refreshes() {
    let store = Arc::new(InMemoryTaskStore::new());
    let session = session_with(store.clone()).await;

    session
        .add_task(NewTaskRequest {
            title: "  Write report  ".to_string(),
            due_date: None,
            importance: 90,
            urgency: 20,
        })
        .await
        .unwrap();

    let tasks = session.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Write report");
    assert_eq!(tasks[0].status, TaskStatus::Todo);
    assert_eq!(tasks[0].completed_at, None);
}

#[tokio::test]
async fn test_add_task_rejects_invalid_input() {
    let store = Arc::new(InMemoryTaskStore::new());
    let session = session_with(store.clone()).await;

    let blank = session
        .add_task(NewTaskRequest {
            title: "   ".to_string(),
            due_date: None,
            importance: 10,
            urgency: 10,
        })
        .await;
    let out_of_range = session
        .add_task(NewTaskRequest {
            title: "Too important".to_string(),
            due_date: None,
            importance: 101,
            urgency: 10,
        })
        .await;

    assert!(matches!(blank, Err(AppError::BadRequest(_))));
    assert!(matches!(out_of_range, Err(AppError::BadRequest(_))));
    assert!(store.tasks().is_empty());
}

#[tokio::test]
async fn test_add_task_surfaces_store_limits() {
    let store = Arc::new(InMemoryTaskStore::new());
    let session = session_with(store.clone()).await;
    let req = || NewTaskRequest {
        title: "One more".to_string(),
        due_date: None,
        importance: 10,
        urgency: 10,
    };

    store.fail_next(FailOn::Insert, AppError::from_remote(400, "PMTRL: slow down"));
    assert!(matches!(session.add_task(req()).await, Err(AppError::RateLimited)));
    assert_eq!(session.error().as_deref(), Some(MESSAGE_RATE_LIMIT));

    store.fail_next(FailOn::Insert, AppError::from_remote(400, "TASK_CAP_REACHED"));
    assert!(matches!(session.add_task(req()).await, Err(AppError::TaskLimitReached)));
    assert_eq!(session.error().as_deref(), Some(MESSAGE_TASK_LIMIT));
}

#[tokio::test]
async fn test_matrix_lists_open_tasks() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![
        task("1", 80, 70),
        with_status(task("2", 20, 90), TaskStatus::Scheduled, None),
        with_status(task("3", 90, 90), TaskStatus::Completed, Some(ts(2024, 1, 2, 0))),
    ]));
    let session = session_with(store).await;

    let points = session.matrix(ts(2024, 1, 10, 9));

    let found: Vec<_> = points.iter().map(|p| (p.id.as_str(), p.quadrant)).collect();
    assert_eq!(found, vec![("2", Quadrant::Delegate), ("1", Quadrant::DoFirst)]);
    assert!((points[1].score - 76.0).abs() < 1e-9);
}
