use std::sync::Arc;

use crate::services::BoardSession;

#[derive(Clone)]
pub struct AppState {
    pub board: Arc<BoardSession>,
}
