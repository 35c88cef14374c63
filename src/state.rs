use crate::{config::Config, services::CommentService};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub comments: CommentService,
    pub config: Config,
}

impl FromRef<AppState> for CommentService {
    fn from_ref(state: &AppState) -> Self {
        state.comments.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
