use axum::{extract::State, Json};
use serde::Deserialize;

use crate::commentary::{generate_commentary, Commentary};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CommentaryRequest {
    #[serde(default)]
    pub focus: Option<String>,
}

/// POST /api/v1/commentary
///
/// Never errors: falls back to canned commentary when the model is unavailable.
pub async fn handle_commentary(
    State(state): State<AppState>,
    Json(request): Json<CommentaryRequest>,
) -> Json<Commentary> {
    let tree = state.allocation.snapshot().await;
    Json(generate_commentary(&state.llm, &tree, request.focus.as_deref()).await)
}
