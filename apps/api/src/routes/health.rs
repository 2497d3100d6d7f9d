use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version, whether a model is
/// configured, and the brands the rule fallback treats as Non-CV.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "incentive-api",
        "llm_configured": state.llm.is_configured(),
        "model": state.llm.model(),
        "non_cv_brands": state.config.non_cv_brands,
    }))
}
