pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::allocation::handlers as allocation;
use crate::commentary::handlers as commentary;
use crate::interpretation::handlers as interpretation;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Allocation API
        .route("/api/v1/allocation", get(allocation::handle_get_allocation))
        .route("/api/v1/allocation/reset", post(allocation::handle_reset))
        .route(
            "/api/v1/allocation/adjustments",
            post(allocation::handle_apply_adjustments),
        )
        .route("/api/v1/allocation/total", put(allocation::handle_set_total))
        .route(
            "/api/v1/allocation/indicators",
            post(allocation::handle_add_indicator),
        )
        .route(
            "/api/v1/allocation/indicators/:id",
            patch(allocation::handle_set_indicator).delete(allocation::handle_remove_indicator),
        )
        // Instruction API
        .route(
            "/api/v1/allocation/instructions",
            post(interpretation::handle_instruction),
        )
        .route(
            "/api/v1/allocation/instructions/preview",
            post(interpretation::handle_instruction_preview),
        )
        // Commentary API
        .route("/api/v1/commentary", post(commentary::handle_commentary))
        .with_state(state)
}
