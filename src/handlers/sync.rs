use axum::Json;
use axum::extract::State;
use serde_json::json;

use crate::scheduler::TriggerOutcome;
use crate::state::AppState;

/// Enqueue one reconciliation cycle. Fire-and-forget from the caller's
/// perspective: the reply never waits for the cycle.
pub async fn start_parser(State(state): State<AppState>) -> Json<serde_json::Value> {
    match state.scheduler.trigger_now() {
        TriggerOutcome::Queued => tracing::info!("reconciliation cycle queued"),
        TriggerOutcome::Coalesced => {
            tracing::info!("reconciliation trigger coalesced into pending cycle")
        }
        TriggerOutcome::ShuttingDown => {
            tracing::warn!("reconciliation trigger ignored, scheduler stopped")
        }
    }
    Json(json!({ "status": "ok" }))
}
