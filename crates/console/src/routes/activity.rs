//! Activity heartbeat posted by the layout script.

use axum::extract::{Form, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::idle::{ActivityKind, IdleTimer, UnknownActivity};
use crate::session::ConsoleSession;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/session/activity", post(record_activity))
}

#[derive(Debug, Deserialize)]
struct ActivityForm {
    kind: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivityResponse {
    kind: ActivityKind,
    remaining_ms: i64,
}

/// Move the idle deadline forward and report the time left.
async fn record_activity(
    State(state): State<AppState>,
    session: ConsoleSession,
    Form(form): Form<ActivityForm>,
) -> AppResult<Json<ActivityResponse>> {
    let kind: ActivityKind = form
        .kind
        .parse()
        .map_err(|e: UnknownActivity| AppError::BadRequest(e.to_string()))?;

    let now = Utc::now();
    let timeout = state.config().idle_timeout();
    let mut timer = match session.last_activity().await {
        Some(at) => IdleTimer::resume(timeout, at),
        None => IdleTimer::start(timeout, now),
    };
    timer.record_activity(kind, now);
    session.set_last_activity(timer.last_activity()).await?;
    debug!(kind = %kind, "activity recorded");

    Ok(Json(ActivityResponse {
        kind,
        remaining_ms: timer.remaining_ms(now),
    }))
}
