//! Idle timeout enforcement.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tracing::{info, warn};

use crate::api::ApiCredentials;
use crate::idle::{ActivityKind, IdleState, IdleTimer};
use crate::notify::{self, Notification};
use crate::routes::LOGIN_PATH;
use crate::session::ConsoleSession;
use crate::state::AppState;

/// Log the session off once the idle deadline has passed.
///
/// Every request that gets through counts as navigation activity and moves
/// the deadline forward.
pub async fn enforce_idle(
    State(state): State<AppState>,
    session: ConsoleSession,
    request: Request<Body>,
    next: Next,
) -> Response {
    let now = Utc::now();
    let timeout = state.config().idle_timeout();
    let mut timer = match session.last_activity().await {
        Some(at) => IdleTimer::resume(timeout, at),
        None => IdleTimer::start(timeout, now),
    };

    if timer.poll(now) == IdleState::Expired {
        info!(
            last_activity = %timer.last_activity(),
            path = %request.uri().path(),
            "session idle timeout"
        );
        return log_off_idle(&state, &session).await;
    }

    timer.record_activity(ActivityKind::Navigation, now);
    if let Err(e) = session.set_last_activity(timer.last_activity()).await {
        warn!(error = %e, "failed to record session activity");
    }

    next.run(request).await
}

/// Clear the session, keeping its culture, and send the user to login.
pub(crate) async fn log_off_idle(state: &AppState, session: &ConsoleSession) -> Response {
    let culture = session.culture().await;
    let t = state
        .translations()
        .catalog(&ApiCredentials::anonymous(&culture), &culture)
        .await;

    if let Err(e) = session.clear(true).await {
        warn!(error = %e, "failed to clear idle session");
    }
    notify::push(
        session.raw(),
        Notification::info(t.t("Security_AutoLogout")).sticky(),
    )
    .await;

    Redirect::to(LOGIN_PATH).into_response()
}
