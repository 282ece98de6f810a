//! Menu-driven route guard.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, info, warn};

use crate::api::{ApiCredentials, ApiError};
use crate::menu::{GuardDecision, MenuGraph, authorize, requires_menu};
use crate::notify::{self, Notification};
use crate::routes::{LANDING_PATH, LOGIN_PATH};
use crate::session::ConsoleSession;
use crate::state::AppState;

/// Menu graph fetched by the guard, handed on to the page handler.
#[derive(Debug, Clone)]
pub struct GuardedMenu(pub Arc<MenuGraph>);

/// Check the request path against a freshly fetched menu graph.
///
/// Open and unrouted paths pass without a fetch. A failed fetch or a denied
/// path queues a notification and redirects to the landing page; the page
/// itself is never rendered.
pub async fn guard_routes(
    State(state): State<AppState>,
    session: ConsoleSession,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !requires_menu(&path, state.routes()) {
        return next.run(request).await;
    }

    let Some(creds) = session.credentials().await else {
        return Redirect::to(LOGIN_PATH).into_response();
    };

    let graph = match state.api().menu(&creds).await {
        Ok(graph) => graph,
        Err(ApiError::Unauthorized) => {
            info!(path = %path, "token rejected by the identity API");
            return end_session(&state, &session, &creds).await;
        }
        // A 403 leaves the token valid, so the session survives
        Err(e) => {
            warn!(error = %e, path = %path, "failed to load menu");
            let message = translate(&state, &creds, "Error_LoadingMenu").await;
            notify::push(session.raw(), Notification::error(message)).await;
            return Redirect::to(LANDING_PATH).into_response();
        }
    };

    match authorize(&path, state.routes(), &graph, state.config().guard_policy) {
        GuardDecision::Denied(reason) => {
            info!(path = %path, reason = ?reason, "access denied by menu");
            let message = translate(&state, &creds, "Security_AccessDenied").await;
            notify::push(session.raw(), Notification::error(message).with_line(path)).await;
            Redirect::to(LANDING_PATH).into_response()
        }
        decision => {
            if matches!(decision, GuardDecision::AllowedUnlisted(_)) {
                warn!(path = %path, "route missing from menu allowed by policy");
            } else {
                debug!(path = %path, "route authorized by menu");
            }
            request
                .extensions_mut()
                .insert(GuardedMenu(Arc::new(graph)));
            next.run(request).await
        }
    }
}

async fn translate(state: &AppState, creds: &ApiCredentials, key: &str) -> String {
    state
        .translations()
        .catalog(creds, &creds.culture_id)
        .await
        .t(key)
}

/// The upstream no longer accepts the token: drop it and start over.
async fn end_session(state: &AppState, session: &ConsoleSession, creds: &ApiCredentials) -> Response {
    let message = translate(
        state,
        &ApiCredentials::anonymous(&creds.culture_id),
        "Security_SessionExpired",
    )
    .await;
    if let Err(e) = session.clear(true).await {
        warn!(error = %e, "failed to clear rejected session");
    }
    notify::push(session.raw(), Notification::info(message)).await;
    Redirect::to(LOGIN_PATH).into_response()
}
