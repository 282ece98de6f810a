//! Session check for the authenticated area.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::routes::LOGIN_PATH;
use crate::session::ConsoleSession;
use crate::state::AppState;

/// Redirect requests without a stored token to the login page.
pub async fn require_session(
    State(_state): State<AppState>,
    session: ConsoleSession,
    request: Request<Body>,
    next: Next,
) -> Response {
    if session.is_authenticated().await {
        return next.run(request).await;
    }

    debug!(path = %request.uri().path(), "no session token, redirecting to login");
    Redirect::to(LOGIN_PATH).into_response()
}
