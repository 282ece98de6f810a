//! HTTP route handlers.

pub mod activity;
pub mod applications;
pub mod auth;
pub mod companies;
pub mod culture;
pub mod dashboard;
pub mod health;
mod helpers;
mod resource;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Redirect, Response};
use tower_http::services::ServeDir;

use crate::middleware::{enforce_idle, guard_routes, require_session};
use crate::session::ConsoleSession;
use crate::state::AppState;

pub use helpers::{Page, html_escape};

/// Where unauthenticated users are sent.
pub const LOGIN_PATH: &str = "/login";

/// Default landing page of the authenticated area.
pub const LANDING_PATH: &str = "/dashboard";

/// Build the application router.
///
/// Layers on the authenticated routes run outermost first:
/// session check, idle timeout, then the menu guard.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(dashboard::router())
        .merge(companies::router())
        .merge(applications::router())
        .merge(activity::router())
        .route_layer(from_fn_with_state(state.clone(), guard_routes))
        .route_layer(from_fn_with_state(state.clone(), enforce_idle))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let assets = ServeDir::new(&state.config().static_dir);

    Router::new()
        .nest_service("/static", assets)
        .merge(auth::router())
        .merge(culture::router())
        .merge(health::router())
        .merge(protected)
        .fallback(fallback)
        .with_state(state)
}

/// Unknown paths go to the landing page, or to login without a session.
async fn fallback(session: ConsoleSession) -> Response {
    if session.is_authenticated().await {
        Redirect::to(LANDING_PATH).into_response()
    } else {
        Redirect::to(LOGIN_PATH).into_response()
    }
}
