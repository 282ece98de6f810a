//! Culture switcher.

use axum::Router;
use axum::extract::{Form, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::post;
use serde::Deserialize;
use tracing::{info, warn};

use super::helpers::safe_redirect_target;
use super::{LANDING_PATH, LOGIN_PATH};
use crate::error::AppError;
use crate::form::verify_csrf_token;
use crate::session::ConsoleSession;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/culture", post(switch_culture))
}

#[derive(Debug, Deserialize)]
struct CultureForm {
    culture_id: String,
    #[serde(default)]
    csrf_token: String,
    redirect_to: Option<String>,
}

/// Culture ids look like "en-US" or "zh-Hant-TW".
fn is_culture_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 16 && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Store the chosen culture and go back where the form was posted from.
///
/// The culture's catalog is dropped from the cache so the next page loads
/// it fresh.
async fn switch_culture(
    State(state): State<AppState>,
    session: ConsoleSession,
    Form(form): Form<CultureForm>,
) -> Response {
    let fallback = if session.is_authenticated().await {
        LANDING_PATH
    } else {
        LOGIN_PATH
    };
    let target = safe_redirect_target(form.redirect_to.as_deref(), fallback).to_string();

    match verify_csrf_token(session.raw(), &form.csrf_token).await {
        Ok(true) => {}
        Ok(false) => {
            warn!("culture change with invalid CSRF token");
            return Redirect::to(&target).into_response();
        }
        Err(e) => return AppError::Internal(e).into_response(),
    }

    let culture_id = form.culture_id.trim();
    if !is_culture_id(culture_id) {
        warn!(culture = %culture_id, "rejected culture id");
        return Redirect::to(&target).into_response();
    }

    if let Err(e) = session.set_culture(culture_id).await {
        return AppError::Session(e).into_response();
    }
    state.translations().invalidate(culture_id).await;
    info!(culture = %culture_id, "culture changed");

    Redirect::to(&target).into_response()
}
