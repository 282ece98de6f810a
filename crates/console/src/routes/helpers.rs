//! Shared route helpers for page rendering.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Serialize;
use tower_sessions::Session;
use tracing::warn;

use super::LOGIN_PATH;
use crate::api::{ApiCredentials, ApiError, ListItem};
use crate::form::{default_label_key, generate_csrf_token};
use crate::i18n::{Translations, culture_name};
use crate::menu::{Capabilities, MenuGraph};
use crate::middleware::GuardedMenu;
use crate::nav::{ExpandedGroups, OPEN_PARAM, side_menu};
use crate::notify::{self, Notification};
use crate::session::ConsoleSession;
use crate::state::AppState;

/// Everything a page of the authenticated area renders with.
pub struct Page {
    pub session: ConsoleSession,
    pub creds: ApiCredentials,
    pub t: Arc<Translations>,
    pub menu: Arc<MenuGraph>,
    pub cultures: Vec<ListItem>,
    /// Request path, e.g. "/companies".
    pub path: String,
    pub expanded: ExpandedGroups,
}

impl Page {
    /// Capability flags of the menu page at `path`.
    pub fn capabilities(&self, state: &AppState, path: &str) -> Capabilities {
        self.menu
            .capabilities_for(path, state.config().capability_default)
    }

    /// Display name of the active culture.
    pub fn culture_name(&self) -> String {
        culture_name(&self.t, &self.cultures, &self.creds.culture_id)
    }

    /// Queue `notification` and redirect to `to`.
    pub async fn redirect_with(&self, notification: Notification, to: &str) -> Response {
        notify::push(self.session.raw(), notification).await;
        Redirect::to(to).into_response()
    }

    /// Report a failed load and go back to `to`.
    pub async fn load_failed(&self, key: &str, error: &ApiError, to: &str) -> Response {
        warn!(error = %error, path = %self.path, "failed to load page data");
        self.redirect_with(Notification::error(self.t.t(key)), to)
            .await
    }
}

impl FromRequestParts<AppState> for Page {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = ConsoleSession::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let Some(creds) = session.credentials().await else {
            return Err(Redirect::to(LOGIN_PATH).into_response());
        };

        let (t, cultures) = tokio::join!(
            state.translations().catalog(&creds, &creds.culture_id),
            state.api().active_cultures(&creds),
        );
        let cultures = cultures.unwrap_or_else(|e| {
            warn!(error = %e, "failed to load active cultures");
            Vec::new()
        });

        // The guard already fetched the graph for menu-anchored routes
        let menu = match parts.extensions.get::<GuardedMenu>() {
            Some(GuardedMenu(graph)) => graph.clone(),
            None => match state.api().menu(&creds).await {
                Ok(graph) => Arc::new(graph),
                Err(e) => {
                    warn!(error = %e, "failed to load menu");
                    notify::push(session.raw(), Notification::error(t.t("Error_LoadingMenu")))
                        .await;
                    Arc::new(MenuGraph::default())
                }
            },
        };

        let expanded = ExpandedGroups::from_param(query_param(parts, OPEN_PARAM).as_deref());

        Ok(Self {
            session,
            creds,
            t,
            menu,
            cultures,
            path: parts.uri.path().to_string(),
            expanded,
        })
    }
}

/// First value of `name` in the request's query string.
fn query_param(parts: &Parts, name: &str) -> Option<String> {
    let query = parts.uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Entry of the culture switcher.
#[derive(Debug, Serialize)]
pub struct CultureOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

pub fn culture_options(t: &Translations, cultures: &[ListItem], current: &str) -> Vec<CultureOption> {
    cultures
        .iter()
        .map(|c| CultureOption {
            id: c.id.clone(),
            name: culture_name(t, cultures, &c.id),
            selected: c.id == current,
        })
        .collect()
}

/// Context shared by every page: translations, flash notifications, the
/// culture switcher and a fresh CSRF token.
pub async fn inject_common_context(
    session: &Session,
    t: &Translations,
    cultures: &[ListItem],
    current_path: &str,
    context: &mut tera::Context,
) {
    context.insert("t", t.entries());
    context.insert("culture_id", t.culture_id());
    context.insert("cultures", &culture_options(t, cultures, t.culture_id()));
    context.insert("current_path", current_path);
    context.insert("notifications", &notify::take(session).await);
    match generate_csrf_token(session).await {
        Ok(token) => context.insert("csrf_token", &token),
        Err(e) => warn!(error = %e, "failed to generate CSRF token"),
    }
}

/// Render a page of the authenticated area inside the console layout.
pub async fn render_page(
    state: &AppState,
    page: &Page,
    template: &str,
    mut context: tera::Context,
) -> Response {
    inject_common_context(
        page.session.raw(),
        &page.t,
        &page.cultures,
        &page.path,
        &mut context,
    )
    .await;
    context.insert(
        "side_menu",
        &side_menu(&page.menu, &page.t, &page.path, &page.expanded),
    );
    context.insert(
        "idle_timeout_ms",
        &state.config().idle_timeout().num_milliseconds(),
    );
    context.insert("popover", &state.popover_delays());
    render_template(state, template, &context)
}

/// Render `template`, answering with an error page when Tera fails.
pub fn render_template(state: &AppState, template: &str, context: &tera::Context) -> Response {
    match state.theme().render(template, context) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = ?e, template = %template, "failed to render template");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!(
                    r#"<!DOCTYPE html>
<html><head><title>Error</title></head>
<body><h1>Template Error</h1><pre>{}</pre></body></html>"#,
                    html_escape(&e.to_string())
                )),
            )
                .into_response()
        }
    }
}

/// Error notification for a failed upstream write.
///
/// Field messages returned by the API become one line each.
pub fn api_error_notification(t: &Translations, key: &str, error: &ApiError) -> Notification {
    let notification = Notification::error(t.t(key));
    match error {
        ApiError::Validation(fields) => notification.with_lines(fields.iter().flat_map(
            |(field, messages)| {
                let label = t.t(&default_label_key(field));
                messages
                    .iter()
                    .map(move |message| format!("{label}: {}", t.t(message)))
            },
        )),
        _ => notification,
    }
}

/// Local redirect target from a posted value, or `fallback`.
///
/// Only same-origin absolute paths are accepted.
pub fn safe_redirect_target<'a>(target: Option<&'a str>, fallback: &'a str) -> &'a str {
    match target {
        Some(t) if t.starts_with('/') && !t.starts_with("//") && !t.contains('\\') => t,
        _ => fallback,
    }
}

/// HTML-escape a string for safe output.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
