//! Landing page: one tile per menu item the user can reach.

use axum::Router;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;

use super::helpers::{Page, render_page};
use crate::nav::dashboard_tiles;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

async fn dashboard(State(state): State<AppState>, page: Page) -> Response {
    let mut context = tera::Context::new();
    context.insert("title", &page.t.t("Page_Dashboard"));
    context.insert("tile_groups", &dashboard_tiles(&page.menu, &page.t));
    render_page(&state, &page, "dashboard.html", context).await
}
