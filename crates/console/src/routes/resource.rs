//! Screens shared by the company and application pages.

use axum::response::Response;
use serde::{Deserialize, Serialize};

use super::helpers::{Page, render_page};
use crate::config::Config;
use crate::form::{FormContext, FormSpec, FormValues, ValidationError};
use crate::i18n::Translations;
use crate::nav::ActionView;
use crate::state::AppState;
use crate::theme::ThemeEngine;

/// Query parameters of a list page.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub open: Option<String>,
}

impl ListQuery {
    /// Trimmed search text, None when blank.
    pub fn search_text(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Case-insensitive substring match over any of `fields`.
pub fn matches_search(needle: &str, fields: &[&str]) -> bool {
    let needle = needle.to_lowercase();
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListRow {
    pub id: i64,
    pub cells: Vec<String>,
    pub actions: Vec<ActionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageLink {
    pub number: usize,
    pub href: String,
    pub current: bool,
}

/// Paging state of a list page.
#[derive(Debug, Clone, Serialize)]
pub struct Pager {
    pub page: usize,
    pub page_size: usize,
    pub page_sizes: Vec<usize>,
    pub total: usize,
    pub page_count: usize,
    /// 1-based index of the first row shown, 0 when empty.
    pub first_row: usize,
    pub last_row: usize,
    pub links: Vec<PageLink>,
    pub prev: Option<String>,
    pub next: Option<String>,
}

/// Cut one page out of `rows`.
///
/// Unknown page sizes fall back to the configured default; pages past the
/// end clamp to the last page.
pub fn paginate<T>(rows: Vec<T>, query: &ListQuery, config: &Config, base: &str) -> (Vec<T>, Pager) {
    let page_size = query
        .page_size
        .filter(|size| config.grid_page_sizes.contains(size))
        .unwrap_or(config.grid_default_page_size);
    let total = rows.len();
    let page_count = total.div_ceil(page_size).max(1);
    let page = query.page.unwrap_or(1).clamp(1, page_count);

    let start = (page - 1) * page_size;
    let shown: Vec<T> = rows.into_iter().skip(start).take(page_size).collect();
    let first_row = if shown.is_empty() { 0 } else { start + 1 };
    let last_row = start + shown.len();

    let href = |number: usize| page_href(base, query, number, page_size);
    let pager = Pager {
        page,
        page_size,
        page_sizes: config.grid_page_sizes.clone(),
        total,
        page_count,
        first_row,
        last_row,
        links: (1..=page_count)
            .map(|number| PageLink {
                number,
                href: href(number),
                current: number == page,
            })
            .collect(),
        prev: (page > 1).then(|| href(page - 1)),
        next: (page < page_count).then(|| href(page + 1)),
    };
    (shown, pager)
}

fn page_href(base: &str, query: &ListQuery, page: usize, page_size: usize) -> String {
    let mut params = url::form_urlencoded::Serializer::new(String::new());
    if let Some(search) = query.search_text() {
        params.append_pair("search", search);
    }
    params.append_pair("page", &page.to_string());
    params.append_pair("page_size", &page_size.to_string());
    if let Some(open) = query.open.as_deref().filter(|o| !o.is_empty()) {
        params.append_pair("open", open);
    }
    format!("{base}?{}", params.finish())
}

/// Label/value pair of a read-only view page.
#[derive(Debug, Clone, Serialize)]
pub struct DetailRow {
    pub label: String,
    pub value: String,
}

impl DetailRow {
    pub fn new(label: String, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// Template for `page` of `resource`, preferring a resource-specific one.
pub fn resource_template(state: &AppState, resource: &str, page: &str) -> String {
    let suggestions = ThemeEngine::resource_suggestions(resource, page);
    let suggestions: Vec<&str> = suggestions.iter().map(String::as_str).collect();
    state
        .theme()
        .resolve_template(&suggestions)
        .unwrap_or_else(|| format!("resource/{page}.html"))
}

/// Yes/No text for a flag.
pub fn yes_no(t: &Translations, flag: bool) -> String {
    t.t(if flag { "Label_Yes" } else { "Label_No" })
}

/// Translation of an optional key, empty when absent.
pub fn t_opt(t: &Translations, key: Option<&str>) -> String {
    key.filter(|k| !k.is_empty())
        .map(|k| t.t(k))
        .unwrap_or_default()
}

/// A list page.
pub struct ListScreen {
    pub resource: &'static str,
    pub title: String,
    pub columns: Vec<Column>,
    pub rows: Vec<ListRow>,
    pub pager: Pager,
    pub search: String,
    pub create: Option<ActionView>,
}

pub async fn render_list(state: &AppState, page: &Page, screen: ListScreen) -> Response {
    let mut context = tera::Context::new();
    context.insert("resource", screen.resource);
    context.insert("title", &screen.title);
    context.insert("columns", &screen.columns);
    context.insert("rows", &screen.rows);
    context.insert("pager", &screen.pager);
    context.insert("search", &screen.search);
    context.insert("create", &screen.create);
    context.insert("open", &page.expanded.to_param());
    let template = resource_template(state, screen.resource, "list");
    render_page(state, page, &template, context).await
}

/// A create or edit form.
pub struct FormScreen<'a> {
    pub resource: &'static str,
    pub title: String,
    /// URL the form posts to.
    pub action: String,
    pub cancel_href: String,
    pub spec: &'a FormSpec,
    pub values: &'a FormValues,
    pub errors: &'a [ValidationError],
}

pub async fn render_form(state: &AppState, page: &Page, screen: FormScreen<'_>) -> Response {
    let culture_name = page.culture_name();
    let ctx = FormContext::new(&page.t, &culture_name);
    let fields = ctx.field_views(screen.spec, screen.values, screen.errors);

    let mut context = tera::Context::new();
    context.insert("resource", screen.resource);
    context.insert("title", &screen.title);
    context.insert("form_id", &screen.spec.form_id);
    context.insert("form_action", &screen.action);
    context.insert("cancel_href", &screen.cancel_href);
    context.insert("fields", &fields);
    let template = resource_template(state, screen.resource, "form");
    render_page(state, page, &template, context).await
}

/// A read-only record page.
pub struct ViewScreen {
    pub resource: &'static str,
    pub title: String,
    pub details: Vec<DetailRow>,
    pub actions: Vec<ActionView>,
    pub back_href: String,
}

pub async fn render_view(state: &AppState, page: &Page, screen: ViewScreen) -> Response {
    let mut context = tera::Context::new();
    context.insert("resource", screen.resource);
    context.insert("title", &screen.title);
    context.insert("details", &screen.details);
    context.insert("actions", &screen.actions);
    context.insert("back_href", &screen.back_href);
    let template = resource_template(state, screen.resource, "view");
    render_page(state, page, &template, context).await
}

/// Delete confirmation naming the record.
pub struct ConfirmDeleteScreen {
    pub resource: &'static str,
    pub title: String,
    pub message: String,
    pub action: String,
    pub cancel_href: String,
}

pub async fn render_confirm_delete(
    state: &AppState,
    page: &Page,
    screen: ConfirmDeleteScreen,
) -> Response {
    let mut context = tera::Context::new();
    context.insert("resource", screen.resource);
    context.insert("title", &screen.title);
    context.insert("message", &screen.message);
    context.insert("form_action", &screen.action);
    context.insert("cancel_href", &screen.cancel_href);
    let template = resource_template(state, screen.resource, "confirm_delete");
    render_page(state, page, &template, context).await
}
