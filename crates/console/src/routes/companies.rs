//! Company pages: list, create, view, edit and delete.

use std::collections::HashMap;

use axum::Router;
use axum::extract::{Form, Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use serde_json::json;
use tracing::{info, warn};

use super::helpers::{Page, api_error_notification};
use super::resource::{
    Column, ConfirmDeleteScreen, DetailRow, FormScreen, ListQuery, ListRow, ListScreen,
    ViewScreen, matches_search, paginate, render_confirm_delete, render_form, render_list,
    render_view, t_opt, yes_no,
};
use crate::api::{Company, ListItem};
use crate::form::{
    CSRF_FIELD, FieldSpec, FormContext, FormSpec, FormValues, SelectOption, SubmitOutcome,
    ValidationError, submit, verify_csrf_token,
};
use crate::menu::Capability;
use crate::nav::{action, row_actions};
use crate::notify::{self, Notification};
use crate::state::AppState;

const RESOURCE: &str = "companies";
const LIST_PATH: &str = "/companies";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/companies", get(list))
        .route("/companies/new", get(new_form).post(create))
        .route("/companies/{id}/view", get(view))
        .route("/companies/{id}/edit", get(edit_form).post(update))
        .route("/companies/{id}/delete", get(confirm_delete).post(delete))
}

/// Fields of the company form.
fn company_form(countries: &[ListItem], cultures: &[ListItem]) -> FormSpec {
    FormSpec::new("company")
        .field(FieldSpec::text("nameTranslationValue").required())
        .field(FieldSpec::textarea("descriptionTranslationValue").required())
        .field(FieldSpec::text("subdomain").required())
        .field(FieldSpec::email("email").required())
        .field(
            FieldSpec::select("countryFk", SelectOption::from_list(countries))
                .required()
                .label("Label_Country"),
        )
        .field(
            FieldSpec::select("defaultCultureFk", SelectOption::from_list(cultures))
                .required()
                .label("Label_DefaultCulture"),
        )
        .field(FieldSpec::checkbox("isActive"))
}

/// Translated name of a company, or its subdomain when it has none.
fn display_name(page: &Page, company: &Company) -> String {
    match company.name_translation_key.as_deref() {
        Some(key) if !key.is_empty() => page.t.t(key),
        _ => company
            .name_translation_value
            .clone()
            .or_else(|| company.subdomain.clone())
            .unwrap_or_default(),
    }
}

async fn list(
    State(state): State<AppState>,
    page: Page,
    Query(query): Query<ListQuery>,
) -> Response {
    let t = &page.t;
    let caps = page.capabilities(&state, LIST_PATH);

    let companies = match state.api().companies(&page.creds).await {
        Ok(companies) => companies,
        Err(e) => {
            warn!(error = %e, "failed to load companies");
            notify::push(
                page.session.raw(),
                Notification::error(t.t("Error_LoadingCompanies")),
            )
            .await;
            Vec::new()
        }
    };

    let mut rows: Vec<(i64, Vec<String>)> = companies
        .iter()
        .filter_map(|company| {
            let id = company.id?;
            let cells = vec![
                display_name(&page, company),
                t_opt(t, company.description_translation_key.as_deref()),
                company.subdomain.clone().unwrap_or_default(),
                company.email.clone().unwrap_or_default(),
                yes_no(t, company.is_active),
            ];
            Some((id, cells))
        })
        .filter(|(_, cells)| match query.search_text() {
            Some(needle) => matches_search(
                needle,
                &[
                    cells[0].as_str(),
                    cells[1].as_str(),
                    cells[2].as_str(),
                    cells[3].as_str(),
                ],
            ),
            None => true,
        })
        .collect();
    rows.sort_by_key(|(_, cells)| cells[0].to_lowercase());

    let (shown, pager) = paginate(rows, &query, state.config(), LIST_PATH);
    let rows = shown
        .into_iter()
        .map(|(id, cells)| ListRow {
            id,
            cells,
            actions: row_actions(caps, LIST_PATH, id, t),
        })
        .collect();

    let columns = [
        "Label_Name",
        "Label_Description",
        "Label_Subdomain",
        "Label_Email",
        "Label_IsActive",
    ]
    .iter()
    .map(|key| Column { label: t.t(key) })
    .collect();

    render_list(
        &state,
        &page,
        ListScreen {
            resource: RESOURCE,
            title: t.t("Page_Companies"),
            columns,
            rows,
            pager,
            search: query.search_text().unwrap_or_default().to_string(),
            create: Some(action(
                caps,
                Capability::Create,
                format!("{LIST_PATH}/new"),
                t,
            )),
        },
    )
    .await
}

async fn show_form(
    state: &AppState,
    page: &Page,
    title_key: &str,
    action: String,
    spec: &FormSpec,
    values: &FormValues,
    errors: &[ValidationError],
) -> Response {
    render_form(
        state,
        page,
        FormScreen {
            resource: RESOURCE,
            title: page.t.t(title_key),
            action,
            cancel_href: LIST_PATH.to_string(),
            spec,
            values,
            errors,
        },
    )
    .await
}

async fn new_form(State(state): State<AppState>, page: Page) -> Response {
    let countries = match state.api().countries(&page.creds).await {
        Ok(countries) => countries,
        Err(e) => return page.load_failed("Error_LoadingData", &e, LIST_PATH).await,
    };
    let spec = company_form(&countries, &page.cultures);
    let mut values = FormValues::default();
    values.set("isActive", "true");
    values.set("defaultCultureFk", page.creds.culture_id.clone());

    let action = format!("{LIST_PATH}/new");
    show_form(&state, &page, "Page_NewCompany", action, &spec, &values, &[]).await
}

async fn create(
    State(state): State<AppState>,
    page: Page,
    Form(raw): Form<HashMap<String, String>>,
) -> Response {
    let countries = match state.api().countries(&page.creds).await {
        Ok(countries) => countries,
        Err(e) => return page.load_failed("Error_LoadingData", &e, LIST_PATH).await,
    };
    let spec = company_form(&countries, &page.cultures);
    let values = FormValues::new(raw);
    let culture_name = page.culture_name();
    let ctx = FormContext::new(&page.t, &culture_name);

    let api = state.api();
    let creds = &page.creds;
    let outcome = submit(
        page.session.raw(),
        &spec,
        &values,
        json!({}),
        &ctx,
        |company: Company| async move { api.create_company(creds, &company).await },
    )
    .await;

    let action = format!("{LIST_PATH}/new");
    match outcome {
        SubmitOutcome::Submitted(Ok(created)) => {
            info!(id = ?created.id, "company created");
            page.redirect_with(
                Notification::success(page.t.t("Success_CompanySaved")),
                LIST_PATH,
            )
            .await
        }
        SubmitOutcome::Submitted(Err(e)) => {
            warn!(error = %e, "failed to create company");
            notify::push(
                page.session.raw(),
                api_error_notification(&page.t, "Error_SavingCompany", &e),
            )
            .await;
            show_form(&state, &page, "Page_NewCompany", action, &spec, &values, &[]).await
        }
        SubmitOutcome::Rejected { errors, .. } => {
            show_form(&state, &page, "Page_NewCompany", action, &spec, &values, &errors).await
        }
    }
}

async fn view(State(state): State<AppState>, page: Page, Path(id): Path<i64>) -> Response {
    let company = match state.api().company(&page.creds, id).await {
        Ok(company) => company,
        Err(e) => return page.load_failed("Error_LoadingCompany", &e, LIST_PATH).await,
    };
    let t = &page.t;
    let caps = page.capabilities(&state, LIST_PATH);
    let culture_name = page.culture_name();

    let details = vec![
        DetailRow::new(
            t.t_with("Label_NameTranslationValue", &[("cultureName", &culture_name)]),
            display_name(&page, &company),
        ),
        DetailRow::new(
            t.t("Label_Description"),
            t_opt(t, company.description_translation_key.as_deref()),
        ),
        DetailRow::new(t.t("Label_Subdomain"), company.subdomain.clone().unwrap_or_default()),
        DetailRow::new(t.t("Label_Email"), company.email.clone().unwrap_or_default()),
        DetailRow::new(
            t.t("Label_Country"),
            t_opt(t, company.country_name_translation_key.as_deref()),
        ),
        DetailRow::new(
            t.t("Label_DefaultCulture"),
            t_opt(t, company.default_culture_name_translation_key.as_deref()),
        ),
        DetailRow::new(t.t("Label_IsActive"), yes_no(t, company.is_active)),
        DetailRow::new(t.t("Label_IsSystemCompany"), yes_no(t, company.is_system_company)),
    ];

    let actions = row_actions(caps, LIST_PATH, id, t)
        .into_iter()
        .filter(|a| a.capability != Capability::View)
        .collect();

    render_view(
        &state,
        &page,
        ViewScreen {
            resource: RESOURCE,
            title: t.t("Page_ViewCompany"),
            details,
            actions,
            back_href: LIST_PATH.to_string(),
        },
    )
    .await
}

async fn edit_form(State(state): State<AppState>, page: Page, Path(id): Path<i64>) -> Response {
    let api = state.api();
    let (company, countries) =
        match tokio::try_join!(api.company(&page.creds, id), api.countries(&page.creds)) {
            Ok(loaded) => loaded,
            Err(e) => return page.load_failed("Error_LoadingCompany", &e, LIST_PATH).await,
        };
    let spec = company_form(&countries, &page.cultures);
    let values = FormValues::from_record(&company);

    let action = format!("{LIST_PATH}/{id}/edit");
    show_form(&state, &page, "Page_EditCompany", action, &spec, &values, &[]).await
}

async fn update(
    State(state): State<AppState>,
    page: Page,
    Path(id): Path<i64>,
    Form(raw): Form<HashMap<String, String>>,
) -> Response {
    let api = state.api();
    let (company, countries) =
        match tokio::try_join!(api.company(&page.creds, id), api.countries(&page.creds)) {
            Ok(loaded) => loaded,
            Err(e) => return page.load_failed("Error_LoadingCompany", &e, LIST_PATH).await,
        };
    let spec = company_form(&countries, &page.cultures);
    let values = FormValues::new(raw);
    let culture_name = page.culture_name();
    let ctx = FormContext::new(&page.t, &culture_name);
    let base = serde_json::to_value(&company).unwrap_or_default();

    let creds = &page.creds;
    let outcome = submit(
        page.session.raw(),
        &spec,
        &values,
        base,
        &ctx,
        |company: Company| async move { api.update_company(creds, &company).await },
    )
    .await;

    let action = format!("{LIST_PATH}/{id}/edit");
    match outcome {
        SubmitOutcome::Submitted(Ok(_)) => {
            info!(id, "company updated");
            page.redirect_with(
                Notification::success(page.t.t("Success_CompanySaved")),
                LIST_PATH,
            )
            .await
        }
        SubmitOutcome::Submitted(Err(e)) => {
            warn!(error = %e, id, "failed to update company");
            notify::push(
                page.session.raw(),
                api_error_notification(&page.t, "Error_SavingCompany", &e),
            )
            .await;
            show_form(&state, &page, "Page_EditCompany", action, &spec, &values, &[]).await
        }
        SubmitOutcome::Rejected { errors, .. } => {
            show_form(&state, &page, "Page_EditCompany", action, &spec, &values, &errors).await
        }
    }
}

async fn confirm_delete(
    State(state): State<AppState>,
    page: Page,
    Path(id): Path<i64>,
) -> Response {
    let company = match state.api().company(&page.creds, id).await {
        Ok(company) => company,
        Err(e) => return page.load_failed("Error_LoadingCompany", &e, LIST_PATH).await,
    };
    let name = display_name(&page, &company);

    render_confirm_delete(
        &state,
        &page,
        ConfirmDeleteScreen {
            resource: RESOURCE,
            title: page.t.t("Page_DeleteCompany"),
            message: page.t.t_with("Message_ConfirmDelete", &[("name", &name)]),
            action: format!("{LIST_PATH}/{id}/delete"),
            cancel_href: LIST_PATH.to_string(),
        },
    )
    .await
}

async fn delete(
    State(state): State<AppState>,
    page: Page,
    Path(id): Path<i64>,
    Form(raw): Form<HashMap<String, String>>,
) -> Response {
    let token = raw.get(CSRF_FIELD).map(String::as_str).unwrap_or_default();
    if !verify_csrf_token(page.session.raw(), token).await.unwrap_or(false) {
        warn!(id, "company delete with invalid CSRF token");
        return page
            .redirect_with(Notification::error(page.t.t("Error_FormExpired")), LIST_PATH)
            .await;
    }

    match state.api().delete_company(&page.creds, id).await {
        Ok(()) => {
            info!(id, "company deleted");
            page.redirect_with(
                Notification::success(page.t.t("Success_CompanyDeleted")),
                LIST_PATH,
            )
            .await
        }
        Err(e) => {
            warn!(error = %e, id, "failed to delete company");
            page.redirect_with(
                api_error_notification(&page.t, "Error_DeletingCompany", &e),
                LIST_PATH,
            )
            .await
        }
    }
}
