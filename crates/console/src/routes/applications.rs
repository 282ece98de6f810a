//! Application pages: list, view, edit and delete.

use std::collections::HashMap;

use axum::Router;
use axum::extract::{Form, Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use tracing::{info, warn};

use super::helpers::{Page, api_error_notification};
use super::resource::{
    Column, ConfirmDeleteScreen, DetailRow, FormScreen, ListQuery, ListRow, ListScreen,
    ViewScreen, matches_search, paginate, render_confirm_delete, render_form, render_list,
    render_view, t_opt, yes_no,
};
use crate::api::{Application, ListItem};
use crate::form::{
    CSRF_FIELD, FieldSpec, FormContext, FormSpec, FormValues, SelectOption, SubmitOutcome,
    ValidationError, submit, verify_csrf_token,
};
use crate::i18n::Translations;
use crate::menu::{Capabilities, Capability};
use crate::nav::{ActionView, action, row_actions};
use crate::notify::{self, Notification};
use crate::state::AppState;

const RESOURCE: &str = "applications";
const LIST_PATH: &str = "/applications";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/applications", get(list))
        .route("/applications/{id}/view", get(view))
        .route("/applications/{id}/edit", get(edit_form).post(update))
        .route("/applications/{id}/delete", get(confirm_delete).post(delete))
}

/// Fields of the application form.
///
/// The client id is issued by the API and only shown.
fn application_form(owners: &[ListItem], license_types: &[ListItem]) -> FormSpec {
    FormSpec::new("application")
        .field(FieldSpec::text("nameTranslationValue").required())
        .field(FieldSpec::textarea("descriptionTranslationValue").required())
        .field(FieldSpec::text("applicationClient").readonly())
        .field(
            FieldSpec::numeric_select("ownerFk", SelectOption::from_list(owners))
                .required()
                .label("Label_Owner"),
        )
        .field(
            FieldSpec::numeric_select(
                "applicationLicenseTypeFk",
                SelectOption::from_list(license_types),
            )
            .required()
            .label("Label_LicenseType"),
        )
        .field(FieldSpec::checkbox("isActive"))
}

fn display_name(page: &Page, application: &Application) -> String {
    match application.name_translation_key.as_deref() {
        Some(key) if !key.is_empty() => page.t.t(key),
        _ => application
            .name_translation_value
            .clone()
            .or_else(|| application.application_client.clone())
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

    let applications = match state.api().applications(&page.creds).await {
        Ok(applications) => applications,
        Err(e) => {
            warn!(error = %e, "failed to load applications");
            notify::push(
                page.session.raw(),
                Notification::error(t.t("Error_LoadingApplications")),
            )
            .await;
            Vec::new()
        }
    };

    let mut rows: Vec<(i64, Vec<String>)> = applications
        .iter()
        .filter_map(|application| {
            let id = application.id?;
            let cells = vec![
                display_name(&page, application),
                t_opt(t, application.description_translation_key.as_deref()),
                t_opt(
                    t,
                    application
                        .application_owner_name_translation_key
                        .as_deref(),
                ),
                t_opt(
                    t,
                    application
                        .application_license_type_name_translation_key
                        .as_deref(),
                ),
                yes_no(t, application.is_active),
            ];
            Some((id, cells))
        })
        .filter(|(_, cells)| match query.search_text() {
            Some(needle) => matches_search(
                needle,
                &[cells[0].as_str(), cells[1].as_str(), cells[2].as_str()],
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
        "Label_Owner",
        "Label_LicenseType",
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
            title: t.t("Page_Applications"),
            columns,
            rows,
            pager,
            search: query.search_text().unwrap_or_default().to_string(),
            create: Some(create_action(caps, t)),
        },
    )
    .await
}

/// The list's create button.
///
/// Applications are registered upstream, so the button always renders
/// inert whatever the menu grants.
fn create_action(caps: Capabilities, t: &Translations) -> ActionView {
    let caps = Capabilities {
        can_create: false,
        ..caps
    };
    action(caps, Capability::Create, format!("{LIST_PATH}/new"), t)
}

async fn view(State(state): State<AppState>, page: Page, Path(id): Path<i64>) -> Response {
    let application = match state.api().application(&page.creds, id).await {
        Ok(application) => application,
        Err(e) => return page.load_failed("Error_LoadingApplication", &e, LIST_PATH).await,
    };
    let t = &page.t;
    let caps = page.capabilities(&state, LIST_PATH);
    let culture_name = page.culture_name();
    let date = |at: Option<chrono::DateTime<chrono::Utc>>| {
        at.map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default()
    };

    let details = vec![
        DetailRow::new(
            t.t_with("Label_NameTranslationValue", &[("cultureName", &culture_name)]),
            display_name(&page, &application),
        ),
        DetailRow::new(
            t.t("Label_Description"),
            t_opt(t, application.description_translation_key.as_deref()),
        ),
        DetailRow::new(
            t.t("Label_ApplicationClient"),
            application.application_client.clone().unwrap_or_default(),
        ),
        DetailRow::new(
            t.t("Label_Owner"),
            t_opt(t, application.application_owner_name_translation_key.as_deref()),
        ),
        DetailRow::new(
            t.t("Label_LicenseType"),
            t_opt(
                t,
                application
                    .application_license_type_name_translation_key
                    .as_deref(),
            ),
        ),
        DetailRow::new(t.t("Label_CreationDate"), date(application.creation_date)),
        DetailRow::new(t.t("Label_LastUpdateDate"), date(application.last_update_date)),
        DetailRow::new(t.t("Label_IsActive"), yes_no(t, application.is_active)),
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
            title: t.t("Page_ViewApplication"),
            details,
            actions,
            back_href: LIST_PATH.to_string(),
        },
    )
    .await
}

async fn show_form(
    state: &AppState,
    page: &Page,
    id: i64,
    spec: &FormSpec,
    values: &FormValues,
    errors: &[ValidationError],
) -> Response {
    render_form(
        state,
        page,
        FormScreen {
            resource: RESOURCE,
            title: page.t.t("Page_EditApplication"),
            action: format!("{LIST_PATH}/{id}/edit"),
            cancel_href: LIST_PATH.to_string(),
            spec,
            values,
            errors,
        },
    )
    .await
}

/// The record with its owner and license type dropdowns, loaded together.
async fn load_for_edit(
    state: &AppState,
    page: &Page,
    id: i64,
) -> Result<(Application, FormSpec), Response> {
    let api = state.api();
    let creds = &page.creds;
    match tokio::try_join!(
        api.application(creds, id),
        api.companies_dropdown(creds),
        api.license_types(creds),
    ) {
        Ok((application, owners, license_types)) => {
            Ok((application, application_form(&owners, &license_types)))
        }
        Err(e) => Err(page
            .load_failed("Error_LoadingApplication", &e, LIST_PATH)
            .await),
    }
}

async fn edit_form(State(state): State<AppState>, page: Page, Path(id): Path<i64>) -> Response {
    let (application, spec) = match load_for_edit(&state, &page, id).await {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };
    let values = FormValues::from_record(&application);
    show_form(&state, &page, id, &spec, &values, &[]).await
}

async fn update(
    State(state): State<AppState>,
    page: Page,
    Path(id): Path<i64>,
    Form(raw): Form<HashMap<String, String>>,
) -> Response {
    let (application, spec) = match load_for_edit(&state, &page, id).await {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };
    let values = FormValues::new(raw);
    let culture_name = page.culture_name();
    let ctx = FormContext::new(&page.t, &culture_name);
    let base = serde_json::to_value(&application).unwrap_or_default();

    let api = state.api();
    let creds = &page.creds;
    let outcome = submit(
        page.session.raw(),
        &spec,
        &values,
        base,
        &ctx,
        |application: Application| async move {
            api.update_application(creds, &application).await
        },
    )
    .await;

    match outcome {
        SubmitOutcome::Submitted(Ok(_)) => {
            info!(id, "application updated");
            page.redirect_with(
                Notification::success(page.t.t("Success_ApplicationSaved")),
                LIST_PATH,
            )
            .await
        }
        SubmitOutcome::Submitted(Err(e)) => {
            warn!(error = %e, id, "failed to update application");
            notify::push(
                page.session.raw(),
                api_error_notification(&page.t, "Error_SavingApplication", &e),
            )
            .await;
            show_form(&state, &page, id, &spec, &values, &[]).await
        }
        SubmitOutcome::Rejected { errors, .. } => {
            show_form(&state, &page, id, &spec, &values, &errors).await
        }
    }
}

async fn confirm_delete(
    State(state): State<AppState>,
    page: Page,
    Path(id): Path<i64>,
) -> Response {
    let application = match state.api().application(&page.creds, id).await {
        Ok(application) => application,
        Err(e) => return page.load_failed("Error_LoadingApplication", &e, LIST_PATH).await,
    };
    let name = display_name(&page, &application);

    render_confirm_delete(
        &state,
        &page,
        ConfirmDeleteScreen {
            resource: RESOURCE,
            title: page.t.t("Page_DeleteApplication"),
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
        warn!(id, "application delete with invalid CSRF token");
        return page
            .redirect_with(Notification::error(page.t.t("Error_FormExpired")), LIST_PATH)
            .await;
    }

    match state.api().delete_application(&page.creds, id).await {
        Ok(()) => {
            info!(id, "application deleted");
            page.redirect_with(
                Notification::success(page.t.t("Success_ApplicationDeleted")),
                LIST_PATH,
            )
            .await
        }
        Err(e) => {
            warn!(error = %e, id, "failed to delete application");
            page.redirect_with(
                api_error_notification(&page.t, "Error_DeletingApplication", &e),
                LIST_PATH,
            )
            .await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn create_button_stays_inert_with_every_capability() {
        let caps = Capabilities {
            can_view: true,
            can_edit: true,
            can_delete: true,
            can_create: true,
        };
        let create = create_action(caps, &Translations::default());
        assert_eq!(create.capability, Capability::Create);
        assert!(!create.enabled);
        assert!(create.href.is_none());
    }

    #[test]
    fn owner_and_license_are_sent_as_numbers() {
        let owners = vec![ListItem {
            id: "12".into(),
            name_translation_key: Some("Company_Acme".into()),
        }];
        let spec = application_form(&owners, &[]);
        let loaded = Application {
            id: Some(3),
            application_client: Some("client-3".into()),
            ..Application::default()
        };
        let mut values = FormValues::default();
        values.set("ownerFk", "12");
        values.set("applicationLicenseTypeFk", "2");
        values.set("applicationClient", "tampered");

        let merged: Application =
            serde_json::from_value(values.apply_to(&spec, serde_json::to_value(&loaded).unwrap()))
                .unwrap();
        assert_eq!(merged.owner_fk, Some(12));
        assert_eq!(merged.application_license_type_fk, Some(2));
        assert_eq!(merged.application_client.as_deref(), Some("client-3"));
        assert!(!merged.is_active);
    }
}
