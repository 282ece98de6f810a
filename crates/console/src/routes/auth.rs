//! Login and logout.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Form, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tower_sessions::session;
use tracing::{error, info, warn};

use super::helpers::{inject_common_context, render_template};
use super::{LANDING_PATH, LOGIN_PATH};
use crate::api::{
    ApiCredentials, ApiError, GRANT_CLIENT_CREDENTIALS, ListItem, TokenRequest, TokenResponse,
};
use crate::form::{
    FieldSpec, FormContext, FormSpec, FormValues, SelectOption, SubmitOutcome, ValidationError,
    submit,
};
use crate::i18n::{Translations, culture_name};
use crate::middleware::log_off_idle;
use crate::notify::{self, Notification};
use crate::session::ConsoleSession;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", get(logout))
}

fn login_form(companies: &[ListItem], cultures: &[ListItem]) -> FormSpec {
    FormSpec::new("login")
        .field(
            FieldSpec::select("companyId", SelectOption::from_list(companies))
                .required()
                .label("Label_Company"),
        )
        .field(FieldSpec::text("userName").required().min_length(3))
        .field(FieldSpec::password("password").required().min_length(3))
        .field(
            FieldSpec::select("cultureId", SelectOption::from_list(cultures))
                .label("Label_Culture"),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginForm {
    company_id: String,
    user_name: String,
    password: String,
    #[serde(default)]
    culture_id: Option<String>,
}

/// Translations and dropdowns of the login page, loaded in parallel.
struct LoginData {
    t: Arc<Translations>,
    companies: Vec<ListItem>,
    cultures: Vec<ListItem>,
}

async fn login_data(state: &AppState, culture: &str) -> LoginData {
    let creds = ApiCredentials::anonymous(culture);
    let api = state.api();
    let (t, companies, cultures) = tokio::join!(
        state.translations().catalog(&creds, culture),
        api.companies_with_guid(&creds),
        api.active_cultures(&creds),
    );
    LoginData {
        t,
        companies: companies.unwrap_or_else(|e| {
            warn!(error = %e, "failed to load login companies");
            Vec::new()
        }),
        cultures: cultures.unwrap_or_else(|e| {
            warn!(error = %e, "failed to load login cultures");
            Vec::new()
        }),
    }
}

async fn render_login(
    state: &AppState,
    session: &ConsoleSession,
    data: &LoginData,
    values: &FormValues,
    errors: &[ValidationError],
) -> Response {
    let t = &data.t;
    let spec = login_form(&data.companies, &data.cultures);
    let culture = culture_name(t, &data.cultures, t.culture_id());
    let ctx = FormContext::new(t, &culture);

    // Never echo the password back
    let mut values = values.clone();
    values.set("password", "");

    let mut context = tera::Context::new();
    context.insert("title", &t.t("Page_Login"));
    context.insert("fields", &ctx.field_views(&spec, &values, errors));
    inject_common_context(session.raw(), t, &data.cultures, LOGIN_PATH, &mut context).await;
    render_template(state, "login.html", &context)
}

async fn login_page(State(state): State<AppState>, session: ConsoleSession) -> Response {
    if session.is_authenticated().await {
        return Redirect::to(LANDING_PATH).into_response();
    }

    let culture = session.culture().await;
    let data = login_data(&state, &culture).await;
    let mut values = FormValues::default();
    values.set("cultureId", culture);
    render_login(&state, &session, &data, &values, &[]).await
}

async fn login_submit(
    State(state): State<AppState>,
    session: ConsoleSession,
    Form(raw): Form<HashMap<String, String>>,
) -> Response {
    if session.is_authenticated().await {
        return Redirect::to(LANDING_PATH).into_response();
    }

    let culture = session.culture().await;
    let data = login_data(&state, &culture).await;
    let spec = login_form(&data.companies, &data.cultures);
    let values = FormValues::new(raw);
    let culture_label = culture_name(&data.t, &data.cultures, &culture);
    let ctx = FormContext::new(&data.t, &culture_label);

    let config = state.config();
    let api = state.api();
    let creds = ApiCredentials::anonymous(&culture);
    let creds = &creds;
    let outcome = submit(
        session.raw(),
        &spec,
        &values,
        json!({}),
        &ctx,
        |form: LoginForm| async move {
            let request = TokenRequest {
                grant_type: GRANT_CLIENT_CREDENTIALS.to_string(),
                application_id: config.application_id.clone(),
                application_secret: config.application_secret.clone(),
                company_id: form.company_id,
                user_id: form.user_name.clone(),
                user_secret: form.password,
            };
            let issued = api.issue_token(creds, &request).await;
            (form.user_name, form.culture_id, issued)
        },
    )
    .await;

    let failure_key = match outcome {
        SubmitOutcome::Rejected { errors, .. } => {
            return render_login(&state, &session, &data, &values, &errors).await;
        }
        SubmitOutcome::Submitted((
            user,
            chosen,
            Ok(TokenResponse {
                access_token: Some(token),
                ..
            }),
        )) if !token.is_empty() => {
            let culture = chosen
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(culture);
            match start_session(&session, &token, &culture).await {
                Ok(()) => {
                    info!(user = %user, "login succeeded");
                    let t = state
                        .translations()
                        .catalog(&ApiCredentials::bearer(&token, &culture), &culture)
                        .await;
                    notify::push(
                        session.raw(),
                        Notification::success(t.t("Security_LoginSuccess")),
                    )
                    .await;
                    return Redirect::to(LANDING_PATH).into_response();
                }
                Err(e) => {
                    error!(error = %e, user = %user, "failed to store login session");
                    "Error_LoginService"
                }
            }
        }
        SubmitOutcome::Submitted((user, _, Ok(_))) => {
            warn!(user = %user, "token response carried no token");
            "Security_LoginFailed"
        }
        SubmitOutcome::Submitted((user, _, Err(ApiError::Unauthorized | ApiError::Validation(_)))) => {
            info!(user = %user, "login rejected");
            "Security_InvalidCredentials"
        }
        SubmitOutcome::Submitted((user, _, Err(e))) => {
            warn!(error = %e, user = %user, "token request failed");
            "Error_LoginService"
        }
    };

    notify::push(session.raw(), Notification::error(data.t.t(failure_key))).await;
    render_login(&state, &session, &data, &values, &[]).await
}

/// Store the token and culture of a fresh login and start the idle timer.
async fn start_session(
    session: &ConsoleSession,
    token: &str,
    culture: &str,
) -> Result<(), session::Error> {
    session.set_token(token).await?;
    session.set_culture(culture).await?;
    session.set_last_activity(Utc::now()).await
}

#[derive(Debug, Deserialize)]
struct LogoutQuery {
    reason: Option<String>,
}

async fn logout(
    State(state): State<AppState>,
    session: ConsoleSession,
    Query(query): Query<LogoutQuery>,
) -> Response {
    if query.reason.as_deref() == Some("idle") {
        return log_off_idle(&state, &session).await;
    }

    let culture = session.culture().await;
    let t = state
        .translations()
        .catalog(&ApiCredentials::anonymous(&culture), &culture)
        .await;
    if let Err(e) = session.clear(true).await {
        warn!(error = %e, "failed to clear session on logout");
    }
    info!("logged out");
    notify::push(session.raw(), Notification::info(t.t("Security_LogoutSuccess"))).await;
    Redirect::to(LOGIN_PATH).into_response()
}
