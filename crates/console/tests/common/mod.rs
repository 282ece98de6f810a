#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Tests drive the real router, middleware, templates and in-memory session
//! store. Only the upstream identity API is replaced, by [`FakeIdentityApi`],
//! whose replies each test can shape.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use axum::routing::post;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_sessions::Session;

use identity_console::api::{
    ApiCredentials, ApiError, Application, Company, CultureTranslation, IdentityApi, ListItem,
    TokenRequest, TokenResponse,
};
use identity_console::menu::{CapabilityDefault, GuardPolicy, MenuGraph, MenuGroup, MenuItem};
use identity_console::session::{SESSION_LAST_ACTIVITY, with_session_layer};
use identity_console::theme::ThemeEngine;
use identity_console::{AppState, Config, routes};

/// Password the fake accepts for every user.
pub const GOOD_PASSWORD: &str = "correct-horse";

/// Guid of the only company offered on the login page.
pub const COMPANY_GUID: &str = "3f2a9c1e-acme";

/// Test-only route that moves the idle timer past its deadline.
pub const BACKDATE_PATH: &str = "/test/backdate-activity";

/// How the fake answers menu requests.
#[derive(Debug, Clone)]
pub enum MenuReply {
    Graph(MenuGraph),
    Unauthorized,
    Forbidden,
    Unavailable,
}

/// In-process identity API with canned data.
pub struct FakeIdentityApi {
    pub menu: Mutex<MenuReply>,
    pub translations: HashMap<String, Vec<(&'static str, &'static str)>>,
    pub companies: Mutex<Vec<Company>>,
    pub applications: Mutex<Vec<Application>>,
    pub reachable: bool,
    /// Every token request received, newest last.
    pub token_requests: Mutex<Vec<TokenRequest>>,
}

impl Default for FakeIdentityApi {
    fn default() -> Self {
        let mut translations = HashMap::new();
        translations.insert(
            "en-US".to_string(),
            vec![
                ("App_Title", "Identity Console"),
                ("Culture_en-US", "English"),
                ("Culture_es-MX", "Spanish"),
                ("Menu_Admin", "Administration"),
                ("Menu_Companies", "Companies"),
                ("Menu_Applications", "Applications"),
                ("Security_LoginSuccess", "Welcome back"),
                ("Security_LogoutSuccess", "You have been logged out"),
                ("Security_InvalidCredentials", "Wrong user name or password"),
                ("Security_AccessDenied", "You cannot open that page"),
                ("Security_AutoLogout", "Logged out after inactivity"),
                ("Security_SessionExpired", "Your session has expired"),
                ("Error_LoadingMenu", "The menu could not be loaded"),
                ("Success_CompanySaved", "Company saved"),
                ("Validation_Required_Fields", "Please fix the highlighted fields"),
                ("Validation_Input_Required", "This field is required"),
                ("Validation_DropDown_Required", "Pick a value"),
            ],
        );
        translations.insert(
            "es-MX".to_string(),
            vec![
                ("App_Title", "Consola de Identidad"),
                ("Culture_en-US", "Ingles"),
                ("Culture_es-MX", "Espanol"),
                ("Security_LoginSuccess", "Bienvenido"),
                ("Security_AutoLogout", "Sesion cerrada por inactividad"),
            ],
        );

        Self {
            menu: Mutex::new(MenuReply::Graph(admin_menu(ALL, ALL))),
            translations,
            companies: Mutex::new(vec![Company {
                id: Some(1),
                name_translation_value: Some("Acme Corporation".into()),
                subdomain: Some("acme".into()),
                email: Some("admin@acme.test".into()),
                country_fk: Some("US".into()),
                default_culture_fk: Some("en-US".into()),
                is_active: true,
                ..Company::default()
            }]),
            applications: Mutex::new(vec![Application {
                id: Some(5),
                name_translation_value: Some("Payroll".into()),
                application_client: Some("payroll-client".into()),
                owner_fk: Some(1),
                application_license_type_fk: Some(1),
                is_active: true,
                ..Application::default()
            }]),
            reachable: true,
            token_requests: Mutex::new(Vec::new()),
        }
    }
}

/// View, edit, delete, create.
pub type Flags = [bool; 4];
pub const ALL: Flags = [true; 4];
pub const VIEW_ONLY: Flags = [true, false, false, false];

pub fn menu_item(id: &str, title: &str, path: &str, flags: Flags) -> MenuItem {
    MenuItem {
        id: id.into(),
        title: title.into(),
        description: String::new(),
        icon: "businessIcon".into(),
        path: path.into(),
        is_visible: true,
        can_view: flags[0],
        can_edit: flags[1],
        can_delete: flags[2],
        can_create: flags[3],
    }
}

/// One "Administration" group with the given items.
pub fn menu_with(items: Vec<MenuItem>) -> MenuGraph {
    MenuGraph::new(vec![MenuGroup {
        id: "admin".into(),
        title: "Menu_Admin".into(),
        description: String::new(),
        icon: "settingsIcon".into(),
        items,
        is_visible: true,
    }])
}

/// Companies and applications with the given flags.
pub fn admin_menu(companies: Flags, applications: Flags) -> MenuGraph {
    menu_with(vec![
        menu_item("companies", "Menu_Companies", "companies", companies),
        menu_item("applications", "Menu_Applications", "/applications", applications),
    ])
}

fn list(items: &[(&str, &str)]) -> Vec<ListItem> {
    items
        .iter()
        .map(|(id, key)| ListItem {
            id: (*id).to_string(),
            name_translation_key: Some((*key).to_string()),
        })
        .collect()
}

#[async_trait]
impl IdentityApi for FakeIdentityApi {
    async fn issue_token(
        &self,
        _creds: &ApiCredentials,
        request: &TokenRequest,
    ) -> Result<TokenResponse, ApiError> {
        self.token_requests.lock().unwrap().push(request.clone());
        if request.user_secret != GOOD_PASSWORD || request.company_id != COMPANY_GUID {
            return Err(ApiError::Unauthorized);
        }
        Ok(TokenResponse {
            access_token: Some(format!("token-for-{}", request.user_id)),
            token_type: Some("Bearer".into()),
            expires_in: Some(3600),
        })
    }

    async fn menu(&self, _creds: &ApiCredentials) -> Result<MenuGraph, ApiError> {
        match self.menu.lock().unwrap().clone() {
            MenuReply::Graph(graph) => Ok(graph),
            MenuReply::Unauthorized => Err(ApiError::Unauthorized),
            MenuReply::Forbidden => Err(ApiError::Forbidden),
            MenuReply::Unavailable => Err(ApiError::Status {
                status: 503,
                body: "maintenance".into(),
            }),
        }
    }

    async fn translations(
        &self,
        _creds: &ApiCredentials,
        culture_id: &str,
    ) -> Result<Vec<CultureTranslation>, ApiError> {
        Ok(self
            .translations
            .get(culture_id)
            .into_iter()
            .flatten()
            .map(|(key, value)| CultureTranslation {
                translation_key: Some((*key).to_string()),
                translation_value: Some((*value).to_string()),
            })
            .collect())
    }

    async fn active_cultures(&self, _creds: &ApiCredentials) -> Result<Vec<ListItem>, ApiError> {
        Ok(list(&[("en-US", "Culture_en-US"), ("es-MX", "Culture_es-MX")]))
    }

    async fn countries(&self, _creds: &ApiCredentials) -> Result<Vec<ListItem>, ApiError> {
        Ok(list(&[("US", "Country_US"), ("MX", "Country_MX")]))
    }

    async fn companies_with_guid(
        &self,
        _creds: &ApiCredentials,
    ) -> Result<Vec<ListItem>, ApiError> {
        Ok(list(&[(COMPANY_GUID, "Company_Acme")]))
    }

    async fn companies_dropdown(&self, _creds: &ApiCredentials) -> Result<Vec<ListItem>, ApiError> {
        Ok(list(&[("1", "Company_Acme")]))
    }

    async fn license_types(&self, _creds: &ApiCredentials) -> Result<Vec<ListItem>, ApiError> {
        Ok(list(&[("1", "License_Standard")]))
    }

    async fn companies(&self, _creds: &ApiCredentials) -> Result<Vec<Company>, ApiError> {
        Ok(self.companies.lock().unwrap().clone())
    }

    async fn company(&self, _creds: &ApiCredentials, id: i64) -> Result<Company, ApiError> {
        self.companies
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == Some(id))
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn create_company(
        &self,
        _creds: &ApiCredentials,
        company: &Company,
    ) -> Result<Company, ApiError> {
        let mut companies = self.companies.lock().unwrap();
        if companies.iter().any(|c| c.subdomain == company.subdomain) {
            let mut errors = std::collections::BTreeMap::new();
            errors.insert("subdomain".to_string(), vec!["Subdomain already taken".to_string()]);
            return Err(ApiError::Validation(errors));
        }
        let created = Company {
            id: Some(companies.len() as i64 + 1),
            ..company.clone()
        };
        companies.push(created.clone());
        Ok(created)
    }

    async fn update_company(
        &self,
        _creds: &ApiCredentials,
        company: &Company,
    ) -> Result<Company, ApiError> {
        let mut companies = self.companies.lock().unwrap();
        let slot = companies
            .iter_mut()
            .find(|c| c.id == company.id)
            .ok_or(ApiError::NotFound)?;
        *slot = company.clone();
        Ok(company.clone())
    }

    async fn delete_company(&self, _creds: &ApiCredentials, id: i64) -> Result<(), ApiError> {
        self.companies.lock().unwrap().retain(|c| c.id != Some(id));
        Ok(())
    }

    async fn applications(&self, _creds: &ApiCredentials) -> Result<Vec<Application>, ApiError> {
        Ok(self.applications.lock().unwrap().clone())
    }

    async fn application(
        &self,
        _creds: &ApiCredentials,
        id: i64,
    ) -> Result<Application, ApiError> {
        self.applications
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == Some(id))
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn update_application(
        &self,
        _creds: &ApiCredentials,
        application: &Application,
    ) -> Result<Application, ApiError> {
        let mut applications = self.applications.lock().unwrap();
        let slot = applications
            .iter_mut()
            .find(|a| a.id == application.id)
            .ok_or(ApiError::NotFound)?;
        *slot = application.clone();
        Ok(application.clone())
    }

    async fn delete_application(&self, _creds: &ApiCredentials, id: i64) -> Result<(), ApiError> {
        self.applications
            .lock()
            .unwrap()
            .retain(|a| a.id != Some(id));
        Ok(())
    }

    async fn ping(&self) -> bool {
        self.reachable
    }
}

/// Project root, two levels above this crate.
fn project_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    Path::new(&manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // project root
        .unwrap_or(Path::new("."))
        .to_path_buf()
}

/// Configuration pointing at the project's templates, sessions in memory.
pub fn test_config() -> Config {
    let root = project_root();
    Config {
        port: 0,
        api_base_url: url::Url::parse("http://identity.test/").unwrap(),
        api_timeout_secs: 5,
        token_storage_key: "access_token".into(),
        culture_storage_key: "culture_id".into(),
        application_id: "console".into(),
        application_secret: "console-secret".into(),
        default_culture: "en-US".into(),
        auto_logoff_minutes: 15,
        grid_page_sizes: vec![10, 25, 50],
        grid_default_page_size: 10,
        templates_dir: root.join("templates"),
        static_dir: root.join("static"),
        redis_url: None,
        cookie_same_site: "strict".into(),
        cookie_secure: false,
        guard_policy: GuardPolicy::DenyUnlisted,
        capability_default: CapabilityDefault::Deny,
    }
}

/// Push the idle timer's last activity two hours into the past.
async fn backdate_activity(session: Session) -> StatusCode {
    let past = Utc::now() - Duration::hours(2);
    match session
        .insert(SESSION_LAST_ACTIVITY, past.timestamp_millis())
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Test application wrapper using the real console routes and state.
pub struct TestApp {
    router: Router,
    pub api: Arc<FakeIdentityApi>,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with(test_config(), FakeIdentityApi::default()).await
    }

    pub async fn with(config: Config, api: FakeIdentityApi) -> Self {
        let api = Arc::new(api);
        let theme = ThemeEngine::new(&config.templates_dir).expect("Failed to load templates");
        let state = AppState::with_parts(config.clone(), api.clone(), theme);

        // Same assembly as main.rs, plus the backdating hook
        let router = Router::new()
            .route(BACKDATE_PATH, post(backdate_activity))
            .merge(routes::router(state.clone()));
        let router = with_session_layer(router, &config)
            .await
            .expect("Failed to create session layer");

        Self { router, api, state }
    }

    /// Replace the menu the fake returns from now on.
    pub fn set_menu(&self, reply: MenuReply) {
        *self.api.menu.lock().unwrap() = reply;
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Send a request with cookies from a previous response.
    pub async fn request_with_cookies(&self, mut request: Request<Body>, cookies: &str) -> Response {
        if !cookies.is_empty() {
            request.headers_mut().insert(
                header::COOKIE,
                cookies.parse().expect("Invalid cookie header"),
            );
        }
        self.request(request).await
    }

    /// A cookie-keeping client for this app.
    pub fn browser(&self) -> Browser<'_> {
        Browser {
            app: self,
            cookies: String::new(),
        }
    }

    /// A browser that has already logged in as `user`.
    pub async fn logged_in(&self, user: &str) -> Browser<'_> {
        let mut browser = self.browser();
        let response = browser.login(user, GOOD_PASSWORD).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "login failed for {user}");
        assert_eq!(location(&response), "/dashboard");
        browser
    }
}

/// Client that carries the session cookie across requests.
pub struct Browser<'a> {
    app: &'a TestApp,
    pub cookies: String,
}

impl Browser<'_> {
    async fn send(&mut self, request: Request<Body>) -> Response {
        let response = self.app.request_with_cookies(request, &self.cookies).await;
        let fresh = extract_cookies(&response);
        if !fresh.is_empty() {
            self.cookies = fresh;
        }
        response
    }

    pub async fn get(&mut self, path: &str) -> Response {
        self.send(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> Response {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.send(
            Request::post(path)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// GET `path` and return its body, asserting a 200.
    pub async fn page(&mut self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
        body_string(response).await
    }

    /// CSRF token embedded in the page at `path`.
    pub async fn csrf_token(&mut self, path: &str) -> String {
        let body = self.page(path).await;
        csrf_token_in(&body).expect("page carries no CSRF token")
    }

    /// Submit the login form.
    pub async fn login(&mut self, user: &str, password: &str) -> Response {
        let token = self.csrf_token("/login").await;
        self.post_form(
            "/login",
            &[
                ("csrf_token", token.as_str()),
                ("companyId", COMPANY_GUID),
                ("userName", user),
                ("password", password),
                ("cultureId", "en-US"),
            ],
        )
        .await
    }
}

/// Extract Set-Cookie headers from a response for use in subsequent requests.
pub fn extract_cookies(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Value of the first `csrf_token` hidden input.
pub fn csrf_token_in(body: &str) -> Option<String> {
    let marker = r#"name="csrf_token" value=""#;
    let start = body.find(marker)? + marker.len();
    let end = body[start..].find('"')? + start;
    Some(body[start..end].to_string()).filter(|t| !t.is_empty())
}

/// How Tera's autoescape renders a path inside HTML.
pub fn escaped(path: &str) -> String {
    path.replace('/', "&#x2F;")
}

/// The notification lines (`<li>` texts) of the first notification listing any.
pub fn notification_lines(body: &str) -> Vec<String> {
    let Some(start) = body.find(r#"class="notification__lines">"#) else {
        return Vec::new();
    };
    let rest = &body[start..];
    let end = rest.find("</ul>").unwrap_or(rest.len());
    rest[..end]
        .split("<li>")
        .skip(1)
        .map(|li| li.split("</li>").next().unwrap_or_default().to_string())
        .collect()
}
