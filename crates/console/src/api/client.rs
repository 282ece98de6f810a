//! reqwest implementation of [`IdentityApi`].

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::models::MenuGroupDto;
use super::{
    ApiCredentials, ApiError, Application, Company, CultureTranslation, IdentityApi, ListItem,
    TokenRequest, TokenResponse,
};
use crate::menu::{MenuGraph, MenuGroup};

/// Header carrying the active culture on every call.
pub const CULTURE_HEADER: &str = "CultureId";

/// Maximum number of response-body bytes kept in error values.
const ERROR_BODY_LIMIT: usize = 512;

/// HTTP client for the identity API.
#[derive(Clone)]
pub struct HttpIdentityApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityApi {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(base_url: &Url, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("identity-console/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build a request carrying the bearer token (when present) and culture.
    fn request(&self, method: Method, path: &str, creds: &ApiCredentials) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, self.url(path))
            .header(CULTURE_HEADER, &creds.culture_id);

        if let Some(token) = &creds.token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        creds: &ApiCredentials,
    ) -> Result<T, ApiError> {
        debug!(path = %path, "GET identity API");
        let response = self.request(Method::GET, path, creds).send().await?;
        decode(response).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        creds: &ApiCredentials,
        body: &B,
    ) -> Result<T, ApiError> {
        debug!(path = %path, method = %method, "write to identity API");
        let response = self.request(method, path, creds).json(body).send().await?;
        decode(response).await
    }

    async fn delete(&self, path: &str, creds: &ApiCredentials) -> Result<(), ApiError> {
        debug!(path = %path, "DELETE identity API");
        let response = self.request(Method::DELETE, path, creds).send().await?;
        check_status(response).await.map(|_| ())
    }
}

/// Error for statuses that carry no body worth reading.
fn bodiless_error(status: StatusCode) -> Option<ApiError> {
    match status {
        StatusCode::UNAUTHORIZED => Some(ApiError::Unauthorized),
        StatusCode::FORBIDDEN => Some(ApiError::Forbidden),
        StatusCode::NOT_FOUND => Some(ApiError::NotFound),
        _ => None,
    }
}

/// Map a non-success response to an [`ApiError`], passing success through.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match bodiless_error(status) {
        Some(error) => Err(error),
        None => {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::BAD_REQUEST
                && let Some(errors) = parse_validation_errors(&body)
            {
                return Err(ApiError::Validation(errors));
            }
            warn!(status = status.as_u16(), "identity API returned an error status");
            Err(ApiError::Status {
                status: status.as_u16(),
                body: truncate(&body, ERROR_BODY_LIMIT),
            })
        }
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Extract the `errors` map of a validation problem body.
///
/// Values may be a single string or a list of strings.
fn parse_validation_errors(body: &str) -> Option<BTreeMap<String, Vec<String>>> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let errors = value.get("errors")?.as_object()?;

    let map = errors
        .iter()
        .map(|(field, messages)| {
            let messages = match messages {
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(|m| m.as_str().map(str::to_string))
                    .collect(),
                serde_json::Value::String(s) => vec![s.clone()],
                other => vec![other.to_string()],
            };
            (field.clone(), messages)
        })
        .collect();
    Some(map)
}

fn truncate(body: &str, limit: usize) -> String {
    if body.len() <= limit {
        return body.to_string();
    }
    let mut at = limit;
    while at > 0 && !body.is_char_boundary(at) {
        at -= 1;
    }
    format!("{}...[truncated]", &body[..at])
}

#[async_trait]
impl IdentityApi for HttpIdentityApi {
    async fn issue_token(
        &self,
        creds: &ApiCredentials,
        request: &TokenRequest,
    ) -> Result<TokenResponse, ApiError> {
        self.send_json(Method::POST, "/api/Oauth2/v1/Token", creds, request)
            .await
    }

    async fn menu(&self, creds: &ApiCredentials) -> Result<MenuGraph, ApiError> {
        let groups: Vec<MenuGroupDto> = self.get_json("/api/Users/v1/Menu", creds).await?;
        Ok(MenuGraph::new(
            groups.into_iter().map(MenuGroup::from).collect(),
        ))
    }

    async fn translations(
        &self,
        creds: &ApiCredentials,
        culture_id: &str,
    ) -> Result<Vec<CultureTranslation>, ApiError> {
        let path = format!(
            "/api/Localizations/v1/ByCulture/{}",
            urlencoding::encode(culture_id)
        );
        self.get_json(&path, creds).await
    }

    async fn active_cultures(&self, creds: &ApiCredentials) -> Result<Vec<ListItem>, ApiError> {
        self.get_json("/api/Master/v1/Cultures/Active/DropDown", creds)
            .await
    }

    async fn countries(&self, creds: &ApiCredentials) -> Result<Vec<ListItem>, ApiError> {
        self.get_json("/api/Master/v1/Countries/Dropdown", creds).await
    }

    async fn companies_with_guid(
        &self,
        creds: &ApiCredentials,
    ) -> Result<Vec<ListItem>, ApiError> {
        self.get_json("/api/Companies/v1/Dropdown/WithGuid", creds)
            .await
    }

    async fn companies_dropdown(&self, creds: &ApiCredentials) -> Result<Vec<ListItem>, ApiError> {
        self.get_json("/api/Companies/v1/Dropdown", creds).await
    }

    async fn license_types(&self, creds: &ApiCredentials) -> Result<Vec<ListItem>, ApiError> {
        self.get_json("/api/Applications/v1/Licensetypes/Dropdown", creds)
            .await
    }

    async fn companies(&self, creds: &ApiCredentials) -> Result<Vec<Company>, ApiError> {
        self.get_json("/api/Companies/v1/All", creds).await
    }

    async fn company(&self, creds: &ApiCredentials, id: i64) -> Result<Company, ApiError> {
        self.get_json(&format!("/api/Companies/v1/{id}"), creds).await
    }

    async fn create_company(
        &self,
        creds: &ApiCredentials,
        company: &Company,
    ) -> Result<Company, ApiError> {
        self.send_json(Method::POST, "/api/Companies/v1", creds, company)
            .await
    }

    async fn update_company(
        &self,
        creds: &ApiCredentials,
        company: &Company,
    ) -> Result<Company, ApiError> {
        self.send_json(Method::PUT, "/api/Companies/v1", creds, company)
            .await
    }

    async fn delete_company(&self, creds: &ApiCredentials, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/Companies/v1/{id}"), creds).await
    }

    async fn applications(&self, creds: &ApiCredentials) -> Result<Vec<Application>, ApiError> {
        self.get_json("/api/Applications/v1/All", creds).await
    }

    async fn application(
        &self,
        creds: &ApiCredentials,
        id: i64,
    ) -> Result<Application, ApiError> {
        self.get_json(&format!("/api/Applications/v1/{id}"), creds)
            .await
    }

    async fn update_application(
        &self,
        creds: &ApiCredentials,
        application: &Application,
    ) -> Result<Application, ApiError> {
        self.send_json(Method::PUT, "/api/Applications/v1", creds, application)
            .await
    }

    async fn delete_application(&self, creds: &ApiCredentials, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/Applications/v1/{id}"), creds)
            .await
    }

    async fn ping(&self) -> bool {
        // Any HTTP answer means the API is reachable
        match self
            .client
            .get(self.url("/api/Master/v1/Cultures/Active/DropDown"))
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "identity API unreachable");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let api = HttpIdentityApi::new(
            &Url::parse("https://api.example.com/identity/").unwrap(),
            Duration::from_secs(5),
        );
        assert_eq!(
            api.url("/api/Users/v1/Menu"),
            "https://api.example.com/identity/api/Users/v1/Menu"
        );
    }

    #[test]
    fn validation_errors_accept_lists_and_strings() {
        let body = r#"{"title":"One or more validation errors occurred.",
            "errors":{"Email":["Invalid email","Too long"],"Subdomain":"Taken"}}"#;
        let errors = parse_validation_errors(body).unwrap();
        assert_eq!(errors["Email"], vec!["Invalid email", "Too long"]);
        assert_eq!(errors["Subdomain"], vec!["Taken"]);
    }

    #[test]
    fn validation_errors_absent_for_plain_bodies() {
        assert!(parse_validation_errors("bad request").is_none());
        assert!(parse_validation_errors(r#"{"title":"x"}"#).is_none());
    }

    #[test]
    fn forbidden_is_distinct_from_unauthorized() {
        assert!(matches!(
            bodiless_error(StatusCode::UNAUTHORIZED),
            Some(ApiError::Unauthorized)
        ));
        assert!(matches!(
            bodiless_error(StatusCode::FORBIDDEN),
            Some(ApiError::Forbidden)
        ));
        assert!(matches!(
            bodiless_error(StatusCode::NOT_FOUND),
            Some(ApiError::NotFound)
        ));
        assert!(bodiless_error(StatusCode::BAD_REQUEST).is_none());
        assert!(bodiless_error(StatusCode::INTERNAL_SERVER_ERROR).is_none());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "é".repeat(10);
        let out = truncate(&body, 5);
        assert!(out.starts_with("éé"));
        assert!(out.ends_with("...[truncated]"));
    }
}
