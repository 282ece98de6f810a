//! Client for the upstream identity API.
//!
//! Handlers depend on the [`IdentityApi`] trait so tests can swap the HTTP
//! implementation for an in-process fake.

mod client;
pub mod models;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

pub use client::HttpIdentityApi;
pub use models::{
    Application, Company, CultureTranslation, GRANT_CLIENT_CREDENTIALS, ListItem, TokenRequest,
    TokenResponse,
};

use crate::menu::MenuGraph;

/// Errors returned by the identity API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The token was rejected (401).
    #[error("unauthorized")]
    Unauthorized,

    /// The token is valid but lacks permission for the call (403).
    #[error("forbidden")]
    Forbidden,

    /// The record does not exist (404).
    #[error("not found")]
    NotFound,

    /// The API rejected the payload with per-field messages (400).
    #[error("validation failed")]
    Validation(BTreeMap<String, Vec<String>>),

    /// Any other non-success status.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Identity attached to one upstream call.
///
/// The token is absent for the anonymous calls made by the login page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub token: Option<String>,
    pub culture_id: String,
}

impl ApiCredentials {
    /// Credentials for an authenticated call.
    pub fn bearer(token: impl Into<String>, culture_id: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            culture_id: culture_id.into(),
        }
    }

    /// Credentials for an unauthenticated call.
    pub fn anonymous(culture_id: impl Into<String>) -> Self {
        Self {
            token: None,
            culture_id: culture_id.into(),
        }
    }
}

/// Operations the console needs from the identity API.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Exchange user credentials for a bearer token.
    async fn issue_token(
        &self,
        creds: &ApiCredentials,
        request: &TokenRequest,
    ) -> Result<TokenResponse, ApiError>;

    /// Permission-scoped menu graph for the caller.
    async fn menu(&self, creds: &ApiCredentials) -> Result<MenuGraph, ApiError>;

    /// Translation catalog for a culture.
    async fn translations(
        &self,
        creds: &ApiCredentials,
        culture_id: &str,
    ) -> Result<Vec<CultureTranslation>, ApiError>;

    async fn active_cultures(&self, creds: &ApiCredentials) -> Result<Vec<ListItem>, ApiError>;

    async fn countries(&self, creds: &ApiCredentials) -> Result<Vec<ListItem>, ApiError>;

    /// Companies keyed by their public guid, used by the login page.
    async fn companies_with_guid(&self, creds: &ApiCredentials)
    -> Result<Vec<ListItem>, ApiError>;

    /// Companies keyed by numeric id, used as application owners.
    async fn companies_dropdown(&self, creds: &ApiCredentials) -> Result<Vec<ListItem>, ApiError>;

    async fn license_types(&self, creds: &ApiCredentials) -> Result<Vec<ListItem>, ApiError>;

    async fn companies(&self, creds: &ApiCredentials) -> Result<Vec<Company>, ApiError>;

    async fn company(&self, creds: &ApiCredentials, id: i64) -> Result<Company, ApiError>;

    async fn create_company(
        &self,
        creds: &ApiCredentials,
        company: &Company,
    ) -> Result<Company, ApiError>;

    async fn update_company(
        &self,
        creds: &ApiCredentials,
        company: &Company,
    ) -> Result<Company, ApiError>;

    async fn delete_company(&self, creds: &ApiCredentials, id: i64) -> Result<(), ApiError>;

    async fn applications(&self, creds: &ApiCredentials) -> Result<Vec<Application>, ApiError>;

    async fn application(&self, creds: &ApiCredentials, id: i64)
    -> Result<Application, ApiError>;

    async fn update_application(
        &self,
        creds: &ApiCredentials,
        application: &Application,
    ) -> Result<Application, ApiError>;

    async fn delete_application(&self, creds: &ApiCredentials, id: i64) -> Result<(), ApiError>;

    /// Cheap reachability probe for the health endpoint.
    async fn ping(&self) -> bool;
}
