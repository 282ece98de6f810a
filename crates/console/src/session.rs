//! Session management.
//!
//! The session holds the bearer token and the active culture under two
//! configurable keys, plus the idle timer, flash notifications and CSRF
//! tokens. Redis backs it when configured, memory otherwise.

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use chrono::{DateTime, TimeZone, Utc};
use fred::prelude::*;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};
use tower_sessions_redis_store::RedisStore;
use tracing::info;

use crate::api::ApiCredentials;
use crate::config::Config;
use crate::state::AppState;

/// Session key for the last-activity timestamp (unix milliseconds).
pub const SESSION_LAST_ACTIVITY: &str = "last_activity";

/// Name of the session cookie.
const SESSION_COOKIE_NAME: &str = "console_session";

/// Minutes the session record outlives the idle timeout.
///
/// The idle timer, not the store, must end the authenticated state, so the
/// record is still there to carry the culture and the auto-logout notice.
pub const SESSION_GRACE_MINUTES: i64 = 30;

/// Store inactivity window: the idle timeout plus [`SESSION_GRACE_MINUTES`].
pub fn session_expiry(idle_timeout: chrono::Duration) -> Expiry {
    Expiry::OnInactivity(Duration::minutes(
        idle_timeout.num_minutes() + SESSION_GRACE_MINUTES,
    ))
}

/// Attach the session layer to `router`.
///
/// Uses Redis when `REDIS_URL` is configured, an in-memory store otherwise.
/// The store keeps an idle session for a grace period past the idle timeout.
pub async fn with_session_layer(router: Router, config: &Config) -> Result<Router> {
    let same_site = match config.cookie_same_site.as_str() {
        "lax" => SameSite::Lax,
        "none" => SameSite::None,
        _ => SameSite::Strict,
    };
    let expiry = session_expiry(config.idle_timeout());

    match &config.redis_url {
        Some(redis_url) => {
            let redis_config =
                fred::prelude::Config::from_url(redis_url).context("failed to parse Redis URL")?;

            let pool = Builder::from_config(redis_config)
                .build_pool(1)
                .context("failed to create Redis pool")?;

            pool.init()
                .await
                .context("failed to connect to Redis for sessions")?;

            info!("sessions stored in Redis");
            let layer = SessionManagerLayer::new(RedisStore::new(pool))
                .with_name(SESSION_COOKIE_NAME)
                .with_secure(config.cookie_secure)
                .with_http_only(true)
                .with_same_site(same_site)
                .with_expiry(expiry);
            Ok(router.layer(layer))
        }
        None => {
            info!("sessions stored in memory");
            let layer = SessionManagerLayer::new(MemoryStore::default())
                .with_name(SESSION_COOKIE_NAME)
                .with_secure(config.cookie_secure)
                .with_http_only(true)
                .with_same_site(same_site)
                .with_expiry(expiry);
            Ok(router.layer(layer))
        }
    }
}

/// Key names and defaults used to read the console's session values.
#[derive(Debug, Clone)]
pub struct SessionKeys {
    pub token: String,
    pub culture: String,
    pub default_culture: String,
}

impl SessionKeys {
    pub fn from_config(config: &Config) -> Self {
        Self {
            token: config.token_storage_key.clone(),
            culture: config.culture_storage_key.clone(),
            default_culture: config.default_culture.clone(),
        }
    }
}

/// Typed view over the request's session.
#[derive(Debug, Clone)]
pub struct ConsoleSession {
    session: Session,
    keys: SessionKeys,
}

impl ConsoleSession {
    pub fn new(session: Session, keys: SessionKeys) -> Self {
        Self { session, keys }
    }

    /// The underlying session, for CSRF and notification helpers.
    pub fn raw(&self) -> &Session {
        &self.session
    }

    /// The stored bearer token, if any.
    pub async fn token(&self) -> Result<Option<String>, tower_sessions::session::Error> {
        self.session.get::<String>(&self.keys.token).await
    }

    /// True exactly when a token is stored.
    pub async fn is_authenticated(&self) -> bool {
        matches!(self.token().await, Ok(Some(_)))
    }

    /// Bearer credentials for upstream calls, when logged in.
    pub async fn credentials(&self) -> Option<ApiCredentials> {
        let token = self.token().await.ok().flatten()?;
        Some(ApiCredentials::bearer(token, self.culture().await))
    }

    /// Store the token of a fresh login.
    ///
    /// Rotates the session id first so a pre-login id cannot be reused.
    pub async fn set_token(&self, token: &str) -> Result<(), tower_sessions::session::Error> {
        self.session.cycle_id().await?;
        self.session.insert(&self.keys.token, token).await
    }

    /// The active culture, or the configured default when none is stored.
    pub async fn culture(&self) -> String {
        self.session
            .get::<String>(&self.keys.culture)
            .await
            .ok()
            .flatten()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.keys.default_culture.clone())
    }

    pub async fn set_culture(&self, culture_id: &str) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(&self.keys.culture, culture_id).await
    }

    /// Last recorded activity, if the idle timer has been started.
    pub async fn last_activity(&self) -> Option<DateTime<Utc>> {
        let millis = self
            .session
            .get::<i64>(SESSION_LAST_ACTIVITY)
            .await
            .ok()
            .flatten()?;
        Utc.timestamp_millis_opt(millis).single()
    }

    pub async fn set_last_activity(
        &self,
        at: DateTime<Utc>,
    ) -> Result<(), tower_sessions::session::Error> {
        self.session
            .insert(SESSION_LAST_ACTIVITY, at.timestamp_millis())
            .await
    }

    /// Drop everything: token, culture, idle timer, pending notifications.
    ///
    /// The culture survives when `keep_culture` is set so the login page
    /// keeps the user's language.
    pub async fn clear(&self, keep_culture: bool) -> Result<(), tower_sessions::session::Error> {
        let culture = self.culture().await;
        self.session.flush().await?;
        if keep_culture {
            self.set_culture(&culture).await?;
        }
        Ok(())
    }
}

impl FromRequestParts<AppState> for ConsoleSession {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Ok(Self::new(session, state.session_keys().clone()))
    }
}
