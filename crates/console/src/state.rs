//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::api::{HttpIdentityApi, IdentityApi};
use crate::config::Config;
use crate::i18n::TranslationService;
use crate::menu::RouteTable;
use crate::nav::PopoverDelays;
use crate::session::SessionKeys;
use crate::theme::ThemeEngine;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Immutable configuration.
    config: Config,

    /// Upstream identity API.
    api: Arc<dyn IdentityApi>,

    /// Translation catalogs, cached per culture.
    translations: TranslationService,

    /// Theme engine for template rendering.
    theme: Arc<ThemeEngine>,

    /// Pages of the authenticated area and what authorizes them.
    routes: RouteTable,

    /// Session key names.
    session_keys: SessionKeys,

    /// Hover popover delays handed to the layout script.
    popover_delays: PopoverDelays,
}

impl AppState {
    /// Create state talking to the configured identity API.
    pub fn new(config: &Config) -> Self {
        let api: Arc<dyn IdentityApi> = Arc::new(HttpIdentityApi::new(
            &config.api_base_url,
            Duration::from_secs(config.api_timeout_secs),
        ));
        info!(api = %config.api_base_url, "identity API client created");

        info!(template_dir = ?config.templates_dir, "loading templates from directory");
        let theme = ThemeEngine::new(&config.templates_dir)
            .inspect_err(|e| warn!(error = ?e, "failed to load templates, using empty engine"))
            .unwrap_or_else(|_| ThemeEngine::empty());

        Self::with_parts(config.clone(), api, theme)
    }

    /// Assemble state from ready-made parts.
    pub fn with_parts(config: Config, api: Arc<dyn IdentityApi>, theme: ThemeEngine) -> Self {
        let translations = TranslationService::new(api.clone());
        let session_keys = SessionKeys::from_config(&config);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                translations,
                theme: Arc::new(theme),
                routes: RouteTable::console(),
                session_keys,
                popover_delays: PopoverDelays::default(),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn api(&self) -> &Arc<dyn IdentityApi> {
        &self.inner.api
    }

    pub fn translations(&self) -> &TranslationService {
        &self.inner.translations
    }

    pub fn theme(&self) -> &Arc<ThemeEngine> {
        &self.inner.theme
    }

    pub fn routes(&self) -> &RouteTable {
        &self.inner.routes
    }

    pub fn session_keys(&self) -> &SessionKeys {
        &self.inner.session_keys
    }

    pub fn popover_delays(&self) -> PopoverDelays {
        self.inner.popover_delays
    }
}
