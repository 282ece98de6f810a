//! Tera engine with template suggestion resolution.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use dashmap::DashMap;
use tera::Tera;
use tracing::debug;

/// Template renderer for console pages.
pub struct ThemeEngine {
    tera: Tera,
    /// Cache mapping suggestion lists to resolved template names.
    suggestion_cache: DashMap<String, String>,
}

impl ThemeEngine {
    /// Load every `*.html` template under `template_dir`.
    pub fn new(template_dir: &Path) -> Result<Self> {
        let pattern = template_dir.join("**/*.html");
        let pattern_str = pattern
            .to_str()
            .context("invalid template directory path")?;

        let tera = Tera::new(pattern_str).context("failed to initialize Tera templates")?;
        let count = tera.get_template_names().count();
        debug!(count, "loaded templates");

        Ok(Self::with_tera(tera))
    }

    /// Build from an already populated Tera instance.
    pub fn with_tera(mut tera: Tera) -> Self {
        Self::register_filters(&mut tera);
        Self {
            tera,
            suggestion_cache: DashMap::new(),
        }
    }

    /// Engine with no templates.
    pub fn empty() -> Self {
        Self::with_tera(Tera::default())
    }

    fn register_filters(tera: &mut Tera) {
        // RFC 3339 timestamps as "2024-03-01 14:05"
        tera.register_filter(
            "format_datetime",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let formatted = value
                    .as_str()
                    .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                    .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                Ok(tera::Value::String(formatted))
            },
        );

        // Translate a key through the page's `t` map, falling back to the key
        tera.register_filter(
            "tr",
            |value: &tera::Value, args: &HashMap<String, tera::Value>| {
                let key = tera::try_get_value!("tr", "value", String, value);
                let translated = args
                    .get("map")
                    .and_then(|m| m.get(&key))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or(key);
                Ok(tera::Value::String(translated))
            },
        );
    }

    pub fn tera(&self) -> &Tera {
        &self.tera
    }

    /// Render `template` with `context`.
    pub fn render(&self, template: &str, context: &tera::Context) -> Result<String, tera::Error> {
        self.tera.render(template, context)
    }

    /// Resolve the best template from a list of suggestions.
    ///
    /// Suggestions are tried in order; the first existing `{suggestion}.html`
    /// wins. Results are cached.
    ///
    /// Example suggestions: `["companies/list", "resource/list"]`
    pub fn resolve_template(&self, suggestions: &[&str]) -> Option<String> {
        if suggestions.is_empty() {
            return None;
        }

        let cache_key = suggestions.join("|");
        if let Some(cached) = self.suggestion_cache.get(&cache_key) {
            return Some(cached.clone());
        }

        let found = suggestions
            .iter()
            .map(|s| format!("{s}.html"))
            .find(|name| self.tera.get_template(name).is_ok())?;
        self.suggestion_cache.insert(cache_key, found.clone());
        Some(found)
    }

    /// Suggestions for a resource page, most specific first.
    pub fn resource_suggestions(resource: &str, page: &str) -> Vec<String> {
        vec![format!("{resource}/{page}"), format!("resource/{page}")]
    }
}

impl std::fmt::Debug for ThemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEngine")
            .field("templates", &self.tera.get_template_names().count())
            .finish()
    }
}
