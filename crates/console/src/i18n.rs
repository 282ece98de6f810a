//! Interface string translation.
//!
//! Catalogs come from the identity API, one per culture, and are cached in
//! process. Lookups fall back to the key itself so a missing translation
//! shows up as its key instead of an empty label.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, warn};

use crate::api::{ApiCredentials, CultureTranslation, IdentityApi, ListItem};

/// How long a catalog stays cached.
const CATALOG_TTL_SECS: u64 = 600;

/// Maximum number of cultures kept in memory.
const MAX_CATALOGS: u64 = 64;

/// Translation catalog of one culture.
#[derive(Debug, Clone, Default)]
pub struct Translations {
    culture_id: String,
    entries: HashMap<String, String>,
}

impl Translations {
    pub fn new(culture_id: impl Into<String>, entries: HashMap<String, String>) -> Self {
        Self {
            culture_id: culture_id.into(),
            entries,
        }
    }

    /// Build a catalog from API rows, skipping blank values.
    pub fn from_rows(culture_id: impl Into<String>, rows: Vec<CultureTranslation>) -> Self {
        let entries = rows
            .into_iter()
            .filter_map(|row| {
                let key = row.translation_key.filter(|k| !k.is_empty())?;
                let value = row.translation_value.filter(|v| !v.is_empty())?;
                Some((key, value))
            })
            .collect();
        Self::new(culture_id, entries)
    }

    pub fn culture_id(&self) -> &str {
        &self.culture_id
    }

    /// Every translated key, for templates.
    pub fn entries(&self) -> &HashMap<String, String> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Translate `key`, falling back to the key.
    pub fn t(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Translate `key` and substitute `{{name}}` placeholders.
    pub fn t_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        interpolate(&self.t(key), args)
    }

    /// Translate every key of `keys` into a map for templates.
    pub fn subset<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> HashMap<String, String> {
        keys.into_iter()
            .map(|key| (key.to_string(), self.t(key)))
            .collect()
    }
}

/// Replace `{{name}}` (and `{{ name }}`) placeholders with their values.
///
/// Unknown placeholders are left as they are.
pub fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in args {
        out = out
            .replace(&format!("{{{{{name}}}}}"), value)
            .replace(&format!("{{{{ {name} }}}}"), value);
    }
    out
}

/// Display name of `culture_id` among the active cultures.
///
/// Falls back to the id when the culture is not listed.
pub fn culture_name(translations: &Translations, cultures: &[ListItem], culture_id: &str) -> String {
    cultures
        .iter()
        .find(|c| c.id == culture_id)
        .and_then(|c| c.name_translation_key.as_deref())
        .map(|key| translations.t(key))
        .unwrap_or_else(|| culture_id.to_string())
}

/// Loads and caches translation catalogs.
#[derive(Clone)]
pub struct TranslationService {
    api: Arc<dyn IdentityApi>,
    cache: Cache<String, Arc<Translations>>,
}

impl TranslationService {
    pub fn new(api: Arc<dyn IdentityApi>) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CATALOGS)
            .time_to_live(Duration::from_secs(CATALOG_TTL_SECS))
            .build();
        Self { api, cache }
    }

    /// Catalog for `culture_id`.
    ///
    /// A failed fetch yields an empty catalog (keys render as themselves)
    /// and is not cached, so the next request tries again.
    pub async fn catalog(&self, creds: &ApiCredentials, culture_id: &str) -> Arc<Translations> {
        if let Some(catalog) = self.cache.get(culture_id).await {
            return catalog;
        }

        match self.api.translations(creds, culture_id).await {
            Ok(rows) => {
                let catalog = Arc::new(Translations::from_rows(culture_id, rows));
                debug!(culture = %culture_id, count = catalog.len(), "loaded translations");
                self.cache
                    .insert(culture_id.to_string(), catalog.clone())
                    .await;
                catalog
            }
            Err(e) => {
                warn!(error = %e, culture = %culture_id, "failed to load translations");
                Arc::new(Translations::new(culture_id, HashMap::new()))
            }
        }
    }

    /// Drop the cached catalog of `culture_id`.
    pub async fn invalidate(&self, culture_id: &str) {
        self.cache.invalidate(culture_id).await;
    }
}

impl std::fmt::Debug for TranslationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationService")
            .field("cached_cultures", &self.cache.entry_count())
            .finish()
    }
}
