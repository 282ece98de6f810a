//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use url::Url;

use crate::menu::{CapabilityDefault, GuardPolicy};

/// Application configuration.
///
/// Loaded once at startup and immutable thereafter.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// Base URL of the upstream identity API.
    pub api_base_url: Url,

    /// Timeout for upstream API calls in seconds (default: 30).
    pub api_timeout_secs: u64,

    /// Session key holding the bearer token (default: "access_token").
    pub token_storage_key: String,

    /// Session key holding the active culture id (default: "culture_id").
    pub culture_storage_key: String,

    /// Application id presented when requesting a token.
    pub application_id: String,

    /// Application secret presented when requesting a token.
    pub application_secret: String,

    /// Culture used when the session has none (default: "en-US").
    pub default_culture: String,

    /// Minutes without activity before the session is logged off (default: 15).
    pub auto_logoff_minutes: u32,

    /// Page sizes offered by list pages (default: 10,25,50,100).
    pub grid_page_sizes: Vec<usize>,

    /// Page size used when none (or an unknown one) is requested (default: 10).
    pub grid_default_page_size: usize,

    /// Path to the Tera templates directory (default: ./templates).
    pub templates_dir: PathBuf,

    /// Path to the stylesheet and script directory (default: ./static).
    pub static_dir: PathBuf,

    /// Redis URL for the session store. When None, sessions live in memory.
    pub redis_url: Option<String>,

    /// Cookie SameSite policy: "strict", "lax", or "none" (default: "strict").
    pub cookie_same_site: String,

    /// Whether the session cookie is marked Secure (default: true).
    pub cookie_secure: bool,

    /// What the route guard does with routes missing from the menu graph.
    pub guard_policy: GuardPolicy,

    /// Capability flags used when a page has no menu item.
    pub capability_default: CapabilityDefault,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let api_base_url = env::var("API_BASE_URL")
            .context("API_BASE_URL environment variable is required")?;
        let api_base_url = Url::parse(&api_base_url).context("API_BASE_URL must be a valid URL")?;

        let api_timeout_secs = env::var("API_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("API_TIMEOUT_SECS must be a valid u64")?;

        let token_storage_key =
            env::var("TOKEN_STORAGE_KEY").unwrap_or_else(|_| "access_token".to_string());
        let culture_storage_key =
            env::var("CULTURE_STORAGE_KEY").unwrap_or_else(|_| "culture_id".to_string());
        if token_storage_key == culture_storage_key {
            bail!("TOKEN_STORAGE_KEY and CULTURE_STORAGE_KEY must differ");
        }

        let application_id = env::var("APPLICATION_ID")
            .context("APPLICATION_ID environment variable is required")?;
        let application_secret = env::var("APPLICATION_SECRET")
            .context("APPLICATION_SECRET environment variable is required")?;

        let default_culture = env::var("DEFAULT_CULTURE").unwrap_or_else(|_| "en-US".to_string());

        let auto_logoff_minutes: u32 = env::var("AUTO_LOGOFF_TIME")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .context("AUTO_LOGOFF_TIME must be a whole number of minutes")?;
        if auto_logoff_minutes == 0 {
            bail!("AUTO_LOGOFF_TIME must be at least 1 minute");
        }

        let grid_page_sizes = parse_page_sizes(
            &env::var("GRID_PAGE_SIZES_LIST").unwrap_or_else(|_| "10,25,50,100".to_string()),
        )?;

        let grid_default_page_size: usize = env::var("GRID_DEFAULT_PAGE_SIZE")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("GRID_DEFAULT_PAGE_SIZE must be a valid number")?;
        if !grid_page_sizes.contains(&grid_default_page_size) {
            bail!("GRID_DEFAULT_PAGE_SIZE must be one of GRID_PAGE_SIZES_LIST");
        }

        let templates_dir = env::var("TEMPLATES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./templates"));

        let static_dir = env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./static"));

        let redis_url = env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty());

        let cookie_same_site = env::var("COOKIE_SAME_SITE")
            .unwrap_or_else(|_| "strict".to_string())
            .to_lowercase();

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        let guard_policy = env::var("MENU_GUARD_POLICY")
            .unwrap_or_else(|_| "deny".to_string())
            .parse()
            .context("MENU_GUARD_POLICY must be \"deny\" or \"allow\"")?;

        let capability_default = env::var("CAPABILITY_DEFAULT")
            .unwrap_or_else(|_| "deny".to_string())
            .parse()
            .context("CAPABILITY_DEFAULT must be \"deny\" or \"allow\"")?;

        Ok(Self {
            port,
            api_base_url,
            api_timeout_secs,
            token_storage_key,
            culture_storage_key,
            application_id,
            application_secret,
            default_culture,
            auto_logoff_minutes,
            grid_page_sizes,
            grid_default_page_size,
            templates_dir,
            static_dir,
            redis_url,
            cookie_same_site,
            cookie_secure,
            guard_policy,
            capability_default,
        })
    }

    /// Idle timeout as a chrono duration.
    pub fn idle_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.auto_logoff_minutes))
    }
}

/// Parse a comma-separated list of page sizes, ignoring blanks.
fn parse_page_sizes(raw: &str) -> Result<Vec<usize>> {
    let sizes = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .with_context(|| format!("invalid page size in GRID_PAGE_SIZES_LIST: {s}"))
        })
        .collect::<Result<Vec<_>>>()?;

    if sizes.is_empty() || sizes.contains(&0) {
        bail!("GRID_PAGE_SIZES_LIST must contain at least one non-zero size");
    }
    Ok(sizes)
}
