//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PJAX_*)
//! 2. TOML config file (if PJAX_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PJAX_*)
/// 2. TOML config file (if PJAX_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin of the site being served, e.g. `https://yunoxia.one`.
    ///
    /// Only requests to this origin are intercepted by the worker and
    /// only links to it are swapped in place.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path opened when a session starts.
    #[serde(default = "default_start_path")]
    pub start_path: String,

    /// Path to the SQLite cache-storage database.
    ///
    /// Set via PJAX_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Name prefix shared by every cache store this application owns.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version of the precache generation. Bump it to force an update.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Unversioned store filled opportunistically at runtime.
    #[serde(default = "default_runtime_cache")]
    pub runtime_cache: String,

    /// Document served to navigations that neither network nor cache can satisfy.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Absolute paths written to the precache store at install.
    ///
    /// Set via PJAX_PRECACHE environment variable as an array, e.g. `["/", "/about.html"]`.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Directory holding partial-fragment documents.
    #[serde(default = "default_fragment_dir")]
    pub fragment_dir: String,

    /// File extensions served cache-first.
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,

    /// Activate a freshly installed worker without waiting for SKIP_WAITING.
    #[serde(default = "default_true")]
    pub skip_waiting_on_install: bool,

    /// Selector for the content container swapped on navigation.
    #[serde(default = "default_container_selector")]
    pub container_selector: String,

    /// Selector for navigation links that carry the active marker.
    #[serde(default = "default_nav_link_selector")]
    pub nav_link_selector: String,

    /// Selector for elements revealed when they scroll into view.
    #[serde(default = "default_reveal_selector")]
    pub reveal_selector: String,

    /// Selector for elements carrying pointer-driven tilt.
    #[serde(default = "default_tilt_selector")]
    pub tilt_selector: String,

    /// Selector for the persisted preference toggle.
    #[serde(default = "default_toggle_selector")]
    pub toggle_selector: String,
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_start_path() -> String {
    "/".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./pjax-cache.sqlite")
}

fn default_user_agent() -> String {
    "pjax/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_cache_prefix() -> String {
    "yunoxia-".into()
}

fn default_cache_version() -> String {
    "v1.0.0".into()
}

fn default_runtime_cache() -> String {
    "yunoxia-runtime".into()
}

fn default_offline_page() -> String {
    "/index.html".into()
}

fn default_precache() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/about.html",
        "/works.html",
        "/log.html",
        "/links.html",
        "/assets/css/style.css",
        "/assets/js/app.js",
        "/partials/header.html",
        "/partials/footer.html",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_fragment_dir() -> String {
    "/partials/".into()
}

fn default_static_extensions() -> Vec<String> {
    [".css", ".js", ".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp", ".woff", ".woff2"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_container_selector() -> String {
    "main".into()
}

fn default_nav_link_selector() -> String {
    "nav .nav-link".into()
}

fn default_reveal_selector() -> String {
    ".fade-in".into()
}

fn default_tilt_selector() -> String {
    ".card".into()
}

fn default_toggle_selector() -> String {
    "#theme-toggle".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            start_path: default_start_path(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            runtime_cache: default_runtime_cache(),
            offline_page: default_offline_page(),
            precache: default_precache(),
            fragment_dir: default_fragment_dir(),
            static_extensions: default_static_extensions(),
            skip_waiting_on_install: true,
            container_selector: default_container_selector(),
            nav_link_selector: default_nav_link_selector(),
            reveal_selector: default_reveal_selector(),
            tilt_selector: default_tilt_selector(),
            toggle_selector: default_toggle_selector(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Name of the versioned precache store, e.g. `yunoxia-v1.0.0`.
    pub fn precache_name(&self) -> String {
        format!("{}{}", self.cache_prefix, self.cache_version)
    }

    /// Parsed site origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute URL.
    pub fn origin_url(&self) -> Result<url::Url, ConfigError> {
        url::Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PJAX_`
    /// 2. TOML file from `PJAX_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PJAX_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PJAX_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
