//! Application configuration loaded from environment variables.
//!
//! Configuration is loaded once at startup and validated before the server starts.
//! Every variable may also be supplied as a Docker secret: when the variable is
//! unset, the file `/run/secrets/<lowercase name>` is read instead (for example
//! `/run/secrets/cgx_auth_token`). The legacy secret names `cgx_memcached`,
//! `cgx_debug` and `cgx_always_pretty` are accepted for `REDIS_URL`, `DEBUG`
//! and `ALWAYS_PRETTY`.
//!
//! ## Controller Credentials
//!
//! Exactly one of the following must be configured:
//!
//! ```bash
//! # Static token (rotated outside the gateway)
//! export CGX_AUTH_TOKEN="..."
//!
//! # Interactive login (refreshed by the gateway)
//! export CGX_USERNAME="ops@example.com"
//! export CGX_PASSWORD="..."
//! ```
//!
//! ## Shared Cache
//!
//! ```bash
//! export REDIS_URL="redis://localhost:6379/0"
//! # or a comma-separated server list, keys are sharded across it
//! export REDIS_URL="cache-a:6379,cache-b:6379"
//! # or
//! export REDIS_HOST="localhost"
//! export REDIS_PORT="6379"
//! export REDIS_PASSWORD=""
//! export REDIS_DB="0"
//! ```
//!
//! Without Redis the gateway caches in-process.
//!
//! ## Optional Variables
//!
//! - `LISTEN` - Bind address (default: `0.0.0.0:8080`)
//! - `CGX_CONTROLLER` - Controller base URL (default: `https://api.elcapitan.cloudgenix.com`)
//! - `CGX_SSL_VERIFY` - Verify controller TLS certificates (default: `true`)
//! - `CACHE_TTL_SECONDS` - Topology/site cache lifetime (default: 300)
//! - `LOGIN_REFRESH_SECONDS` - Session age before re-login (default: 25200)
//! - `LOGIN_MAX_ATTEMPTS` - Login attempts per refresh (default: 5)
//! - `LOGIN_BACKOFF_MS` / `LOGIN_MAX_BACKOFF_MS` - Retry delays (default: 500 / 10000)
//! - `LOGIN_TIMEOUT_SECONDS` - Upper bound on one refresh (default: 60)
//! - `BACKEND_TIMEOUT_SECONDS` - Per-call controller deadline (default: 30)
//! - `ALWAYS_PRETTY` - Indent JSON responses (default: `true`)
//! - `DEBUG` - Shortcut for `RUST_LOG=debug` when `RUST_LOG` is unset
//! - `RUST_LOG` - Log level (default: `info`)
//! - `LOG_FORMAT` - Log format: `text` or `json` (default: `text`)

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::application::services::{LoginPolicy, ResolverSettings};
use crate::domain::entities::LoginCredentials;

/// Directory where Docker mounts secrets.
const SECRETS_DIR: &str = "/run/secrets";

const DEFAULT_CONTROLLER: &str = "https://api.elcapitan.cloudgenix.com";

/// Secret file names accepted in addition to the lowercase variable name.
const SECRET_ALIASES: &[(&str, &str)] = &[
    ("REDIS_URL", "cgx_memcached"),
    ("DEBUG", "cgx_debug"),
    ("ALWAYS_PRETTY", "cgx_always_pretty"),
];

/// Service configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    pub listen_addr: String,
    pub controller_url: String,
    /// Verify the controller's TLS certificate (`CGX_SSL_VERIFY`).
    pub ssl_verify: bool,
    /// Pre-issued controller token (`CGX_AUTH_TOKEN`).
    pub auth_token: Option<String>,
    /// Interactive login user (`CGX_USERNAME`).
    pub username: Option<String>,
    /// Interactive login password (`CGX_PASSWORD`).
    pub password: Option<String>,
    /// Shared cache servers. Empty means in-process caching.
    pub redis_urls: Vec<String>,
    pub log_level: String,
    pub log_format: String,
    /// Lifetime (seconds) of cached topology and site payloads.
    pub cache_ttl_seconds: u64,
    /// Session age (seconds) after which the gateway logs in again.
    /// Independent of the cache TTL.
    pub login_refresh_seconds: u64,
    pub login_max_attempts: usize,
    pub login_backoff_ms: u64,
    pub login_max_backoff_ms: u64,
    pub login_timeout_seconds: u64,
    /// Deadline (seconds) for a single controller call.
    pub backend_timeout_seconds: u64,
    pub always_pretty: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redis_urls: Vec<String> = self
            .redis_urls
            .iter()
            .map(|url| mask_connection_string(url))
            .collect();

        f.debug_struct("Config")
            .field("listen_addr", &self.listen_addr)
            .field("controller_url", &self.controller_url)
            .field("ssl_verify", &self.ssl_verify)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "***"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("redis_urls", &redis_urls)
            .field("cache_ttl_seconds", &self.cache_ttl_seconds)
            .field("login_refresh_seconds", &self.login_refresh_seconds)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Loads configuration from environment variables and secret files.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_sources(Path::new(SECRETS_DIR))
    }

    /// Loads configuration, reading secrets from `secrets_dir`.
    fn from_sources(secrets_dir: &Path) -> Result<Self> {
        let var = |name: &str| lookup(secrets_dir, name);

        let listen_addr = var("LISTEN").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let controller_url =
            var("CGX_CONTROLLER").unwrap_or_else(|| DEFAULT_CONTROLLER.to_string());
        let ssl_verify = var("CGX_SSL_VERIFY").map(|v| is_truthy(&v)).unwrap_or(true);

        let auth_token = var("CGX_AUTH_TOKEN").filter(|v| !v.is_empty());
        let username = var("CGX_USERNAME").filter(|v| !v.is_empty());
        let password = var("CGX_PASSWORD");

        let redis_urls = Self::load_redis_urls(secrets_dir);

        let debug = var("DEBUG").is_some_and(|v| is_truthy(&v));
        let log_level = var("RUST_LOG")
            .unwrap_or_else(|| if debug { "debug" } else { "info" }.to_string());
        let log_format = var("LOG_FORMAT").unwrap_or_else(|| "text".to_string());

        let always_pretty = var("ALWAYS_PRETTY").map(|v| is_truthy(&v)).unwrap_or(true);

        Ok(Self {
            listen_addr,
            controller_url,
            ssl_verify,
            auth_token,
            username,
            password,
            redis_urls,
            log_level,
            log_format,
            cache_ttl_seconds: parse_or(secrets_dir, "CACHE_TTL_SECONDS", 300)?,
            login_refresh_seconds: parse_or(secrets_dir, "LOGIN_REFRESH_SECONDS", 7 * 60 * 60)?,
            login_max_attempts: parse_or(secrets_dir, "LOGIN_MAX_ATTEMPTS", 5)?,
            login_backoff_ms: parse_or(secrets_dir, "LOGIN_BACKOFF_MS", 500)?,
            login_max_backoff_ms: parse_or(secrets_dir, "LOGIN_MAX_BACKOFF_MS", 10_000)?,
            login_timeout_seconds: parse_or(secrets_dir, "LOGIN_TIMEOUT_SECONDS", 60)?,
            backend_timeout_seconds: parse_or(secrets_dir, "BACKEND_TIMEOUT_SECONDS", 30)?,
            always_pretty,
        })
    }

    /// Loads Redis server URLs with fallback to component-based configuration.
    ///
    /// Priority:
    /// 1. `REDIS_URL` environment variable (or secret), comma-separated
    /// 2. Constructed from `REDIS_HOST`, `REDIS_PORT`, `REDIS_PASSWORD`, `REDIS_DB`
    ///
    /// Returns an empty list if Redis is not configured.
    fn load_redis_urls(secrets_dir: &Path) -> Vec<String> {
        let var = |name: &str| lookup(secrets_dir, name);

        if let Some(list) = var("REDIS_URL").filter(|v| !v.trim().is_empty()) {
            return parse_server_list(&list);
        }

        let Some(host) = var("REDIS_HOST") else {
            return Vec::new();
        };
        let port = var("REDIS_PORT").unwrap_or_else(|| "6379".to_string());
        let db = var("REDIS_DB").unwrap_or_else(|| "0".to_string());

        let url = match var("REDIS_PASSWORD") {
            // Empty password means no authentication
            Some(pwd) if !pwd.is_empty() => format!("redis://:{}@{}:{}/{}", pwd, host, port, db),
            _ => format!("redis://{}:{}/{}", host, port, db),
        };

        vec![url]
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - neither or both credential modes are configured
    /// - `log_format` is not `text` or `json`
    /// - `listen_addr` or a URL is malformed
    /// - a duration or attempt count is zero
    pub fn validate(&self) -> Result<()> {
        match (&self.auth_token, &self.username) {
            (Some(_), Some(_)) => {
                anyhow::bail!("Set either CGX_AUTH_TOKEN or CGX_USERNAME/CGX_PASSWORD, not both")
            }
            (None, None) => {
                anyhow::bail!("CGX_AUTH_TOKEN or CGX_USERNAME/CGX_PASSWORD must be set")
            }
            (None, Some(_)) if self.password.is_none() => {
                anyhow::bail!("CGX_PASSWORD must be set when CGX_USERNAME is provided")
            }
            _ => {}
        }

        if self.log_format != "text" && self.log_format != "json" {
            anyhow::bail!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            );
        }

        if !self.listen_addr.contains(':') {
            anyhow::bail!(
                "LISTEN must be in format 'host:port', got '{}'",
                self.listen_addr
            );
        }

        if !self.controller_url.starts_with("https://")
            && !self.controller_url.starts_with("http://")
        {
            anyhow::bail!(
                "CGX_CONTROLLER must start with 'https://' or 'http://', got '{}'",
                self.controller_url
            );
        }

        for redis_url in &self.redis_urls {
            if !redis_url.starts_with("redis://") && !redis_url.starts_with("rediss://") {
                anyhow::bail!(
                    "REDIS_URL entries must start with 'redis://' or 'rediss://', got '{}'",
                    mask_connection_string(redis_url)
                );
            }
        }

        if self.cache_ttl_seconds == 0 {
            anyhow::bail!("CACHE_TTL_SECONDS must be greater than 0");
        }
        if self.login_refresh_seconds == 0 {
            anyhow::bail!("LOGIN_REFRESH_SECONDS must be greater than 0");
        }
        if self.login_max_attempts == 0 || self.login_max_attempts > 100 {
            anyhow::bail!(
                "LOGIN_MAX_ATTEMPTS must be between 1 and 100, got {}",
                self.login_max_attempts
            );
        }
        if self.login_timeout_seconds == 0 {
            anyhow::bail!("LOGIN_TIMEOUT_SECONDS must be greater than 0");
        }
        if self.backend_timeout_seconds == 0 {
            anyhow::bail!("BACKEND_TIMEOUT_SECONDS must be greater than 0");
        }

        Ok(())
    }

    /// Replaces the shared cache servers with a comma-separated list.
    pub fn set_redis_servers(&mut self, list: &str) {
        self.redis_urls = parse_server_list(list);
    }

    /// Returns whether a shared Redis cache is configured.
    pub fn is_cache_distributed(&self) -> bool {
        !self.redis_urls.is_empty()
    }

    /// Interactive login credentials, if configured.
    pub fn login_credentials(&self) -> Option<LoginCredentials> {
        match (&self.username, &self.password) {
            (Some(email), Some(password)) => Some(LoginCredentials {
                email: email.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_seconds)
    }

    pub fn login_policy(&self) -> LoginPolicy {
        LoginPolicy {
            refresh_interval: Duration::from_secs(self.login_refresh_seconds),
            max_attempts: self.login_max_attempts,
            initial_backoff: Duration::from_millis(self.login_backoff_ms),
            max_backoff: Duration::from_millis(self.login_max_backoff_ms),
            timeout: Duration::from_secs(self.login_timeout_seconds),
        }
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            cache_ttl: self.cache_ttl(),
            backend_timeout: self.backend_timeout(),
        }
    }

    /// Prints configuration summary (without sensitive data).
    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Listen address: {}", self.listen_addr);
        tracing::info!("  Controller: {}", self.controller_url);
        if !self.ssl_verify {
            tracing::info!("  Controller TLS verification: disabled");
        }

        if self.auth_token.is_some() {
            tracing::info!("  Auth: static token");
        } else if let Some(ref user) = self.username {
            tracing::info!(
                "  Auth: interactive login as {} (refresh every {}s)",
                user,
                self.login_refresh_seconds
            );
        }

        if self.is_cache_distributed() {
            let servers: Vec<String> = self
                .redis_urls
                .iter()
                .map(|url| mask_connection_string(url))
                .collect();
            tracing::info!("  Cache: redis {}", servers.join(", "));
        } else {
            tracing::info!("  Cache: in-process");
        }
        tracing::info!("  Cache TTL: {}s", self.cache_ttl_seconds);

        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Log format: {}", self.log_format);
    }
}

/// Reads `name` from the environment, falling back to the secret files
/// `<secrets_dir>/<lowercase name>` and its legacy alias. Secret contents are
/// trimmed.
fn lookup(secrets_dir: &Path, name: &str) -> Option<String> {
    if let Ok(value) = env::var(name) {
        return Some(value);
    }

    let alias = SECRET_ALIASES
        .iter()
        .find(|(var, _)| *var == name)
        .map(|(_, alias)| alias.to_string());

    std::iter::once(name.to_ascii_lowercase())
        .chain(alias)
        .find_map(|file| fs::read_to_string(secrets_dir.join(file)).ok())
        .map(|s| s.trim().to_string())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Splits a comma-separated server list. Bare `host:port` entries get the
/// `redis://` scheme.
fn parse_server_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            if entry.contains("://") {
                entry.to_string()
            } else {
                format!("redis://{}", entry)
            }
        })
        .collect()
}

fn parse_or<T>(secrets_dir: &Path, name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(secrets_dir, name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", name, raw)),
        None => Ok(default),
    }
}

/// Masks sensitive information in connection strings for logging.
///
/// Replaces password with `***` in URLs like:
/// - `redis://:password@host:port/db` → `redis://:***@host:port/db`
fn mask_connection_string(url: &str) -> String {
    if let Some(start) = url.find("://") {
        let scheme_end = start + 3;
        let rest = &url[scheme_end..];

        if let Some(at_pos) = rest.find('@') {
            let credentials = &rest[..at_pos];
            let host_part = &rest[at_pos..];

            if let Some(colon_pos) = credentials.rfind(':') {
                let username = &credentials[..colon_pos];
                return format!("{}://{}:***{}", &url[..start], username, host_part);
            }
        }
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "LISTEN",
        "CGX_AUTH_TOKEN",
        "CGX_USERNAME",
        "CGX_PASSWORD",
        "CGX_SSL_VERIFY",
        "REDIS_URL",
        "REDIS_HOST",
        "REDIS_PORT",
        "REDIS_PASSWORD",
        "REDIS_DB",
        "CACHE_TTL_SECONDS",
        "LOGIN_REFRESH_SECONDS",
        "ALWAYS_PRETTY",
        "DEBUG",
        "RUST_LOG",
    ];

    fn clear_env() {
        // SAFETY: Tests touching the environment run serially via #[serial]
        unsafe {
            for var in VARS {
                env::remove_var(var);
            }
        }
    }

    fn empty_secrets() -> std::path::PathBuf {
        env::temp_dir().join("topology-gateway-no-secrets")
    }

    fn secrets_dir(name: &str) -> std::path::PathBuf {
        let dir = env::temp_dir().join(format!(
            "topology-gateway-{}-{}",
            name,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn valid_config() -> Config {
        Config {
            listen_addr: "0.0.0.0:8080".to_string(),
            controller_url: DEFAULT_CONTROLLER.to_string(),
            ssl_verify: true,
            auth_token: Some("token".to_string()),
            username: None,
            password: None,
            redis_urls: Vec::new(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            cache_ttl_seconds: 300,
            login_refresh_seconds: 25_200,
            login_max_attempts: 5,
            login_backoff_ms: 500,
            login_max_backoff_ms: 10_000,
            login_timeout_seconds: 60,
            backend_timeout_seconds: 30,
            always_pretty: true,
        }
    }

    #[test]
    fn test_mask_connection_string() {
        assert_eq!(
            mask_connection_string("redis://:password@localhost:6379/0"),
            "redis://:***@localhost:6379/0"
        );

        assert_eq!(
            mask_connection_string("redis://localhost:6379/0"),
            "redis://localhost:6379/0"
        );
    }

    #[test]
    fn test_parse_server_list() {
        assert_eq!(
            parse_server_list("cache-a:6379, redis://cache-b:6380/1,,"),
            vec!["redis://cache-a:6379", "redis://cache-b:6380/1"]
        );
        assert!(parse_server_list(" , ").is_empty());

        let mut config = valid_config();
        config.set_redis_servers("cache-a:6379");
        assert_eq!(config.redis_urls, vec!["redis://cache-a:6379"]);
        assert!(config.is_cache_distributed());
    }

    #[test]
    fn test_config_validation() {
        let mut config = valid_config();
        assert!(config.validate().is_ok());

        config.log_format = "invalid".to_string();
        assert!(config.validate().is_err());
        config.log_format = "json".to_string();
        assert!(config.validate().is_ok());

        config.listen_addr = "8080".to_string();
        assert!(config.validate().is_err());
        config.listen_addr = "0.0.0.0:8080".to_string();

        config.redis_urls = vec!["memcached://localhost:11211".to_string()];
        assert!(config.validate().is_err());
        config.redis_urls = vec![
            "redis://localhost:6379/0".to_string(),
            "rediss://cache:6380/0".to_string(),
        ];
        assert!(config.validate().is_ok());

        config.cache_ttl_seconds = 0;
        assert!(config.validate().is_err());
        config.cache_ttl_seconds = 300;

        config.login_max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credential_modes_are_exclusive() {
        let mut config = valid_config();

        config.username = Some("ops@example.com".to_string());
        config.password = Some("secret".to_string());
        assert!(config.validate().is_err());

        config.auth_token = None;
        assert!(config.validate().is_ok());
        assert!(config.login_credentials().is_some());

        config.password = None;
        assert!(config.validate().is_err());

        config.username = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_intervals_are_independent() {
        let mut config = valid_config();
        config.cache_ttl_seconds = 60;
        config.login_refresh_seconds = 7200;

        assert_eq!(config.resolver_settings().cache_ttl, Duration::from_secs(60));
        assert_eq!(
            config.login_policy().refresh_interval,
            Duration::from_secs(7200)
        );
    }

    #[test]
    fn test_debug_hides_secrets() {
        let mut config = valid_config();
        config.password = Some("hunter2".to_string());
        config.redis_urls = vec!["redis://:pw@localhost:6379/0".to_string()];

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("\"token\""));
        assert!(!rendered.contains(":pw@"));
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();

        let config = Config::from_sources(&empty_secrets()).unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.cache_ttl_seconds, 300);
        assert_eq!(config.login_refresh_seconds, 25_200);
        assert_eq!(config.log_level, "info");
        assert!(config.always_pretty);
        assert!(config.ssl_verify);
        assert!(!config.is_cache_distributed());
    }

    #[test]
    #[serial]
    fn test_ssl_verify_and_debug_flags() {
        clear_env();
        // SAFETY: Tests are run serially due to #[serial]
        unsafe {
            env::set_var("CGX_SSL_VERIFY", "false");
            env::set_var("DEBUG", "true");
        }

        let config = Config::from_sources(&empty_secrets()).unwrap();
        assert!(!config.ssl_verify);
        assert_eq!(config.log_level, "debug");

        // An explicit log level wins over DEBUG.
        unsafe {
            env::set_var("RUST_LOG", "warn");
        }
        let config = Config::from_sources(&empty_secrets()).unwrap();
        assert_eq!(config.log_level, "warn");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_number_is_reported() {
        clear_env();
        // SAFETY: Tests are run serially due to #[serial]
        unsafe {
            env::set_var("CACHE_TTL_SECONDS", "five minutes");
        }

        let err = Config::from_sources(&empty_secrets()).unwrap_err();
        assert!(err.to_string().contains("CACHE_TTL_SECONDS"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_secret_file_fallback() {
        clear_env();

        let dir = secrets_dir("secrets");
        fs::write(dir.join("cgx_auth_token"), "from-secret\n").unwrap();

        let config = Config::from_sources(&dir).unwrap();
        assert_eq!(config.auth_token.as_deref(), Some("from-secret"));

        // Environment wins over the secret file.
        // SAFETY: Tests are run serially due to #[serial]
        unsafe {
            env::set_var("CGX_AUTH_TOKEN", "from-env");
        }
        let config = Config::from_sources(&dir).unwrap();
        assert_eq!(config.auth_token.as_deref(), Some("from-env"));

        clear_env();
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_legacy_secret_names() {
        clear_env();

        let dir = secrets_dir("legacy");
        fs::write(dir.join("cgx_memcached"), "cache-a:6379,cache-b:6379\n").unwrap();
        fs::write(dir.join("cgx_debug"), "True").unwrap();
        fs::write(dir.join("cgx_always_pretty"), "false").unwrap();

        let config = Config::from_sources(&dir).unwrap();
        assert_eq!(
            config.redis_urls,
            vec!["redis://cache-a:6379", "redis://cache-b:6379"]
        );
        assert_eq!(config.log_level, "debug");
        assert!(!config.always_pretty);

        // The lowercase variable name takes precedence over the alias.
        fs::write(dir.join("always_pretty"), "true").unwrap();
        let config = Config::from_sources(&dir).unwrap();
        assert!(config.always_pretty);

        clear_env();
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_load_redis_urls_from_components() {
        clear_env();
        // SAFETY: Tests are run serially due to #[serial], so no concurrent access
        unsafe {
            env::set_var("REDIS_HOST", "redis-host");
            env::set_var("REDIS_PORT", "6380");
            env::set_var("REDIS_DB", "1");
        }

        let urls = Config::load_redis_urls(&empty_secrets());
        assert_eq!(urls, vec!["redis://redis-host:6380/1"]);

        unsafe {
            env::set_var("REDIS_PASSWORD", "secret");
        }
        let urls = Config::load_redis_urls(&empty_secrets());
        assert_eq!(urls, vec!["redis://:secret@redis-host:6380/1"]);

        // Empty password is treated as no password
        unsafe {
            env::set_var("REDIS_PASSWORD", "");
        }
        let urls = Config::load_redis_urls(&empty_secrets());
        assert_eq!(urls, vec!["redis://redis-host:6380/1"]);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_redis_url_priority() {
        clear_env();
        // SAFETY: Tests are run serially
        unsafe {
            env::set_var("REDIS_URL", "redis://from-url:6379/0,from-list:6379");
            env::set_var("REDIS_HOST", "from-components");
        }

        let urls = Config::load_redis_urls(&empty_secrets());
        assert_eq!(urls, vec!["redis://from-url:6379/0", "redis://from-list:6379"]);

        clear_env();
    }
}
