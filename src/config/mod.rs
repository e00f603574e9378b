//! Configuration management
//!
//! This module handles loading and parsing configuration for the AutoStack storefront.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults. Missing
//! credentials are not an error: the CMS and the identity provider simply
//! report themselves as "not configured".

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Backend REST API configuration
    #[serde(default)]
    pub backend: BackendConfig,
    /// CMS delivery API configuration
    #[serde(default)]
    pub content: ContentConfig,
    /// Identity provider configuration
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Visitor session configuration
    #[serde(default)]
    pub session: SessionConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based sessions)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    /// Public URL of the storefront, used to build email-link callbacks
    #[serde(default = "default_site_url")]
    pub site_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            site_url: default_site_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_site_url() -> String {
    "http://localhost:3000".to_string()
}

/// Backend REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL every `/v1/api/...` endpoint is appended to
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// CMS delivery API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Stack API key
    #[serde(default)]
    pub api_key: String,
    /// Delivery token
    #[serde(default)]
    pub delivery_token: String,
    /// Publishing environment
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Region (us, eu, azure-na, azure-eu)
    #[serde(default = "default_region")]
    pub region: String,
    /// Explicit delivery host, overrides the region mapping
    #[serde(default)]
    pub base_url: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Serve the bundled sample catalog when the CMS is not configured
    #[serde(default)]
    pub sample_fallback: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            delivery_token: String::new(),
            environment: default_environment(),
            region: default_region(),
            base_url: None,
            timeout_seconds: default_timeout(),
            sample_fallback: false,
        }
    }
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_region() -> String {
    "us".to_string()
}

impl ContentConfig {
    /// Both the API key and the delivery token are required
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.delivery_token.trim().is_empty()
    }

    /// Delivery base URL for the configured region
    ///
    /// Unknown regions fall back to `us`.
    pub fn delivery_url(&self) -> String {
        if let Some(url) = &self.base_url {
            return url.trim_end_matches('/').to_string();
        }
        let host = match self.region.to_lowercase().as_str() {
            "eu" => "eu-cdn.contentstack.com",
            "azure-na" => "azure-na-cdn.contentstack.com",
            "azure-eu" => "azure-eu-cdn.contentstack.com",
            _ => "cdn.contentstack.io",
        };
        format!("https://{}", host)
    }
}

/// Identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Web API key of the identity project
    #[serde(default)]
    pub api_key: String,
    /// Auth domain
    #[serde(default)]
    pub auth_domain: String,
    /// Project id
    #[serde(default)]
    pub project_id: String,
    /// Identity Toolkit endpoint
    #[serde(default = "default_identity_url")]
    pub identity_url: String,
    /// Secure token endpoint (refresh)
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            auth_domain: String::new(),
            project_id: String::new(),
            identity_url: default_identity_url(),
            token_url: default_token_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_identity_url() -> String {
    "https://identitytoolkit.googleapis.com/v1".to_string()
}

fn default_token_url() -> String {
    "https://securetoken.googleapis.com/v1".to_string()
}

impl IdentityConfig {
    /// API key, auth domain and project id must all be present
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
            && !self.auth_domain.trim().is_empty()
            && !self.project_id.trim().is_empty()
    }
}

/// Visitor session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Idle time after which a visitor session is dropped (seconds)
    #[serde(default = "default_idle_seconds")]
    pub idle_seconds: u64,
    /// Maximum number of live visitor sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            idle_seconds: default_idle_seconds(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_cookie_name() -> String {
    "autostack_session".to_string()
}

fn default_idle_seconds() -> u64 {
    60 * 60 * 24
}

fn default_max_sessions() -> u64 {
    10_000
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - AUTOSTACK_SERVER_HOST / _PORT / _CORS_ORIGIN / _SITE_URL
    /// - AUTOSTACK_BACKEND_URL
    /// - AUTOSTACK_CONTENT_API_KEY / _DELIVERY_TOKEN / _ENVIRONMENT / _REGION / _SAMPLE_FALLBACK
    /// - AUTOSTACK_IDENTITY_API_KEY / _AUTH_DOMAIN / _PROJECT_ID
    /// - AUTOSTACK_SESSION_IDLE_SECONDS
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Server configuration
        if let Ok(host) = std::env::var("AUTOSTACK_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("AUTOSTACK_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("AUTOSTACK_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }
        if let Ok(site_url) = std::env::var("AUTOSTACK_SERVER_SITE_URL") {
            self.server.site_url = site_url;
        }

        // Backend configuration
        if let Ok(url) = std::env::var("AUTOSTACK_BACKEND_URL") {
            self.backend.base_url = url;
        }

        // Content configuration
        if let Ok(api_key) = std::env::var("AUTOSTACK_CONTENT_API_KEY") {
            self.content.api_key = api_key;
        }
        if let Ok(token) = std::env::var("AUTOSTACK_CONTENT_DELIVERY_TOKEN") {
            self.content.delivery_token = token;
        }
        if let Ok(environment) = std::env::var("AUTOSTACK_CONTENT_ENVIRONMENT") {
            self.content.environment = environment;
        }
        if let Ok(region) = std::env::var("AUTOSTACK_CONTENT_REGION") {
            self.content.region = region;
        }
        if let Ok(flag) = std::env::var("AUTOSTACK_CONTENT_SAMPLE_FALLBACK") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.content.sample_fallback = true,
                "0" | "false" | "no" => self.content.sample_fallback = false,
                _ => {} // Ignore invalid values
            }
        }

        // Identity configuration
        if let Ok(api_key) = std::env::var("AUTOSTACK_IDENTITY_API_KEY") {
            self.identity.api_key = api_key;
        }
        if let Ok(domain) = std::env::var("AUTOSTACK_IDENTITY_AUTH_DOMAIN") {
            self.identity.auth_domain = domain;
        }
        if let Ok(project) = std::env::var("AUTOSTACK_IDENTITY_PROJECT_ID") {
            self.identity.project_id = project;
        }

        // Session configuration
        if let Ok(idle) = std::env::var("AUTOSTACK_SESSION_IDLE_SECONDS") {
            if let Ok(idle) = idle.parse::<u64>() {
                self.session.idle_seconds = idle;
            }
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "AUTOSTACK_SERVER_HOST",
    "AUTOSTACK_SERVER_PORT",
    "AUTOSTACK_SERVER_CORS_ORIGIN",
    "AUTOSTACK_SERVER_SITE_URL",
    "AUTOSTACK_BACKEND_URL",
    "AUTOSTACK_CONTENT_API_KEY",
    "AUTOSTACK_CONTENT_DELIVERY_TOKEN",
    "AUTOSTACK_CONTENT_ENVIRONMENT",
    "AUTOSTACK_CONTENT_REGION",
    "AUTOSTACK_CONTENT_SAMPLE_FALLBACK",
    "AUTOSTACK_IDENTITY_API_KEY",
    "AUTOSTACK_IDENTITY_AUTH_DOMAIN",
    "AUTOSTACK_IDENTITY_PROJECT_ID",
    "AUTOSTACK_SESSION_IDLE_SECONDS",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_autostack_config.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.backend.base_url, "http://localhost:8080");
        assert_eq!(config.content.environment, "development");
        assert_eq!(config.content.region, "us");
        assert!(!config.content.sample_fallback);
        assert_eq!(config.session.cookie_name, "autostack_session");
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "   \n").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(!config.content.is_configured());
        assert!(!config.identity.is_configured());
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "content:\n  api_key: \"blt123\"\n  delivery_token: \"cs456\"\n").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert!(config.content.is_configured());
        assert_eq!(config.content.environment, "development");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.backend.timeout_seconds, 30);
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
server:
  host: "127.0.0.1"
  port: 4000
  cors_origin: "https://shop.example.com"
  site_url: "https://shop.example.com"
backend:
  base_url: "https://api.example.com"
  timeout_seconds: 10
content:
  api_key: "blt123"
  delivery_token: "cs456"
  environment: "production"
  region: "eu"
  sample_fallback: true
identity:
  api_key: "AIza"
  auth_domain: "shop.firebaseapp.com"
  project_id: "shop"
session:
  cookie_name: "sid"
  idle_seconds: 600
  max_sessions: 50
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.site_url, "https://shop.example.com");
        assert_eq!(config.backend.base_url, "https://api.example.com");
        assert_eq!(config.content.delivery_url(), "https://eu-cdn.contentstack.com");
        assert!(config.content.sample_fallback);
        assert!(config.identity.is_configured());
        assert_eq!(config.session.cookie_name, "sid");
        assert_eq!(config.session.max_sessions, 50);
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: not_a_number\n").unwrap();

        let err = Config::load(file.path()).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
        assert!(err.contains("line"));
    }

    #[test]
    fn test_delivery_url_region_mapping() {
        let mut content = ContentConfig::default();
        assert_eq!(content.delivery_url(), "https://cdn.contentstack.io");

        content.region = "AZURE-NA".to_string();
        assert_eq!(content.delivery_url(), "https://azure-na-cdn.contentstack.com");

        content.region = "azure-eu".to_string();
        assert_eq!(content.delivery_url(), "https://azure-eu-cdn.contentstack.com");

        content.region = "mars".to_string();
        assert_eq!(content.delivery_url(), "https://cdn.contentstack.io");

        content.base_url = Some("http://127.0.0.1:9000/".to_string());
        assert_eq!(content.delivery_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_content_whitespace_credentials_not_configured() {
        let content = ContentConfig {
            api_key: "  ".to_string(),
            delivery_token: "token".to_string(),
            ..ContentConfig::default()
        };
        assert!(!content.is_configured());
    }

    #[test]
    fn test_env_override_server_and_backend() {
        let _guard = lock_env();
        clear_env();

        std::env::set_var("AUTOSTACK_SERVER_PORT", "9090");
        std::env::set_var("AUTOSTACK_SERVER_SITE_URL", "https://cars.example.com");
        std::env::set_var("AUTOSTACK_BACKEND_URL", "https://backend.example.com");

        let config =
            Config::load_with_env(std::path::Path::new("nonexistent_autostack_config.yml")).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.site_url, "https://cars.example.com");
        assert_eq!(config.backend.base_url, "https://backend.example.com");

        clear_env();
    }

    #[test]
    fn test_env_override_content_and_identity() {
        let _guard = lock_env();
        clear_env();

        std::env::set_var("AUTOSTACK_CONTENT_API_KEY", "blt");
        std::env::set_var("AUTOSTACK_CONTENT_DELIVERY_TOKEN", "cs");
        std::env::set_var("AUTOSTACK_CONTENT_SAMPLE_FALLBACK", "yes");
        std::env::set_var("AUTOSTACK_IDENTITY_API_KEY", "key");
        std::env::set_var("AUTOSTACK_IDENTITY_AUTH_DOMAIN", "domain");
        std::env::set_var("AUTOSTACK_IDENTITY_PROJECT_ID", "project");

        let config =
            Config::load_with_env(std::path::Path::new("nonexistent_autostack_config.yml")).unwrap();
        assert!(config.content.is_configured());
        assert!(config.content.sample_fallback);
        assert!(config.identity.is_configured());

        clear_env();
    }

    #[test]
    fn test_env_override_invalid_values_ignored() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 4000\nsession:\n  idle_seconds: 60\n").unwrap();

        std::env::set_var("AUTOSTACK_SERVER_PORT", "not_a_port");
        std::env::set_var("AUTOSTACK_SESSION_IDLE_SECONDS", "-5");
        std::env::set_var("AUTOSTACK_CONTENT_SAMPLE_FALLBACK", "maybe");

        let config = Config::load_with_env(file.path()).unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.session.idle_seconds, 60);
        assert!(!config.content.sample_fallback);

        clear_env();
    }
}
