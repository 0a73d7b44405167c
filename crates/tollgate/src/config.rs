//! Configuration management for Tollgate.

use anyhow::{Context, Result, bail, ensure};
use axum::http::Uri;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use tollgate_common::constants::{
    DEFAULT_HEALTH_PATH, DEFAULT_LISTEN_ADDR, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_UPSTREAM_URL,
    DEFAULT_VERIFY_PATH, trust_cookie, turnstile,
};

/// Environment variable prefix, e.g. `TOLLGATE_TURNSTILE__SECRET_KEY`
const ENV_PREFIX: &str = "TOLLGATE";

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Origin that trusted requests are forwarded to
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// Inbound request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Forward the client's Host header instead of the upstream authority
    #[serde(default = "default_true")]
    pub preserve_host: bool,

    /// Health endpoint, never gated
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Verification provider configuration
    #[serde(default)]
    pub turnstile: TurnstileConfig,

    /// Trust cookie configuration
    #[serde(default)]
    pub cookie: CookieConfig,

    /// Challenge page configuration
    #[serde(default)]
    pub challenge: ChallengeConfig,
}

/// What to do when the provider cannot be reached or answers garbage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderFailurePolicy {
    /// Treat as a rejected token (401)
    #[default]
    Reject,
    /// Surface as a gateway error (502)
    Error,
}

/// Turnstile-specific configuration
#[derive(Clone, Deserialize)]
pub struct TurnstileConfig {
    /// Public site key, embedded in the challenge page
    #[serde(default)]
    pub site_key: String,

    /// Server-held secret key, never sent to clients
    #[serde(default)]
    pub secret_key: String,

    /// Siteverify endpoint
    #[serde(default = "default_verify_url")]
    pub verify_url: String,

    /// Provider call timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,

    /// Send the observed client IP as `remoteip`
    #[serde(default)]
    pub forward_client_ip: bool,

    #[serde(default)]
    pub on_failure: ProviderFailurePolicy,
}

impl Default for TurnstileConfig {
    fn default() -> Self {
        Self {
            site_key: String::new(),
            secret_key: String::new(),
            verify_url: default_verify_url(),
            timeout_secs: default_provider_timeout(),
            forward_client_ip: false,
            on_failure: ProviderFailurePolicy::default(),
        }
    }
}

impl fmt::Debug for TurnstileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnstileConfig")
            .field("site_key", &self.site_key)
            .field("secret_key", &"<redacted>")
            .field("verify_url", &self.verify_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("forward_client_ip", &self.forward_client_ip)
            .field("on_failure", &self.on_failure)
            .finish()
    }
}

/// How the trust cookie value is produced and checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieMode {
    /// Fixed sentinel value; presence is proof
    #[default]
    Sentinel,
    /// HMAC over issuance time (and optionally client IP)
    Signed,
}

/// Trust cookie configuration
#[derive(Clone, Deserialize)]
pub struct CookieConfig {
    #[serde(default = "default_cookie_name")]
    pub name: String,

    /// Sentinel value (sentinel mode only)
    #[serde(default = "default_cookie_value")]
    pub value: String,

    /// Client-side lifetime; also the server-side limit in signed mode
    #[serde(default = "default_cookie_max_age")]
    pub max_age_secs: u64,

    #[serde(default)]
    pub mode: CookieMode,

    /// Base64url HMAC key (signed mode). Ephemeral if unset.
    #[serde(default)]
    pub signing_key: Option<String>,

    /// Bind the client IP into signed cookies
    #[serde(default)]
    pub bind_client_ip: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            value: default_cookie_value(),
            max_age_secs: default_cookie_max_age(),
            mode: CookieMode::default(),
            signing_key: None,
            bind_client_ip: false,
        }
    }
}

impl fmt::Debug for CookieConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieConfig")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("max_age_secs", &self.max_age_secs)
            .field("mode", &self.mode)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .field("bind_client_ip", &self.bind_client_ip)
            .finish()
    }
}

/// Challenge page configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeConfig {
    /// Path that accepts POSTed widget tokens
    #[serde(default = "default_verify_path")]
    pub verify_path: String,

    /// Heading shown above the widget
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            verify_path: default_verify_path(),
            title: default_title(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_upstream_url() -> String { DEFAULT_UPSTREAM_URL.to_string() }
fn default_request_timeout() -> u64 { DEFAULT_REQUEST_TIMEOUT_SECS }
fn default_true() -> bool { true }
fn default_health_path() -> String { DEFAULT_HEALTH_PATH.to_string() }
fn default_verify_url() -> String { turnstile::SITEVERIFY_URL.to_string() }
fn default_provider_timeout() -> u64 { turnstile::DEFAULT_TIMEOUT_SECS }
fn default_cookie_name() -> String { trust_cookie::NAME.to_string() }
fn default_cookie_value() -> String { trust_cookie::SENTINEL.to_string() }
fn default_cookie_max_age() -> u64 { trust_cookie::MAX_AGE_SECS } // 1 hour
fn default_verify_path() -> String { DEFAULT_VERIFY_PATH.to_string() }
fn default_title() -> String { "verification".to_string() }

impl AppConfig {
    /// Load configuration from file and environment, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut builder = config::Config::builder();

        if Path::new(config_path).exists() {
            builder = builder.add_source(config::File::with_name(config_path));
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults and environment");
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to load configuration")?;

        let mut config: Self = settings
            .try_deserialize()
            .context("Failed to parse config")?;

        // Apply CLI overrides
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }
        if let Some(ref upstream) = args.upstream {
            config.upstream_url = upstream.clone();
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the gate cannot run with
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.turnstile.site_key.is_empty(), "turnstile.site_key is required");
        ensure!(!self.turnstile.secret_key.is_empty(), "turnstile.secret_key is required");
        ensure!(self.cookie.max_age_secs > 0, "cookie.max_age_secs must be positive");
        ensure!(!self.cookie.name.is_empty(), "cookie.name must not be empty");
        ensure!(
            !self.cookie.name.contains(['=', ';', ' ']),
            "cookie.name must not contain '=', ';' or spaces"
        );
        ensure!(
            !self.cookie.value.contains([';', ' ']),
            "cookie.value must not contain ';' or spaces"
        );
        ensure!(
            self.challenge.verify_path.starts_with('/'),
            "challenge.verify_path must start with '/'"
        );
        ensure!(self.health_path.starts_with('/'), "health_path must start with '/'");
        ensure!(
            is_literal_route(&self.health_path),
            "health_path must be a literal path (no '{{', '}}', or segments starting with ':' or '*')"
        );
        ensure!(
            self.health_path != self.challenge.verify_path,
            "health_path and challenge.verify_path must differ"
        );

        self.upstream_uri()?;
        Ok(())
    }

    /// Parsed upstream origin
    pub fn upstream_uri(&self) -> Result<Uri> {
        let uri: Uri = self
            .upstream_url
            .parse()
            .with_context(|| format!("Invalid upstream_url: {}", self.upstream_url))?;

        if uri.scheme_str() != Some("http") {
            bail!("upstream_url must use http:// (got {})", self.upstream_url);
        }
        if uri.authority().is_none() {
            bail!("upstream_url has no host: {}", self.upstream_url);
        }
        Ok(uri)
    }
}

/// Whether the router would treat `path` as a plain literal route.
fn is_literal_route(path: &str) -> bool {
    !path.contains(['{', '}'])
        && path
            .split('/')
            .all(|segment| !segment.starts_with([':', '*']))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            upstream_url: default_upstream_url(),
            request_timeout_secs: default_request_timeout(),
            preserve_host: true,
            health_path: default_health_path(),
            turnstile: TurnstileConfig::default(),
            cookie: CookieConfig::default(),
            challenge: ChallengeConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.turnstile.site_key = "1x00000000000000000000AA".into();
        config.turnstile.secret_key = "1x0000000000000000000000000000000AA".into();
        config
    }

    #[test]
    fn test_defaults_match_wire_contract() {
        let config = AppConfig::default();
        assert_eq!(config.cookie.name, "verified");
        assert_eq!(config.cookie.value, "gruyère");
        assert_eq!(config.cookie.max_age_secs, 3600);
        assert_eq!(config.cookie.mode, CookieMode::Sentinel);
        assert_eq!(config.challenge.verify_path, "/verify");
        assert_eq!(config.turnstile.on_failure, ProviderFailurePolicy::Reject);
    }

    #[test]
    fn test_validate_requires_keys() {
        assert!(AppConfig::default().validate().is_err());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_upstream() {
        let mut config = valid();
        config.upstream_url = "https://origin.example".into();
        assert!(config.validate().is_err());

        config.upstream_url = "/relative".into();
        assert!(config.validate().is_err());

        config.upstream_url = "http://10.0.0.5:3000".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_paths() {
        let mut config = valid();
        config.challenge.verify_path = "verify".into();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.health_path = "/verify".into();
        assert!(config.validate().is_err());

        for health_path in ["/_tollgate/{id}", "/:health", "/status/*rest", "/health}"] {
            let mut config = valid();
            config.health_path = health_path.into();
            assert!(config.validate().is_err(), "{health_path}");
        }

        let mut config = valid();
        config.health_path = "/status/health.json".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = valid();
        config.cookie.signing_key = Some("c2VjcmV0LXNpZ25pbmcta2V5".into());
        let dump = format!("{:?}", config);
        assert!(!dump.contains("1x0000000000000000000000000000000AA"));
        assert!(!dump.contains("c2VjcmV0LXNpZ25pbmcta2V5"));
        assert!(dump.contains("1x00000000000000000000AA"));
    }

    #[test]
    fn test_deserialize_toml_sections() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                upstream_url = "http://127.0.0.1:9000"

                [turnstile]
                site_key = "site"
                secret_key = "secret"
                on_failure = "error"

                [cookie]
                mode = "signed"
                bind_client_ip = true
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: AppConfig = settings.try_deserialize().unwrap();
        assert_eq!(config.upstream_url, "http://127.0.0.1:9000");
        assert_eq!(config.turnstile.on_failure, ProviderFailurePolicy::Error);
        assert_eq!(config.cookie.mode, CookieMode::Signed);
        assert!(config.cookie.bind_client_ip);
        assert_eq!(config.cookie.max_age_secs, 3600);
        assert!(config.validate().is_ok());
    }
}
