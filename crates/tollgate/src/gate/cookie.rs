//! Trust cookie codec.
//!
//! Two value schemes share one wire shape:
//!
//! - **Sentinel**: a fixed value (`verified=gruyère`). Presence of the exact
//!   pair is the whole proof. Expiry lives in the browser's cookie jar.
//! - **Signed**: `<issued_at>.<mac>` where `mac` is
//!   `base64url(HMAC-SHA256(key, "name|issued_at|ip"))`. Expiry is also
//!   checked server-side, and the client IP is bound in when configured.
//!
//! Attributes are identical in both modes:
//! `HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=<max_age>`.

use anyhow::{Context, Result, anyhow, ensure};
use axum::http::{HeaderMap, HeaderValue, header::COOKIE};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::net::IpAddr;

use crate::config::{CookieConfig, CookieMode};
use tollgate_common::GateError;

type HmacSha256 = Hmac<Sha256>;

/// Minimum signing key length in bytes
const MIN_KEY_LEN: usize = 32;

/// Tolerated clock skew for signed cookies issued "in the future"
const MAX_CLOCK_SKEW_SECS: i64 = 60;

#[derive(Clone)]
enum ValueScheme {
    Sentinel(String),
    Signed {
        mac: HmacSha256,
        bind_client_ip: bool,
    },
}

/// Encodes `Set-Cookie` values and evaluates `Cookie` headers.
#[derive(Clone)]
pub struct TrustCookieCodec {
    name: String,
    max_age_secs: u64,
    scheme: ValueScheme,
}

impl TrustCookieCodec {
    /// Sentinel-mode codec
    pub fn sentinel(name: impl Into<String>, value: impl Into<String>, max_age_secs: u64) -> Self {
        Self {
            name: name.into(),
            max_age_secs,
            scheme: ValueScheme::Sentinel(value.into()),
        }
    }

    /// Signed-mode codec
    pub fn signed(
        name: impl Into<String>,
        key: &[u8],
        max_age_secs: u64,
        bind_client_ip: bool,
    ) -> Result<Self> {
        ensure!(
            key.len() >= MIN_KEY_LEN,
            "cookie signing key must be at least {} bytes (got {})",
            MIN_KEY_LEN,
            key.len()
        );
        let mac = HmacSha256::new_from_slice(key).map_err(|_| anyhow!("Invalid cookie signing key"))?;

        Ok(Self {
            name: name.into(),
            max_age_secs,
            scheme: ValueScheme::Signed {
                mac,
                bind_client_ip,
            },
        })
    }

    /// Build a codec from configuration.
    ///
    /// Signed mode without a configured key gets a random per-process key.
    pub fn from_config(config: &CookieConfig) -> Result<Self> {
        match config.mode {
            CookieMode::Sentinel => Ok(Self::sentinel(
                &config.name,
                &config.value,
                config.max_age_secs,
            )),
            CookieMode::Signed => {
                let key = match config.signing_key.as_deref() {
                    Some(encoded) if !encoded.is_empty() => URL_SAFE_NO_PAD
                        .decode(encoded.trim_end_matches('='))
                        .context("cookie.signing_key is not valid base64url")?,
                    _ => {
                        tracing::warn!(
                            "Using ephemeral cookie signing key (trust cookies will not survive restart)"
                        );
                        generate_key()
                    }
                };
                Self::signed(
                    &config.name,
                    &key,
                    config.max_age_secs,
                    config.bind_client_ip,
                )
            }
        }
    }

    pub fn max_age_secs(&self) -> u64 {
        self.max_age_secs
    }

    /// `Set-Cookie` value for a freshly accepted verification
    pub fn encode(&self, client_ip: Option<IpAddr>) -> Result<HeaderValue, GateError> {
        self.encode_at(client_ip, chrono::Utc::now().timestamp())
    }

    fn encode_at(&self, client_ip: Option<IpAddr>, now: i64) -> Result<HeaderValue, GateError> {
        let value = match &self.scheme {
            ValueScheme::Sentinel(sentinel) => sentinel.clone(),
            ValueScheme::Signed {
                mac,
                bind_client_ip,
            } => {
                let ip = match (*bind_client_ip, client_ip) {
                    (false, _) => None,
                    (true, Some(ip)) => Some(ip),
                    // A bound cookie without an address could never validate.
                    (true, None) => {
                        return Err(GateError::Internal(
                            "client address unknown for IP-bound trust cookie".into(),
                        ));
                    }
                };
                let tag = self.sign(mac, now, ip);
                format!("{}.{}", now, URL_SAFE_NO_PAD.encode(tag))
            }
        };

        let cookie = format!(
            "{}={}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={}",
            self.name, value, self.max_age_secs
        );

        // Sentinel values may be non-ASCII UTF-8; HeaderValue accepts obs-text bytes.
        HeaderValue::from_bytes(cookie.as_bytes())
            .map_err(|e| GateError::Internal(format!("unencodable trust cookie: {}", e)))
    }

    /// Whether the request carries a valid trust marker
    pub fn is_trusted(&self, headers: &HeaderMap, client_ip: Option<IpAddr>) -> bool {
        self.is_trusted_at(headers, client_ip, chrono::Utc::now().timestamp())
    }

    fn is_trusted_at(&self, headers: &HeaderMap, client_ip: Option<IpAddr>, now: i64) -> bool {
        cookie_pairs(headers)
            .filter(|(name, _)| *name == self.name)
            .any(|(_, value)| self.value_is_valid(value, client_ip, now))
    }

    fn value_is_valid(&self, value: &str, client_ip: Option<IpAddr>, now: i64) -> bool {
        match &self.scheme {
            ValueScheme::Sentinel(sentinel) => value == sentinel,
            ValueScheme::Signed {
                mac,
                bind_client_ip,
            } => {
                let Some((issued_at, tag)) = value.split_once('.') else {
                    return false;
                };
                let Ok(issued_at) = issued_at.parse::<i64>() else {
                    return false;
                };
                let max_age = i64::try_from(self.max_age_secs).unwrap_or(i64::MAX);
                if issued_at > now + MAX_CLOCK_SKEW_SECS
                    || now >= issued_at.saturating_add(max_age)
                {
                    return false;
                }
                let Ok(tag) = URL_SAFE_NO_PAD.decode(tag) else {
                    return false;
                };

                let ip = if *bind_client_ip {
                    match client_ip {
                        Some(ip) => Some(ip),
                        // Bound cookies cannot be checked without an address.
                        None => return false,
                    }
                } else {
                    None
                };

                let mut mac = mac.clone();
                mac.update(&self.mac_input(issued_at, ip));
                mac.verify_slice(&tag).is_ok()
            }
        }
    }

    fn sign(&self, mac: &HmacSha256, issued_at: i64, ip: Option<IpAddr>) -> Vec<u8> {
        let mut mac = mac.clone();
        mac.update(&self.mac_input(issued_at, ip));
        mac.finalize().into_bytes().to_vec()
    }

    fn mac_input(&self, issued_at: i64, ip: Option<IpAddr>) -> Vec<u8> {
        let ip = ip.map(|ip| ip.to_string()).unwrap_or_else(|| "-".to_string());
        format!("{}|{}|{}", self.name, issued_at, ip).into_bytes()
    }
}

/// `name=value` pairs across every `Cookie` header.
///
/// Headers that are not valid UTF-8 and segments without `=` are skipped.
fn cookie_pairs(headers: &HeaderMap) -> impl Iterator<Item = (&str, &str)> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|raw| std::str::from_utf8(raw.as_bytes()).ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some((name.trim(), value.trim()))
        })
}

fn generate_key() -> Vec<u8> {
    use rand::Rng;

    let mut bytes = [0u8; MIN_KEY_LEN];
    rand::rng().fill(&mut bytes);
    bytes.to_vec()
}
