//! Turnstile siteverify client.
//!
//! One form-encoded POST per submitted token, no retry. Only the boolean
//! `success` field decides the outcome.

use anyhow::{Context, Result};
use std::net::IpAddr;
use std::time::Duration;

use crate::config::TurnstileConfig;
use tollgate_common::{GateError, SiteverifyResponse, VerificationResult};

/// Server-to-server verification client
pub struct TurnstileClient {
    http: reqwest::Client,
    verify_url: String,
    secret_key: String,
    forward_client_ip: bool,
}

impl TurnstileClient {
    pub fn new(config: &TurnstileConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("tollgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build verification HTTP client")?;

        Ok(Self {
            http,
            verify_url: config.verify_url.clone(),
            secret_key: config.secret_key.clone(),
            forward_client_ip: config.forward_client_ip,
        })
    }

    /// Exchange a widget token for a verdict.
    ///
    /// Transport failures and unparseable replies are errors; the caller
    /// decides whether those count as rejection.
    pub async fn verify(
        &self,
        token: &str,
        client_ip: Option<IpAddr>,
    ) -> Result<VerificationResult, GateError> {
        let mut form = vec![
            ("secret", self.secret_key.clone()),
            ("response", token.to_string()),
        ];
        if self.forward_client_ip {
            if let Some(ip) = client_ip {
                form.push(("remoteip", ip.to_string()));
            }
        }

        let response = self
            .http
            .post(&self.verify_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| GateError::Provider(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| GateError::Provider(format!("failed to read body: {}", e)))?;

        let reply: SiteverifyResponse = serde_json::from_slice(&body).map_err(|e| {
            GateError::Provider(format!("unparseable reply (HTTP {}): {}", status, e))
        })?;

        if !reply.success {
            tracing::debug!(
                error_codes = ?reply.error_codes,
                "Provider rejected token"
            );
        } else {
            tracing::debug!(
                hostname = ?reply.hostname,
                challenge_ts = ?reply.challenge_ts,
                action = ?reply.action,
                "Provider accepted token"
            );
        }

        Ok(reply.success.into())
    }
}
