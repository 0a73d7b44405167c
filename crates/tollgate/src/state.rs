//! Application state and shared resources.

use anyhow::Result;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::gate::{Gate, TrustCookieCodec};
use crate::provider::TurnstileClient;
use crate::upstream::UpstreamClient;

/// Shared application state. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,

    /// Decision function and trust cookie codec
    pub gate: Arc<Gate>,

    /// Verification provider client
    pub provider: Arc<TurnstileClient>,

    /// Upstream origin client
    pub upstream: Arc<UpstreamClient>,
}

impl AppState {
    /// Build state from a validated configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        let codec = TrustCookieCodec::from_config(&config.cookie)?;
        let gate = Arc::new(Gate::new(config.challenge.verify_path.clone(), codec));
        let provider = Arc::new(TurnstileClient::new(&config.turnstile)?);
        let upstream = Arc::new(UpstreamClient::new(
            config.upstream_uri()?,
            config.preserve_host,
        ));

        Ok(Self {
            config: Arc::new(config),
            gate,
            provider,
            upstream,
        })
    }
}
