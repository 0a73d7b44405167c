//! Shared constants for Tollgate components.

/// Default HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8787";

/// Default upstream origin
pub const DEFAULT_UPSTREAM_URL: &str = "http://127.0.0.1:8080";

/// Default inbound request timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Path that accepts verification submissions
pub const DEFAULT_VERIFY_PATH: &str = "/verify";

/// Health endpoint, served outside the gate
pub const DEFAULT_HEALTH_PATH: &str = "/_tollgate/health";

/// Trust cookie defaults
pub mod trust_cookie {
    /// Cookie name
    pub const NAME: &str = "verified";

    /// Fixed sentinel value issued in sentinel mode
    pub const SENTINEL: &str = "gruyère";

    /// Client-side lifetime (1 hour)
    pub const MAX_AGE_SECS: u64 = 3600;
}

/// Turnstile provider defaults
pub mod turnstile {
    /// Server-to-server token verification endpoint
    pub const SITEVERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

    /// Client-side widget script
    pub const WIDGET_SCRIPT_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/api.js";

    /// JSON field carrying the widget token in a submission body
    pub const TOKEN_FIELD: &str = "cf-turnstile-response";

    /// Provider call timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
}

/// HTTP header names
pub mod headers {
    /// Client IP as reported by Cloudflare's edge
    pub const CF_CONNECTING_IP: &str = "CF-Connecting-IP";

    /// Standard proxy chain header
    pub const X_FORWARDED_FOR: &str = "X-Forwarded-For";
}
