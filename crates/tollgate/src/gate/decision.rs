//! Three-state gate decision.

use axum::http::{HeaderMap, Method, Uri};

use super::{ClientContext, TrustCookieCodec};

/// What the gate does with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Caller holds a valid trust cookie; pass through to the origin
    Forward,
    /// Widget token submission; exchange it with the provider
    HandleSubmission,
    /// No trust established; serve the challenge page
    Challenge { original_path: String },
}

/// Decision function plus the trust cookie codec it consults
#[derive(Clone)]
pub struct Gate {
    verify_path: String,
    codec: TrustCookieCodec,
}

impl Gate {
    pub fn new(verify_path: impl Into<String>, codec: TrustCookieCodec) -> Self {
        Self {
            verify_path: verify_path.into(),
            codec,
        }
    }

    pub fn verify_path(&self) -> &str {
        &self.verify_path
    }

    pub fn codec(&self) -> &TrustCookieCodec {
        &self.codec
    }

    /// Classify a request. Pure apart from the clock read in signed mode.
    pub fn decide(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        client: &ClientContext,
    ) -> GateDecision {
        if *method == Method::POST && uri.path() == self.verify_path {
            return GateDecision::HandleSubmission;
        }

        if self.codec.is_trusted(headers, client.ip) {
            GateDecision::Forward
        } else {
            GateDecision::Challenge {
                original_path: original_path(uri),
            }
        }
    }
}

/// Same-origin redirect target for after verification.
///
/// Keeps the query string. Protocol-relative forms (`//host`, `/\host`)
/// collapse to `/` so the redirect cannot leave the origin.
pub fn original_path(uri: &Uri) -> String {
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    if !path.starts_with('/') || path.starts_with("//") || path.starts_with("/\\") {
        return "/".to_string();
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header::COOKIE};

    fn gate() -> Gate {
        Gate::new("/verify", TrustCookieCodec::sentinel("verified", "gruyère", 3600))
    }

    fn trusted() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_bytes("verified=gruyère".as_bytes()).unwrap());
        headers
    }

    fn decide(method: Method, uri: &str, headers: &HeaderMap) -> GateDecision {
        gate().decide(&method, &uri.parse().unwrap(), headers, &ClientContext::default())
    }

    #[test]
    fn test_submission_takes_priority() {
        assert_eq!(decide(Method::POST, "/verify", &HeaderMap::new()), GateDecision::HandleSubmission);
        assert_eq!(decide(Method::POST, "/verify", &trusted()), GateDecision::HandleSubmission);
        assert_eq!(
            decide(Method::POST, "/verify?x=1", &HeaderMap::new()),
            GateDecision::HandleSubmission
        );
    }

    #[test]
    fn test_non_post_verify_is_gated() {
        assert_eq!(
            decide(Method::GET, "/verify", &HeaderMap::new()),
            GateDecision::Challenge { original_path: "/verify".into() }
        );
        assert_eq!(decide(Method::GET, "/verify", &trusted()), GateDecision::Forward);
        assert_eq!(
            decide(Method::POST, "/verify/extra", &HeaderMap::new()),
            GateDecision::Challenge { original_path: "/verify/extra".into() }
        );
    }

    #[test]
    fn test_trusted_requests_forward_for_any_method() {
        for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
            assert_eq!(decide(method, "/account/settings", &trusted()), GateDecision::Forward);
        }
    }

    #[test]
    fn test_untrusted_requests_are_challenged() {
        for method in [Method::GET, Method::POST, Method::PATCH] {
            assert_eq!(
                decide(method, "/dashboard?tab=2", &HeaderMap::new()),
                GateDecision::Challenge { original_path: "/dashboard?tab=2".into() }
            );
        }
    }

    #[test]
    fn test_original_path_stays_on_origin() {
        assert_eq!(original_path(&"/".parse().unwrap()), "/");
        assert_eq!(original_path(&"/a/b?c=d".parse().unwrap()), "/a/b?c=d");
        assert_eq!(original_path(&"//evil.example/x".parse().unwrap()), "/");
        assert_eq!(original_path(&"http://origin.example/p?q=1".parse().unwrap()), "/p?q=1");
        assert_eq!(original_path(&"*".parse().unwrap()), "/");
    }
}
