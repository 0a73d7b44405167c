//! Core types shared across Tollgate components.

use serde::{Deserialize, Serialize};

/// Outcome of a single token exchange with the verification provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationResult {
    Accepted,
    Rejected,
}

impl VerificationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl From<bool> for VerificationResult {
    fn from(success: bool) -> Self {
        if success { Self::Accepted } else { Self::Rejected }
    }
}

/// Body posted by the challenge page to the verify path.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    #[serde(rename = "cf-turnstile-response")]
    pub token: String,
}

impl Submission {
    /// Parse a raw submission body.
    ///
    /// Returns `None` for anything that does not carry a non-empty token;
    /// the caller treats that as a rejection.
    pub fn parse(body: &[u8]) -> Option<Self> {
        let submission: Self = serde_json::from_slice(body).ok()?;
        if submission.token.trim().is_empty() {
            return None;
        }
        Some(submission)
    }
}

/// JSON reply to a verification submission: `{"success": bool}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReply {
    pub success: bool,
}

impl From<VerificationResult> for SubmissionReply {
    fn from(result: VerificationResult) -> Self {
        Self {
            success: result.is_accepted(),
        }
    }
}

/// Siteverify response. Only `success` drives the outcome; the rest is
/// kept for logging.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteverifyResponse {
    pub success: bool,

    #[serde(default, rename = "error-codes")]
    pub error_codes: Vec<String>,

    #[serde(default)]
    pub hostname: Option<String>,

    #[serde(default)]
    pub challenge_ts: Option<String>,

    #[serde(default)]
    pub action: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_from_bool() {
        assert_eq!(VerificationResult::from(true), VerificationResult::Accepted);
        assert_eq!(VerificationResult::from(false), VerificationResult::Rejected);
        assert!(VerificationResult::Accepted.is_accepted());
    }

    #[test]
    fn test_submission_parse() {
        let ok = Submission::parse(br#"{"cf-turnstile-response":"XXXX.DUMMY.TOKEN"}"#).unwrap();
        assert_eq!(ok.token, "XXXX.DUMMY.TOKEN");

        assert!(Submission::parse(b"").is_none());
        assert!(Submission::parse(b"not json").is_none());
        assert!(Submission::parse(br#"{}"#).is_none());
        assert!(Submission::parse(br#"{"cf-turnstile-response":42}"#).is_none());
        assert!(Submission::parse(br#"{"cf-turnstile-response":"  "}"#).is_none());
    }

    #[test]
    fn test_reply_serialization() {
        let json = serde_json::to_string(&SubmissionReply::from(VerificationResult::Accepted)).unwrap();
        assert_eq!(json, r#"{"success":true}"#);
        let json = serde_json::to_string(&SubmissionReply::from(VerificationResult::Rejected)).unwrap();
        assert_eq!(json, r#"{"success":false}"#);
    }

    #[test]
    fn test_siteverify_ignores_extra_fields() {
        let body = r#"{
            "success": false,
            "error-codes": ["invalid-input-response"],
            "messages": [],
            "metadata": {"interactive": false}
        }"#;
        let parsed: SiteverifyResponse = serde_json::from_str(body).unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.error_codes, vec!["invalid-input-response"]);
        assert!(parsed.hostname.is_none());
    }
}
