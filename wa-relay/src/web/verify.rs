//! Subscription handshake verification.
//!
//! The platform confirms webhook ownership with a GET carrying `hub.mode`,
//! `hub.verify_token` and `hub.challenge`. The challenge is echoed back only
//! when the mode is `subscribe` and the token matches the configured secret.

use serde::Deserialize;
use tracing::{info, warn};

/// Mode value the platform sends when subscribing.
pub const SUBSCRIBE_MODE: &str = "subscribe";

/// Handshake query parameters. Any of them may be absent.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(default, rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(default, rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(default, rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Handshake outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Echo this challenge with 200.
    Verified(String),
    /// Respond 403 with an empty body.
    Rejected,
}

/// Decide a handshake against the configured secret.
pub fn verify_subscription(query: VerifyQuery, expected_token: &str) -> Verification {
    let mode_ok = query.mode.as_deref() == Some(SUBSCRIBE_MODE);
    let token_ok = query
        .verify_token
        .as_deref()
        .map(|token| constant_time_compare(token, expected_token))
        .unwrap_or(false);

    if mode_ok && token_ok {
        info!("webhook_verified");
        return Verification::Verified(query.challenge.unwrap_or_default());
    }

    warn!(
        mode = ?query.mode,
        has_token = query.verify_token.is_some(),
        mode_ok = mode_ok,
        token_ok = token_ok,
        "webhook_verification_failed"
    );
    Verification::Rejected
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(mode: Option<&str>, token: Option<&str>, challenge: Option<&str>) -> VerifyQuery {
        VerifyQuery {
            mode: mode.map(str::to_string),
            verify_token: token.map(str::to_string),
            challenge: challenge.map(str::to_string),
        }
    }

    #[test]
    fn test_verify_subscription_success_echoes_challenge() {
        let result = verify_subscription(
            query(Some("subscribe"), Some("secret"), Some("1158201444")),
            "secret",
        );
        assert_eq!(result, Verification::Verified("1158201444".to_string()));
    }

    #[test]
    fn test_verify_subscription_challenge_verbatim() {
        let challenge = "  spaced & <odd> chars ";
        let result = verify_subscription(
            query(Some("subscribe"), Some("secret"), Some(challenge)),
            "secret",
        );
        assert_eq!(result, Verification::Verified(challenge.to_string()));
    }

    #[test]
    fn test_verify_subscription_missing_challenge_is_empty() {
        let result = verify_subscription(query(Some("subscribe"), Some("secret"), None), "secret");
        assert_eq!(result, Verification::Verified(String::new()));
    }

    #[test]
    fn test_verify_subscription_wrong_token() {
        let result = verify_subscription(
            query(Some("subscribe"), Some("guess"), Some("abc")),
            "secret",
        );
        assert_eq!(result, Verification::Rejected);
    }

    #[test]
    fn test_verify_subscription_wrong_mode() {
        let result = verify_subscription(
            query(Some("unsubscribe"), Some("secret"), Some("abc")),
            "secret",
        );
        assert_eq!(result, Verification::Rejected);

        let case = verify_subscription(
            query(Some("Subscribe"), Some("secret"), Some("abc")),
            "secret",
        );
        assert_eq!(case, Verification::Rejected);
    }

    #[test]
    fn test_verify_subscription_missing_params() {
        assert_eq!(
            verify_subscription(VerifyQuery::default(), "secret"),
            Verification::Rejected
        );
        assert_eq!(
            verify_subscription(query(Some("subscribe"), None, Some("abc")), "secret"),
            Verification::Rejected
        );
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
        assert!(constant_time_compare("", ""));
    }
}
