//! Anti-forgery token generation and comparison
//!
//! Tokens are 60 bytes drawn from the thread-local CSPRNG and encoded with the
//! URL-safe base64 alphabet. 60 bytes encode to exactly 80 characters with no
//! padding, so every token matches `[A-Za-z0-9_-]{80}` and is safe to place in
//! headers, cookies, query strings and hidden form fields as-is.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use subtle::ConstantTimeEq;

/// Number of random bytes behind every token
pub const TOKEN_BYTES: usize = 60;

/// Length of an encoded token in characters
pub const TOKEN_LEN: usize = 80;

/// Anti-forgery token string (base64url-encoded 60-byte random value)
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AntiForgeryToken(String);

impl AntiForgeryToken {
    /// Generate a new cryptographically secure token
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Get the token as a string slice
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Consume the token, returning the encoded string
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Compare against a presented value in constant time
    #[must_use]
    pub fn ct_eq(&self, presented: &str) -> bool {
        constant_time_eq(&self.0, presented)
    }
}

impl From<String> for AntiForgeryToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for AntiForgeryToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// Tokens are secrets; keep them out of logs.
impl std::fmt::Debug for AntiForgeryToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AntiForgeryToken").field(&"<redacted>").finish()
    }
}

/// Constant-time string equality
///
/// Running time depends only on the lengths of the inputs, never on where
/// their contents differ.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn is_url_safe(token: &str) -> bool {
        token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    #[test]
    fn test_generated_token_shape() {
        let token = AntiForgeryToken::generate();
        assert_eq!(token.as_str().len(), TOKEN_LEN);
        assert!(is_url_safe(token.as_str()));
    }

    #[test]
    fn test_generated_tokens_are_distinct() {
        let tokens: HashSet<String> = (0..1000)
            .map(|_| AntiForgeryToken::generate().into_string())
            .collect();

        assert_eq!(tokens.len(), 1000);
        assert!(tokens
            .iter()
            .all(|t| !t.contains('\n') && !t.contains('\r')));
    }

    #[test]
    fn test_ct_eq() {
        let token = AntiForgeryToken::generate();
        let copy = token.as_str().to_string();

        assert!(token.ct_eq(&copy));
        assert!(!token.ct_eq(""));
        assert!(!token.ct_eq(&copy[..TOKEN_LEN - 1]));
        assert!(!token.ct_eq(AntiForgeryToken::generate().as_str()));
    }

    #[test]
    fn test_debug_redacts_value() {
        let token = AntiForgeryToken::generate();
        let debug_str = format!("{token:?}");

        assert!(debug_str.contains("redacted"));
        assert!(!debug_str.contains(token.as_str()));
    }

    #[test]
    fn test_display_is_raw_value() {
        let token = AntiForgeryToken::from("abc".to_string());
        assert_eq!(token.to_string(), "abc");
    }

    proptest! {
        #[test]
        fn constant_time_eq_agrees_with_eq(a in ".{0,100}", b in ".{0,100}") {
            prop_assert_eq!(constant_time_eq(&a, &b), a == b);
            prop_assert!(constant_time_eq(&a, &a));
        }
    }
}
