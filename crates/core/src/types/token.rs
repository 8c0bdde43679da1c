//! Opaque bearer tokens.
//!
//! Tokens are secrets: their `Debug` output is redacted so they never end up
//! in logs, and they are only exposed through an explicit `expose` call.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when accepting a token from untrusted input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token is empty after trimming.
    #[error("token cannot be empty")]
    Empty,
    /// The token is longer than any token we issue.
    #[error("token must be at most {max} characters")]
    TooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// The token contains characters outside the URL-safe set.
    #[error("token contains invalid characters")]
    InvalidCharacters,
}

/// Longest token accepted from a client.
const MAX_TOKEN_LENGTH: usize = 128;

fn check_token(raw: &str) -> Result<&str, TokenError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TokenError::Empty);
    }
    if trimmed.len() > MAX_TOKEN_LENGTH {
        return Err(TokenError::TooLong {
            max: MAX_TOKEN_LENGTH,
        });
    }
    if !trimmed
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(TokenError::InvalidCharacters);
    }
    Ok(trimmed)
}

macro_rules! define_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        // Deserialization goes through `parse`; cookie sessions are client-held.
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::parse(&raw).map_err(serde::de::Error::custom)
            }
        }

        impl $name {
            /// Accept a token from untrusted input (form field, cookie session).
            ///
            /// # Errors
            ///
            /// Returns a [`TokenError`] if the input is empty, too long, or
            /// contains characters outside `[A-Za-z0-9_-]`.
            pub fn parse(raw: &str) -> Result<Self, TokenError> {
                check_token(raw).map(|t| Self(t.to_owned()))
            }

            /// Wrap a freshly generated token. The caller guarantees the format.
            #[must_use]
            pub const fn from_generated(raw: String) -> Self {
                Self(raw)
            }

            /// Reveal the raw token value.
            #[must_use]
            pub fn expose(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&"[REDACTED]").finish()
            }
        }
    };
}

define_token!(
    /// Bearer token for an admin session.
    SessionToken
);

define_token!(
    /// Operator-issued token identifying a trial user.
    TrialToken
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let token = SessionToken::parse("abcDEF123_-").unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains("abcDEF123"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_deserialize_rejects_what_parse_rejects() {
        let token: SessionToken = serde_json::from_str("\"abc_DEF-1\"").unwrap();
        assert_eq!(token.expose(), "abc_DEF-1");
        assert!(serde_json::from_str::<SessionToken>("\"\"").is_err());
        assert!(serde_json::from_str::<TrialToken>("\"has space\"").is_err());
        assert!(serde_json::from_str::<TrialToken>("\"<script>\"").is_err());
    }

    #[test]
    fn test_parse_trims_and_validates() {
        assert_eq!(TrialToken::parse("  demo_2024 ").unwrap().expose(), "demo_2024");
        assert_eq!(TrialToken::parse(""), Err(TokenError::Empty));
        assert_eq!(
            TrialToken::parse("has space"),
            Err(TokenError::InvalidCharacters)
        );
        assert!(matches!(
            SessionToken::parse(&"a".repeat(200)),
            Err(TokenError::TooLong { .. })
        ));
    }
}
