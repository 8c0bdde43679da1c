//! Session token generation and digests.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

use marigold_core::{SessionToken, TrialToken};

/// Random bytes per session token (256 bits).
const SESSION_TOKEN_BYTES: usize = 32;

/// Random bytes per trial token (128 bits).
const TRIAL_TOKEN_BYTES: usize = 16;

fn random_url_safe(len: usize) -> String {
    let mut bytes = vec![0_u8; len];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a fresh session token from the thread-local CSPRNG.
#[must_use]
pub fn generate_session_token() -> SessionToken {
    SessionToken::from_generated(random_url_safe(SESSION_TOKEN_BYTES))
}

/// Generate a fresh trial token for operator provisioning.
#[must_use]
pub fn generate_trial_token() -> TrialToken {
    TrialToken::from_generated(random_url_safe(TRIAL_TOKEN_BYTES))
}

/// SHA-256 digest of a session token, hex encoded.
///
/// This is the only form of the token the session table ever sees.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TokenDigest(String);

impl TokenDigest {
    /// Digest a session token.
    #[must_use]
    pub fn of(token: &SessionToken) -> Self {
        Self(hex::encode(Sha256::digest(token.expose().as_bytes())))
    }

    /// Wrap a digest that was already computed.
    #[must_use]
    pub fn from_hex(hex: &str) -> Self {
        Self(hex.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for TokenDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First 8 hex chars are enough to correlate log lines.
        let prefix = self.0.get(..8).unwrap_or(&self.0);
        write!(f, "TokenDigest({prefix}…)")
    }
}
