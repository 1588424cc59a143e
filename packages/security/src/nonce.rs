// ABOUTME: Integrity tokens guarding mutating admin requests
// ABOUTME: HMAC-SHA256 over action, principal and time tick, valid for two ticks

use base64::Engine;
use chrono::{DateTime, Utc};
use rand::Rng;
use ring::hmac;
use std::time::Duration;
use subtle::ConstantTimeEq;
use tracing::debug;

/// Bytes of the HMAC tag kept in a token
const TOKEN_BYTES: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NonceError {
    #[error("Integrity token is missing")]
    Missing,

    #[error("Integrity token is malformed")]
    Malformed,

    #[error("Integrity token is invalid or expired")]
    Invalid,

    #[error("Nonce secret must not be empty")]
    EmptySecret,

    #[error("Nonce lifetime must be at least one second")]
    InvalidLifetime,
}

/// Which tick a token was accepted for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceAge {
    /// Issued in the current tick
    Current,
    /// Issued in the previous tick, still honored
    Previous,
}

/// Issues and verifies integrity tokens.
///
/// Time is split into ticks of `lifetime` seconds. A token is bound to an
/// action name, a principal id and the tick it was issued in, and is accepted
/// during that tick and the next one. After two lifetimes it is always stale.
pub struct IntegrityTokens {
    key: hmac::Key,
    lifetime_secs: i64,
}

impl std::fmt::Debug for IntegrityTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrityTokens")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl IntegrityTokens {
    pub fn new(secret: &[u8], lifetime: Duration) -> Result<Self, NonceError> {
        if secret.is_empty() {
            return Err(NonceError::EmptySecret);
        }
        let lifetime_secs =
            i64::try_from(lifetime.as_secs()).map_err(|_| NonceError::InvalidLifetime)?;
        if lifetime_secs < 1 {
            return Err(NonceError::InvalidLifetime);
        }

        Ok(Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
            lifetime_secs,
        })
    }

    /// Random secret suitable for `new`, base64 encoded
    pub fn generate_secret() -> String {
        let mut rng = rand::thread_rng();
        let bytes: [u8; 32] = rng.gen();
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs.unsigned_abs())
    }

    pub fn create(&self, action: &str, principal: &str) -> String {
        self.create_at(action, principal, Utc::now())
    }

    pub fn create_at(&self, action: &str, principal: &str, now: DateTime<Utc>) -> String {
        hex::encode(self.tag(action, principal, self.tick(now)))
    }

    pub fn verify(&self, token: &str, action: &str, principal: &str) -> Result<NonceAge, NonceError> {
        self.verify_at(token, action, principal, Utc::now())
    }

    pub fn verify_at(
        &self,
        token: &str,
        action: &str,
        principal: &str,
        now: DateTime<Utc>,
    ) -> Result<NonceAge, NonceError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(NonceError::Missing);
        }

        let provided = hex::decode(token.to_ascii_lowercase()).map_err(|_| NonceError::Malformed)?;
        if provided.len() != TOKEN_BYTES {
            return Err(NonceError::Malformed);
        }

        let tick = self.tick(now);
        for (candidate, age) in [(tick, NonceAge::Current), (tick - 1, NonceAge::Previous)] {
            let expected = self.tag(action, principal, candidate);
            if bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
                debug!(action = %action, principal = %principal, ?age, "Integrity token accepted");
                return Ok(age);
            }
        }

        Err(NonceError::Invalid)
    }

    fn tick(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp().div_euclid(self.lifetime_secs)
    }

    fn tag(&self, action: &str, principal: &str, tick: i64) -> Vec<u8> {
        // Length prefixes keep ("a|b", "c") and ("a", "b|c") apart
        let message = format!(
            "{}:{}|{}:{}|{}",
            action.len(),
            action,
            principal.len(),
            principal,
            tick
        );
        let tag = hmac::sign(&self.key, message.as_bytes());
        tag.as_ref()[..TOKEN_BYTES].to_vec()
    }
}
