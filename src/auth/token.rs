//! HMAC-signed bearer tokens.
//!
//! Tokens are stateless and self-expiring, verifiable without any storage.
//! Format: `gads_<base64url(payload json)>.<base64url(hmac-sha256 signature)>`
//! where the signature is computed over the base64url payload string itself.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Prefix identifying access tokens issued by this gateway.
pub const TOKEN_PREFIX: &str = "gads_";

/// Default access-token lifetime: 24 hours.
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 86_400;

/// Payload embedded in a signed token. All timestamps are Unix milliseconds.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Issued-at time.
    pub iat: i64,
    /// Expiry time.
    pub exp: i64,
    /// Unique token ID; only makes payloads distinct, never tracked.
    pub jti: String,
}

/// Issues and verifies HMAC-signed bearer tokens.
///
/// Verification never errors: every failure path folds to `false` so the
/// gateway can make a single pass/fail decision. An empty secret fails
/// closed (nothing verifies, nothing meaningful can be issued).
#[derive(Clone)]
pub struct TokenSigner {
    secret: String,
}

impl TokenSigner {
    /// Create a signer over the given shared secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Whether a non-empty secret is configured.
    pub fn is_configured(&self) -> bool {
        !self.secret.is_empty()
    }

    /// Issue a new token valid for `ttl_seconds` from now.
    pub fn issue(&self, ttl_seconds: u64) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        let payload = TokenPayload {
            iat: now,
            exp: now + (ttl_seconds as i64) * 1000,
            jti: Uuid::new_v4().to_string(),
        };
        self.sign_payload(&payload)
    }

    /// Serialize, encode and sign a payload into wire form.
    fn sign_payload(&self, payload: &TokenPayload) -> String {
        // TokenPayload serialization cannot fail: plain integers and a String.
        let json = serde_json::to_string(payload).expect("token payload serializes");
        let b64 = URL_SAFE_NO_PAD.encode(json.as_bytes());
        let sig = self.signature_for(&b64);
        format!("{TOKEN_PREFIX}{b64}.{sig}")
    }

    /// Compute the base64url signature over the encoded payload string.
    fn signature_for(&self, encoded_payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any size");
        mac.update(encoded_payload.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    /// Verify a token: signature first, then payload shape, then expiry.
    ///
    /// Returns `false` on any failure. The caller never learns *why* a
    /// token was rejected.
    pub fn verify(&self, token: &str) -> bool {
        if self.secret.is_empty() {
            return false;
        }

        let raw = token.strip_prefix(TOKEN_PREFIX).unwrap_or(token);

        // Split on the last '.' so a pathological payload cannot shift the
        // signature boundary.
        let Some(dot) = raw.rfind('.') else {
            return false;
        };
        let (b64, sig) = (&raw[..dot], &raw[dot + 1..]);

        let Ok(provided) = URL_SAFE_NO_PAD.decode(sig) else {
            return false;
        };
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any size");
        mac.update(b64.as_bytes());
        // Constant-time comparison; a length mismatch is just a mismatch.
        if mac.verify_slice(&provided).is_err() {
            return false;
        }

        let Ok(json) = URL_SAFE_NO_PAD.decode(b64) else {
            return false;
        };
        let Ok(value) = serde_json::from_slice::<serde_json::Value>(&json) else {
            return false;
        };
        let Some(exp) = value.get("exp").and_then(|v| v.as_i64()) else {
            return false;
        };

        exp >= chrono::Utc::now().timestamp_millis()
    }
}

/// Mint an opaque refresh token.
///
/// Deliberately *not* a verifiable signed token: a random value with a
/// prefix that distinguishes it from access tokens on sight.
pub fn generate_refresh_token() -> String {
    format!("gads_rt_{}", Uuid::new_v4())
}
