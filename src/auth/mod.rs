//! Authentication for the gateway.
//!
//! Two independent credential mechanisms protect the API surface:
//!
//! - **Signed tokens**: stateless HMAC-SHA256 bearer tokens with an
//!   embedded expiry, issued by the OAuth token endpoint
//! - **Static API keys**: an operator-managed allow-list from
//!   configuration, checked in constant time
//!
//! A request passes if *either* mechanism accepts its bearer credential.
//! All verification is boolean and fails closed: a missing secret, an
//! empty key list, or any internal parse failure reads as "invalid", and
//! rejections never tell the caller which step failed.

mod api_key;
mod code_store;
mod token;

pub use api_key::ApiKeySet;
pub use code_store::{CODE_TTL, CodeStore};
pub use token::{
    DEFAULT_TOKEN_TTL_SECONDS, TOKEN_PREFIX, TokenPayload, TokenSigner, generate_refresh_token,
};

use tracing::debug;

/// Validates bearer credentials against both mechanisms.
#[derive(Clone)]
pub struct Authenticator {
    signer: TokenSigner,
    api_keys: ApiKeySet,
}

impl Authenticator {
    pub fn new(signer: TokenSigner, api_keys: ApiKeySet) -> Self {
        Self { signer, api_keys }
    }

    /// The token signer, shared with the issuance endpoint.
    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Validate a raw `Authorization` header value.
    ///
    /// Accepts `Bearer <token>` (scheme case-insensitive) where the token
    /// is either a valid signed token or a configured API key.
    pub fn validate_bearer(&self, auth_header: Option<&str>) -> bool {
        let Some(header) = auth_header else {
            return false;
        };
        let Some(token) = strip_bearer(header) else {
            return false;
        };
        if token.is_empty() {
            return false;
        }

        if self.signer.verify(token) {
            debug!("bearer accepted via signed token");
            return true;
        }
        if self.api_keys.is_valid(token) {
            debug!("bearer accepted via static API key");
            return true;
        }
        false
    }
}

/// Strip a leading `Bearer` scheme (any case, any amount of whitespace).
fn strip_bearer(header: &str) -> Option<&str> {
    let (scheme, rest) = header.split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(rest.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> Authenticator {
        Authenticator::new(
            TokenSigner::new("gateway-secret"),
            ApiKeySet::from_delimited("key-one,key-two"),
        )
    }

    #[test]
    fn accepts_signed_token() {
        let auth = authenticator();
        let token = auth.signer().issue(60);
        assert!(auth.validate_bearer(Some(&format!("Bearer {token}"))));
    }

    #[test]
    fn accepts_api_key_without_token_material() {
        let auth = authenticator();
        assert!(auth.validate_bearer(Some("Bearer key-one")));
        assert!(auth.validate_bearer(Some("Bearer key-two")));
    }

    #[test]
    fn rejects_when_neither_mechanism_matches() {
        let auth = authenticator();
        assert!(!auth.validate_bearer(Some("Bearer key-three")));
        assert!(!auth.validate_bearer(Some("Bearer gads_bogus.sig")));
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        let auth = authenticator();
        assert!(!auth.validate_bearer(None));
        assert!(!auth.validate_bearer(Some("")));
        assert!(!auth.validate_bearer(Some("Bearer")));
        assert!(!auth.validate_bearer(Some("Bearer   ")));
        assert!(!auth.validate_bearer(Some("Basic a2V5LW9uZQ==")));
        assert!(!auth.validate_bearer(Some("key-one")));
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        let auth = authenticator();
        assert!(auth.validate_bearer(Some("bearer key-one")));
        assert!(auth.validate_bearer(Some("BEARER key-one")));
    }

    #[test]
    fn corrupted_signed_token_falls_through_to_key_check() {
        let auth = authenticator();
        let token = auth.signer().issue(60);
        assert!(!auth.validate_bearer(Some(&format!("Bearer {token}X"))));
    }
}
