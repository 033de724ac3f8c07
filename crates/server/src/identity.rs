//! Bearer token verification.
//!
//! The server never stores credentials; it trusts an external identity
//! provider and only checks the tokens it issues.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity asserted by a verified token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub email: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("token is missing the {0} claim")]
    MissingClaim(&'static str),
}

pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Claims read from (and, in tests, written to) an HS256 token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: u64,
}

/// Verifies HS256 tokens signed with a shared secret.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid,
            }
        })?;

        let claims = data.claims;
        if claims.sub.trim().is_empty() {
            return Err(AuthError::MissingClaim("sub"));
        }
        let email = claims
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or(AuthError::MissingClaim("email"))?;

        Ok(Identity {
            subject: claims.sub,
            email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "test-secret";

    fn token(secret: &str, sub: &str, email: Option<&str>, exp: u64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            email: email.map(str::to_string),
            exp,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_an_hour() -> u64 {
        (chrono::Utc::now().timestamp() + 3600) as u64
    }

    #[test]
    fn accepts_a_valid_token() {
        let verifier = JwtVerifier::new(SECRET);
        let identity = verifier
            .verify(&token(SECRET, "abc", Some("a@example.org"), in_an_hour()))
            .unwrap();
        assert_eq!(identity.subject, "abc");
        assert_eq!(identity.email, "a@example.org");
    }

    #[test]
    fn rejects_foreign_signatures() {
        let verifier = JwtVerifier::new(SECRET);
        let err = verifier
            .verify(&token("other", "abc", Some("a@example.org"), in_an_hour()))
            .unwrap_err();
        assert_eq!(err, AuthError::Invalid);
        assert_eq!(verifier.verify("garbage").unwrap_err(), AuthError::Invalid);
    }

    #[test]
    fn rejects_expired_tokens() {
        let verifier = JwtVerifier::new(SECRET);
        let err = verifier
            .verify(&token(SECRET, "abc", Some("a@example.org"), 1_000))
            .unwrap_err();
        assert_eq!(err, AuthError::Expired);
    }

    #[test]
    fn requires_an_email() {
        let verifier = JwtVerifier::new(SECRET);
        let err = verifier
            .verify(&token(SECRET, "abc", None, in_an_hour()))
            .unwrap_err();
        assert_eq!(err, AuthError::MissingClaim("email"));
    }
}
