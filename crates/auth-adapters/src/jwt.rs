//! JWT implementation of the `TokenIssuer` port.
//!
//! The token carries the full identity snapshot the rest of the system
//! runs on (id, names, email, location), so authenticated requests never
//! need a user lookup just to know who is calling.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domains::{DomainError, Identity, TokenIssuer, User};

/// Claim names match the existing client's token payload.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    location: String,
    iat: i64,
    exp: i64,
}

pub struct JwtTokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtTokenIssuer {
    pub fn new(secret: &[u8], ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(ttl_hours),
        }
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, user: &User) -> Result<String, DomainError> {
        let now = Utc::now();
        let claims = Claims {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            location: user.location.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| DomainError::Internal(format!("token signing failed: {err}")))
    }

    fn verify(&self, token: &str) -> Result<Identity, DomainError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| DomainError::Unauthenticated("invalid token".into()))?;
        let claims = data.claims;
        Ok(Identity {
            id: claims.id,
            first_name: claims.first_name,
            last_name: claims.last_name,
            email: claims.email,
            location: claims.location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            location: "London".into(),
            profile_picture: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issue_then_verify_returns_the_identity() {
        let issuer = JwtTokenIssuer::new(b"test-secret", 24);
        let user = user();
        let token = issuer.issue(&user).unwrap();
        let identity = issuer.verify(&token).unwrap();
        assert_eq!(identity.id, user.id);
        assert_eq!(identity.first_name, "Ada");
        assert_eq!(identity.email, "ada@example.com");
    }

    #[test]
    fn garbage_token_is_unauthenticated() {
        let issuer = JwtTokenIssuer::new(b"test-secret", 24);
        let err = issuer.verify("not.a.token").unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated(_)));
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let user = user();
        let token = JwtTokenIssuer::new(b"other-secret", 24).issue(&user).unwrap();
        let err = JwtTokenIssuer::new(b"test-secret", 24)
            .verify(&token)
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        // negative ttl puts exp well past the default validation leeway
        let issuer = JwtTokenIssuer::new(b"test-secret", -2);
        let token = issuer.issue(&user()).unwrap();
        let err = issuer.verify(&token).unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated(_)));
    }
}
