//! HS256 bearer tokens carrying the user id and role.

use chrono::{DateTime, Duration, Utc};
use domains::{Actor, DomainError, IssuedToken, Result, Role, TokenService, User};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    iat: i64,
    exp: i64,
}

pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtTokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }
}

fn unauthorized() -> DomainError {
    DomainError::Unauthorized("invalid or expired token".into())
}

impl TokenService for JwtTokenService {
    fn issue(&self, user: &User) -> Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role.as_str().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(DomainError::internal)?;
        Ok(IssuedToken {
            token,
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or(expires_at),
        })
    }

    fn verify(&self, token: &str) -> Result<Actor> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!(error = %e, "rejected bearer token");
            unauthorized()
        })?;
        let id = Uuid::parse_str(&data.claims.sub).map_err(|_| unauthorized())?;
        let role = Role::parse(&data.claims.role).ok_or_else(unauthorized)?;
        Ok(Actor::new(id, role))
    }
}
