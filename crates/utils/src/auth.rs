//! JWT claims carried by dashboard users.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id as a string
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    pub exp: usize,
}

impl Claims {
    /// Claims for `user_id` that expire `ttl` from now.
    pub fn new(user_id: i64, email: impl Into<String>, is_admin: bool, ttl: Duration) -> Self {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let exp = Utc::now().timestamp().saturating_add(ttl).max(0) as usize;
        Self {
            sub: user_id.to_string(),
            email: email.into(),
            is_admin,
            exp,
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

pub fn encode_claims(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_with_matching_secret() {
        let claims = Claims::new(1, "admin@thatsmartsite.com", true, Duration::from_secs(3600));
        let token = encode_claims(&claims, "secret").unwrap();
        let decoded = decode_claims(&token, "secret").unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.user_id(), Some(1));
    }

    #[test]
    fn test_rejects_wrong_secret_and_expired_tokens() {
        let claims = Claims::new(1, "admin@thatsmartsite.com", true, Duration::from_secs(3600));
        let token = encode_claims(&claims, "secret").unwrap();
        assert!(decode_claims(&token, "other").is_err());

        let expired = Claims {
            exp: (Utc::now().timestamp() - 7200) as usize,
            ..claims
        };
        let token = encode_claims(&expired, "secret").unwrap();
        assert!(decode_claims(&token, "secret").is_err());
    }

    #[test]
    fn test_non_numeric_subject_has_no_user_id() {
        let mut claims = Claims::new(4, "a@b.co", false, Duration::from_secs(3600));
        claims.sub = "legacy".into();
        assert_eq!(claims.user_id(), None);
    }
}
