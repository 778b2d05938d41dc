use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub jti: Uuid,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, token_type: TokenType, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            jti: Uuid::now_v7(),
            token_type,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

pub fn encode_token(claims: &Claims, key: &EncodingKey) -> Result<String, String> {
    encode(&Header::default(), claims, key).map_err(|e| format!("JWT encode failed: {e}"))
}

pub fn decode_token(token: &str, key: &DecodingKey) -> Result<Claims, String> {
    let mut validation = Validation::default();
    validation.leeway = 0;
    decode::<Claims>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| format!("JWT decode failed: {e}"))
}

/// Signs and verifies access/refresh tokens with a shared HS256 secret.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(
        secret: &str,
        access_lifetime: std::time::Duration,
        refresh_lifetime: std::time::Duration,
    ) -> Result<Self, String> {
        let access_lifetime = Duration::from_std(access_lifetime)
            .map_err(|e| format!("Invalid access token lifetime: {e}"))?;
        let refresh_lifetime = Duration::from_std(refresh_lifetime)
            .map_err(|e| format!("Invalid refresh token lifetime: {e}"))?;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_lifetime,
            refresh_lifetime,
        })
    }

    pub fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, String> {
        let refresh = Claims::new(user_id, TokenType::Refresh, self.refresh_lifetime);
        Ok(TokenPair {
            refresh: encode_token(&refresh, &self.encoding)?,
            access: self.issue_access(user_id)?,
        })
    }

    pub fn issue_access(&self, user_id: Uuid) -> Result<String, String> {
        let claims = Claims::new(user_id, TokenType::Access, self.access_lifetime);
        encode_token(&claims, &self.encoding)
    }

    /// Verify signature and expiry, and that the token is of the expected kind.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, String> {
        let claims = decode_token(token, &self.decoding)?;
        if claims.token_type != expected {
            return Err(format!("Expected {expected:?} token"));
        }
        Ok(claims)
    }

    #[cfg(test)]
    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, String> {
        encode_token(claims, &self.encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            "test-secret-that-is-long-enough-for-hmac",
            std::time::Duration::from_secs(300),
            std::time::Duration::from_secs(86_400),
        )
        .unwrap()
    }

    #[test]
    fn pair_round_trips_with_types() {
        let issuer = issuer();
        let user_id = Uuid::now_v7();
        let pair = issuer.issue_pair(user_id).unwrap();

        let access = issuer.verify(&pair.access, TokenType::Access).unwrap();
        let refresh = issuer.verify(&pair.refresh, TokenType::Refresh).unwrap();
        assert_eq!(access.sub, user_id);
        assert_eq!(refresh.sub, user_id);
        assert_ne!(access.jti, refresh.jti);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn wrong_token_type_is_rejected() {
        let issuer = issuer();
        let pair = issuer.issue_pair(Uuid::now_v7()).unwrap();
        assert!(issuer.verify(&pair.access, TokenType::Refresh).is_err());
        assert!(issuer.verify(&pair.refresh, TokenType::Access).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = issuer();
        let claims = Claims::new(Uuid::now_v7(), TokenType::Refresh, Duration::seconds(-120));
        let token = issuer.sign(&claims).unwrap();
        assert!(issuer.verify(&token, TokenType::Refresh).is_err());
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let other = TokenIssuer::new(
            "a-completely-different-secret-value",
            std::time::Duration::from_secs(300),
            std::time::Duration::from_secs(86_400),
        )
        .unwrap();
        let pair = other.issue_pair(Uuid::now_v7()).unwrap();
        assert!(issuer().verify(&pair.access, TokenType::Access).is_err());
        assert!(issuer().verify("not.a.jwt", TokenType::Access).is_err());
    }

    #[test]
    fn consecutive_pairs_differ() {
        let issuer = issuer();
        let user_id = Uuid::now_v7();
        let a = issuer.issue_pair(user_id).unwrap();
        let b = issuer.issue_pair(user_id).unwrap();
        assert_ne!(a.access, b.access);
        assert_ne!(a.refresh, b.refresh);
    }
}
