use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{AuthMethod, AuthenticatedPrincipal, AuthnError};

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_minutes: i64,
}

impl AuthConfig {
    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.jwt_secret.as_bytes())
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.jwt_secret.as_bytes())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: i32,
    pub email: String,
    pub method: AuthMethod,
    pub exp: usize,
    pub iat: usize,
}

impl SessionClaims {
    pub fn principal(&self) -> AuthenticatedPrincipal {
        AuthenticatedPrincipal::new(self.sub, self.email.clone(), self.method)
    }
}

/// HS256 token whose `sub` is the user id.
pub fn issue_token(
    principal: &AuthenticatedPrincipal,
    config: &AuthConfig,
) -> Result<String, AuthnError> {
    let now = Utc::now();
    let exp = now
        .checked_add_signed(Duration::minutes(config.session_ttl_minutes))
        .unwrap_or(now)
        .timestamp() as usize;
    let claims = SessionClaims {
        sub: principal.user_id,
        email: principal.email.clone(),
        method: principal.method,
        exp,
        iat: now.timestamp() as usize,
    };
    Ok(jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &config.encoding_key(),
    )?)
}

pub fn decode_token(token: &str, config: &AuthConfig) -> Result<SessionClaims, AuthnError> {
    let claims = jsonwebtoken::decode::<SessionClaims>(
        token,
        &config.decoding_key(),
        &Validation::default(),
    )?
    .claims;
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-test-secret-test-secret".into(),
            session_ttl_minutes: 60,
        }
    }

    #[test]
    fn issued_tokens_resolve_to_the_same_principal() {
        let principal = AuthenticatedPrincipal::new(7, "owner@example.com", AuthMethod::Google);
        let token = issue_token(&principal, &config()).unwrap();
        let claims = decode_token(&token, &config()).unwrap();
        assert_eq!(claims.principal(), principal);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let principal = AuthenticatedPrincipal::new(1, "a@example.com", AuthMethod::Password);
        let token = issue_token(&principal, &config()).unwrap();
        let other = AuthConfig {
            jwt_secret: "another-secret".into(),
            ..config()
        };
        assert!(matches!(
            decode_token(&token, &other),
            Err(AuthnError::InvalidToken(_))
        ));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let expired = AuthConfig {
            session_ttl_minutes: -10,
            ..config()
        };
        let principal = AuthenticatedPrincipal::new(1, "a@example.com", AuthMethod::Password);
        let token = issue_token(&principal, &expired).unwrap();
        assert!(decode_token(&token, &config()).is_err());
    }
}
