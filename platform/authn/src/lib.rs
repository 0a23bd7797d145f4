//! Platform authentication helpers.
//!
//! Everything that turns credentials into an [`AuthenticatedPrincipal`] lives
//! here: password hashing, the JWT session format, the Google OIDC login flow
//! and the one-time codes used for password resets.

mod codes;
mod jwt;
mod oidc;
mod password;
mod principal;

use thiserror::Error;

pub use codes::{RESET_CODE_LEN, generate_reset_code};
pub use jwt::{AuthConfig, SessionClaims, decode_token, issue_token};
pub use oidc::{GOOGLE_ISSUER, GoogleOidc, LoginChallenge, ProviderConfig, VerifiedIdentity};
pub use password::{hash_password, random_password_hash, verify_password};
pub use principal::{AuthMethod, AuthenticatedPrincipal};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum AuthnError {
    #[error("invalid token")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("identity provider error: {0}")]
    Provider(String),
    #[error("identity provider did not return a verified email")]
    MissingEmail,
}

pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Shape check only; deliverability is the mail server's problem.
pub fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_checks() {
        assert!(is_valid_email("dev@example.com"));
        assert!(!is_valid_email("dev@localhost"));
        assert!(!is_valid_email("dev.example.com"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("@example.com"));
        assert_eq!(normalize_email("  Dev@Example.COM "), "dev@example.com");
    }
}
