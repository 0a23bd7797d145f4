use openidconnect::{
    AuthenticationFlow, AuthorizationCode, ClientId, ClientSecret, CsrfToken, IssuerUrl, Nonce,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse,
    core::{CoreClient, CoreProviderMetadata, CoreResponseType},
    reqwest::async_http_client,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::AuthnError;

pub const GOOGLE_ISSUER: &str = "https://accounts.google.com";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub issuer_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

/// State that must survive the redirect round trip; the server keeps it in a
/// private cookie.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoginChallenge {
    #[serde(skip)]
    pub url: Option<Url>,
    pub csrf: String,
    pub nonce: String,
    pub pkce_verifier: String,
}

#[derive(Clone, Debug)]
pub struct VerifiedIdentity {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct GoogleOidc {
    client: CoreClient,
}

impl GoogleOidc {
    pub async fn discover(config: &ProviderConfig) -> Result<Self, AuthnError> {
        let issuer = IssuerUrl::new(config.issuer_url.clone())
            .map_err(|err| AuthnError::Provider(err.to_string()))?;
        let metadata = CoreProviderMetadata::discover_async(issuer, async_http_client)
            .await
            .map_err(|err| AuthnError::Provider(err.to_string()))?;
        let redirect = RedirectUrl::new(config.redirect_url.clone())
            .map_err(|err| AuthnError::Provider(err.to_string()))?;
        let client = CoreClient::from_provider_metadata(
            metadata,
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
        )
        .set_redirect_uri(redirect);
        debug!(issuer = %config.issuer_url, "oidc provider discovered");
        Ok(Self { client })
    }

    pub fn authorize(&self) -> LoginChallenge {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let (url, csrf, nonce) = self
            .client
            .authorize_url(
                AuthenticationFlow::<CoreResponseType>::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .add_scope(Scope::new("email".into()))
            .add_scope(Scope::new("profile".into()))
            .set_pkce_challenge(challenge)
            .url();
        LoginChallenge {
            url: Some(url),
            csrf: csrf.secret().clone(),
            nonce: nonce.secret().clone(),
            pkce_verifier: verifier.secret().clone(),
        }
    }

    pub async fn exchange(
        &self,
        code: String,
        challenge: &LoginChallenge,
    ) -> Result<VerifiedIdentity, AuthnError> {
        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(PkceCodeVerifier::new(challenge.pkce_verifier.clone()))
            .request_async(async_http_client)
            .await
            .map_err(|err| AuthnError::Provider(err.to_string()))?;
        let id_token = response
            .id_token()
            .ok_or_else(|| AuthnError::Provider("token response carried no id_token".into()))?;
        let nonce = Nonce::new(challenge.nonce.clone());
        let claims = id_token
            .claims(&self.client.id_token_verifier(), &nonce)
            .map_err(|err| AuthnError::Provider(err.to_string()))?;
        if claims.email_verified() == Some(false) {
            return Err(AuthnError::MissingEmail);
        }
        let email = claims
            .email()
            .map(|email| email.as_str().to_string())
            .ok_or(AuthnError::MissingEmail)?;
        let name = claims
            .name()
            .and_then(|name| name.get(None))
            .map(|name| name.as_str().to_string());
        Ok(VerifiedIdentity { email, name })
    }
}
