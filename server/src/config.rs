use anyhow::{Context, Result, anyhow};
use axum_extra::extract::cookie::Key;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use platform_authn::{AuthConfig, GOOGLE_ISSUER, ProviderConfig};
use platform_notify::{GoogleCalendarConfig, SmtpConfig};
use platform_storage::S3Config;

const DEFAULT_SESSION_TTL_MINUTES: i64 = 60 * 24 * 30;
const DEFAULT_RESET_CODE_TTL_MINUTES: i64 = 15;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub cookie_key: Key,
    pub cors_allowed_origins: Vec<String>,
    pub smtp: SmtpConfig,
    pub s3: S3Config,
    /// Present when the Google client id, secret and redirect are all set.
    pub google: Option<ProviderConfig>,
    /// Present when Google credentials and a calendar refresh token are set.
    pub calendar: Option<GoogleCalendarConfig>,
    pub calendar_sender: String,
    pub reset_code_ttl_minutes: i64,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let auth = AuthConfig {
            jwt_secret: env_required("JWT_SECRET")?,
            session_ttl_minutes: env_parsed("SESSION_TTL_MINUTES", DEFAULT_SESSION_TTL_MINUTES)?,
        };

        let cookie_secret = env_required("COOKIE_SECRET_BASE64")?;
        let secret_bytes = STANDARD
            .decode(cookie_secret.trim())
            .context("invalid COOKIE_SECRET_BASE64")?;
        if secret_bytes.len() < 32 {
            return Err(anyhow!(
                "COOKIE_SECRET_BASE64 must decode to at least 32 bytes"
            ));
        }
        let cookie_key = Key::derive_from(&secret_bytes);

        let cors_allowed_origins = split_list(
            &std::env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let mail_from = env_required("MAIL_FROM")?;
        let smtp = SmtpConfig {
            host: env_required("SMTP_HOST")?,
            port: env_parsed("SMTP_PORT", 587)?,
            username: env_required("SMTP_USERNAME")?,
            password: env_required("SMTP_PASSWORD")?,
            from: mail_from.clone(),
        };

        let s3 = S3Config {
            bucket: env_required("S3_BUCKET")?,
            region: env_optional("AWS_REGION").unwrap_or_else(|| "ap-southeast-3".into()),
        };

        let google = match (
            env_optional("GOOGLE_CLIENT_ID"),
            env_optional("GOOGLE_CLIENT_SECRET"),
            env_optional("GOOGLE_REDIRECT_URL"),
        ) {
            (Some(client_id), Some(client_secret), Some(redirect_url)) => Some(ProviderConfig {
                issuer_url: env_optional("GOOGLE_ISSUER_URL")
                    .unwrap_or_else(|| GOOGLE_ISSUER.into()),
                client_id,
                client_secret,
                redirect_url,
            }),
            (None, None, None) => None,
            _ => {
                return Err(anyhow!(
                    "GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET and GOOGLE_REDIRECT_URL must be set together"
                ));
            }
        };

        let calendar = match (&google, env_optional("GOOGLE_CALENDAR_REFRESH_TOKEN")) {
            (Some(google), Some(refresh_token)) => Some(GoogleCalendarConfig::new(
                google.client_id.clone(),
                google.client_secret.clone(),
                refresh_token,
                env_optional("GOOGLE_CALENDAR_ID").unwrap_or_else(|| "primary".into()),
            )),
            (None, Some(_)) => {
                return Err(anyhow!(
                    "GOOGLE_CALENDAR_REFRESH_TOKEN needs the Google client credentials"
                ));
            }
            _ => None,
        };

        Ok(Self {
            auth,
            cookie_key,
            cors_allowed_origins,
            smtp,
            s3,
            google,
            calendar,
            calendar_sender: env_optional("CALENDAR_SENDER_EMAIL").unwrap_or(mail_from),
            reset_code_ttl_minutes: env_parsed(
                "RESET_CODE_TTL_MINUTES",
                DEFAULT_RESET_CODE_TTL_MINUTES,
            )?,
        })
    }
}

fn env_required(key: &str) -> Result<String> {
    env_optional(key).ok_or_else(|| anyhow!("missing env {}", key))
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parsed<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env_optional(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {key}")),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            split_list(" http://a.test ,, http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn missing_keys_are_named() {
        let err = env_required("TASKBOARD_CONFIG_KEY_THAT_IS_NOT_SET").unwrap_err();
        assert_eq!(err.to_string(), "missing env TASKBOARD_CONFIG_KEY_THAT_IS_NOT_SET");
    }
}
