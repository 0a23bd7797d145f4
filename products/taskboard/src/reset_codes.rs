//! Persisted one-time codes for the forgot/reset password flow.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entity::password_reset_codes;
use sea_orm::{
    DatabaseConnection, DbErr, EntityTrait, Set,
    sea_query::OnConflict,
};

#[async_trait]
pub trait ResetCodeStore: Send + Sync {
    /// Stores `code` for `email`, replacing any earlier code.
    async fn put(&self, email: &str, code: &str, expires_at: DateTime<Utc>) -> Result<(), DbErr>;

    /// Consumes the code if it matches and has not expired at `now`.
    async fn take(&self, email: &str, code: &str, now: DateTime<Utc>) -> Result<bool, DbErr>;
}

#[derive(Clone)]
pub struct DbResetCodeStore {
    db: DatabaseConnection,
}

impl DbResetCodeStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResetCodeStore for DbResetCodeStore {
    async fn put(&self, email: &str, code: &str, expires_at: DateTime<Utc>) -> Result<(), DbErr> {
        let row = password_reset_codes::ActiveModel {
            email: Set(email.to_string()),
            code: Set(code.to_string()),
            expires_at: Set(expires_at.into()),
            created_at: Set(Utc::now().into()),
        };
        password_reset_codes::Entity::insert(row)
            .on_conflict(
                OnConflict::column(password_reset_codes::Column::Email)
                    .update_columns([
                        password_reset_codes::Column::Code,
                        password_reset_codes::Column::ExpiresAt,
                        password_reset_codes::Column::CreatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn take(&self, email: &str, code: &str, now: DateTime<Utc>) -> Result<bool, DbErr> {
        let Some(stored) = password_reset_codes::Entity::find_by_id(email.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(false);
        };
        if stored.expires_at.with_timezone(&Utc) <= now {
            password_reset_codes::Entity::delete_by_id(email.to_string())
                .exec(&self.db)
                .await?;
            return Ok(false);
        }
        if stored.code != code {
            return Ok(false);
        }
        password_reset_codes::Entity::delete_by_id(email.to_string())
            .exec(&self.db)
            .await?;
        Ok(true)
    }
}
