//! Account lifecycle: signup, login, profile changes and password resets.

use chrono::Utc;
use platform_authn::{
    AuthenticatedPrincipal, MIN_PASSWORD_LEN, generate_reset_code, hash_password,
    is_valid_email, normalize_email, random_password_hash, verify_password,
};
use platform_notify::templates;
use sea_orm::TransactionTrait;
use tracing::info;

use crate::{
    Taskboard,
    error::{TaskboardError, TaskboardResult},
    gateway,
    views::UserView,
};

pub const RESET_CODE_SUBJECT: &str = "Password Reset Code";

fn checked_email(value: &str) -> TaskboardResult<String> {
    let email = normalize_email(value);
    if !is_valid_email(&email) {
        return Err(TaskboardError::validation("Invalid email format"));
    }
    Ok(email)
}

fn checked_password(value: &str) -> TaskboardResult<&str> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(TaskboardError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(value)
}

impl Taskboard {
    pub async fn signup(&self, email: &str, password: &str) -> TaskboardResult<UserView> {
        let email = checked_email(email)?;
        let password = checked_password(password)?;
        if gateway::users::find_user_by_email(&self.db, &email).await?.is_some() {
            return Err(TaskboardError::conflict("Email already registered"));
        }
        let user = gateway::users::insert_user(&self.db, &email, hash_password(password)?).await?;
        info!(user_id = user.id, "user signed up");
        Ok(user.into())
    }

    pub async fn login(&self, email: &str, password: &str) -> TaskboardResult<UserView> {
        let email = normalize_email(email);
        let user = gateway::users::find_user_by_email(&self.db, &email)
            .await?
            .ok_or_else(|| TaskboardError::not_found("User not found"))?;
        if !verify_password(password, &user.password_hash) {
            return Err(TaskboardError::Unauthorized("Invalid password".into()));
        }
        Ok(user.into())
    }

    /// Resolves an OAuth login to a local account, creating one on first sight.
    pub async fn upsert_oauth_user(&self, email: &str) -> TaskboardResult<UserView> {
        let email = checked_email(email)?;
        if let Some(user) = gateway::users::find_user_by_email(&self.db, &email).await? {
            return Ok(user.into());
        }
        let user = gateway::users::insert_user(&self.db, &email, random_password_hash()?).await?;
        info!(user_id = user.id, "user created from oauth login");
        Ok(user.into())
    }

    /// Refreshes a session principal from the users table. `None` means the
    /// account no longer exists.
    pub async fn resolve_principal(
        &self,
        session: &AuthenticatedPrincipal,
    ) -> TaskboardResult<Option<AuthenticatedPrincipal>> {
        let user = gateway::users::find_user(&self.db, session.user_id).await?;
        Ok(user.map(|user| AuthenticatedPrincipal::new(user.id, user.email, session.method)))
    }

    pub async fn get_user(&self, id: i32) -> TaskboardResult<UserView> {
        gateway::users::find_user(&self.db, id)
            .await?
            .map(UserView::from)
            .ok_or_else(|| TaskboardError::not_found("User not found"))
    }

    pub async fn list_users(&self) -> TaskboardResult<Vec<UserView>> {
        Ok(gateway::users::list_users(&self.db)
            .await?
            .into_iter()
            .map(UserView::from)
            .collect())
    }

    pub async fn update_user_email(
        &self,
        principal: &AuthenticatedPrincipal,
        id: i32,
        email: &str,
    ) -> TaskboardResult<UserView> {
        if principal.user_id != id {
            return Err(TaskboardError::forbidden("You can only update your own account"));
        }
        let email = checked_email(email)?;
        let txn = self.db.begin().await?;
        let user = gateway::users::find_user(&txn, id)
            .await?
            .ok_or_else(|| TaskboardError::not_found("User not found"))?;
        if let Some(existing) = gateway::users::find_user_by_email(&txn, &email).await? {
            if existing.id != id {
                return Err(TaskboardError::conflict("Email already registered"));
            }
        }
        let updated = gateway::users::update_email(&txn, user, &email).await?;
        txn.commit().await?;
        Ok(updated.into())
    }

    pub async fn delete_user(&self, principal: &AuthenticatedPrincipal, id: i32) -> TaskboardResult<()> {
        if principal.user_id != id {
            return Err(TaskboardError::forbidden("You can only delete your own account"));
        }
        let txn = self.db.begin().await?;
        if gateway::users::find_user(&txn, id).await?.is_none() {
            return Err(TaskboardError::not_found("User not found"));
        }
        if gateway::users::reference_count(&txn, id).await? > 0 {
            return Err(TaskboardError::conflict(
                "User still owns boards or belongs to tasks",
            ));
        }
        gateway::users::delete_user(&txn, id).await?;
        txn.commit().await?;
        info!(user_id = id, "user deleted");
        Ok(())
    }

    pub async fn forgot_password(&self, email: &str) -> TaskboardResult<()> {
        let email = checked_email(email)?;
        if gateway::users::find_user_by_email(&self.db, &email).await?.is_none() {
            return Err(TaskboardError::not_found("User not found"));
        }
        let code = generate_reset_code();
        let ttl = self.settings.reset_code_ttl;
        self.reset_codes.put(&email, &code, Utc::now() + ttl).await?;
        let body = templates::reset_code(&code, ttl.num_minutes());
        self.mailer
            .send(std::slice::from_ref(&email), RESET_CODE_SUBJECT, &body)
            .await?;
        info!("password reset code sent");
        Ok(())
    }

    pub async fn reset_password(
        &self,
        email: &str,
        reset_code: &str,
        new_password: &str,
    ) -> TaskboardResult<()> {
        let email = checked_email(email)?;
        let new_password = checked_password(new_password)?;
        let user = gateway::users::find_user_by_email(&self.db, &email)
            .await?
            .ok_or_else(|| TaskboardError::not_found("User not found"))?;
        if !self.reset_codes.take(&email, reset_code.trim(), Utc::now()).await? {
            return Err(TaskboardError::validation("Invalid or expired reset code"));
        }
        gateway::users::update_password(&self.db, user, hash_password(new_password)?).await?;
        info!("password reset");
        Ok(())
    }
}
