use platform_api::ApiError;
use platform_authn::AuthnError;
use platform_authz::AuthzError;
use platform_notify::NotifyError;
use platform_storage::StorageError;
use sea_orm::DbErr;
use thiserror::Error;

pub type TaskboardResult<T> = Result<T, TaskboardError>;

#[derive(Debug, Error)]
pub enum TaskboardError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Upstream(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl TaskboardError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

impl From<AuthzError> for TaskboardError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden(msg) => Self::Forbidden(msg.to_string()),
            AuthzError::TaskNotFound(_) => Self::NotFound("Task not found".into()),
            AuthzError::Db(err) => Self::Database(err),
        }
    }
}

impl From<NotifyError> for TaskboardError {
    fn from(err: NotifyError) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<StorageError> for TaskboardError {
    fn from(err: StorageError) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<AuthnError> for TaskboardError {
    fn from(err: AuthnError) -> Self {
        match err {
            AuthnError::InvalidToken(_) => Self::Unauthorized("Invalid token".into()),
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl From<TaskboardError> for ApiError {
    fn from(err: TaskboardError) -> Self {
        match err {
            TaskboardError::Validation(msg) => ApiError::InvalidInput(msg),
            TaskboardError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            TaskboardError::Forbidden(msg) => ApiError::Forbidden(msg),
            TaskboardError::NotFound(msg) => ApiError::NotFound(msg),
            TaskboardError::Conflict(msg) => ApiError::Conflict(msg),
            TaskboardError::Upstream(msg) => ApiError::Upstream(msg),
            TaskboardError::Database(err) => ApiError::internal(anyhow::Error::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_are_masked_at_the_edge() {
        let api: ApiError = TaskboardError::Database(DbErr::Custom("boom".into())).into();
        assert_eq!(api.code(), "INTERNAL");
        assert_eq!(api.to_string(), "internal server error");
    }

    #[test]
    fn role_denials_keep_their_message() {
        let err: TaskboardError = AuthzError::Forbidden("Only for owner").into();
        let api: ApiError = err.into();
        assert_eq!(api.code(), "FORBIDDEN");
        assert_eq!(api.to_string(), "Only for owner");
    }
}
