//! Taskboard product slice: boards, tasks, invitations and the task update
//! workflow.
//!
//! [`Taskboard`] bundles the database with the outbound collaborators. The
//! HTTP layer holds one and calls into the services defined in the modules
//! below.

pub mod boards;
pub mod changeset;
pub mod deletion;
pub mod due_date;
pub mod error;
pub mod gateway;
pub mod invitations;
mod notifications;
pub mod reset_codes;
pub mod tasks;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod update;
pub mod users;
pub mod views;

use std::sync::Arc;

use chrono::Duration;
use platform_authz::RoleValidator;
use platform_notify::{CalendarService, EmailSender};
use platform_storage::ObjectStorage;
use sea_orm::DatabaseConnection;

pub use changeset::TaskChangeset;
pub use error::{TaskboardError, TaskboardResult};
pub use reset_codes::{DbResetCodeStore, ResetCodeStore};
pub use update::TaskUpdateOutcome;

#[derive(Clone)]
pub struct Collaborators {
    pub mailer: Arc<dyn EmailSender>,
    pub calendar: Arc<dyn CalendarService>,
    pub storage: Arc<dyn ObjectStorage>,
}

#[derive(Clone, Debug)]
pub struct TaskboardSettings {
    /// Account the calendar events are created on behalf of.
    pub calendar_sender: String,
    pub reset_code_ttl: Duration,
}

impl Default for TaskboardSettings {
    fn default() -> Self {
        Self {
            calendar_sender: String::new(),
            reset_code_ttl: Duration::minutes(15),
        }
    }
}

#[derive(Clone)]
pub struct Taskboard {
    db: DatabaseConnection,
    mailer: Arc<dyn EmailSender>,
    calendar: Arc<dyn CalendarService>,
    storage: Arc<dyn ObjectStorage>,
    reset_codes: Arc<dyn ResetCodeStore>,
    validator: RoleValidator,
    settings: TaskboardSettings,
}

impl Taskboard {
    pub fn new(db: DatabaseConnection, collaborators: Collaborators, settings: TaskboardSettings) -> Self {
        let reset_codes = Arc::new(DbResetCodeStore::new(db.clone()));
        Self {
            db,
            mailer: collaborators.mailer,
            calendar: collaborators.calendar,
            storage: collaborators.storage,
            reset_codes,
            validator: RoleValidator,
            settings,
        }
    }

    pub fn with_reset_codes(mut self, store: Arc<dyn ResetCodeStore>) -> Self {
        self.reset_codes = store;
        self
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn validator(&self) -> &RoleValidator {
        &self.validator
    }

    pub fn settings(&self) -> &TaskboardSettings {
        &self.settings
    }
}
