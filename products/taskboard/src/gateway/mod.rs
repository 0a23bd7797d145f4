//! Row-level persistence for the taskboard schema.
//!
//! Every function is generic over [`ConnectionTrait`] so the same code runs on
//! the pool and inside a transaction. Callers that hold a transaction must
//! route all reads through it.
//!
//! [`ConnectionTrait`]: sea_orm::ConnectionTrait

pub mod boards;
pub mod files;
pub mod invitations;
pub mod members;
pub mod tasks;
pub mod users;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;

pub use files::{FileKind, FileRow};
pub use members::MemberRow;
pub use tasks::TaskPurge;

pub(crate) fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}
