//! Notification sinks used by the task workflows.
//!
//! Both collaborators sit behind object-safe traits so the workflows can run
//! against recording fakes in tests.

mod calendar;
mod email;
pub mod templates;

use thiserror::Error;

pub use calendar::{
    CalendarEvent, CalendarService, DisabledCalendar, GoogleCalendar, GoogleCalendarConfig,
};
pub use email::{EmailSender, SmtpConfig, SmtpMailer};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid address {address}: {reason}")]
    Address { address: String, reason: String },
    #[error("failed to build message: {0}")]
    Message(String),
    #[error("smtp delivery failed: {0}")]
    Smtp(String),
    #[error("calendar request failed: {0}")]
    Calendar(String),
    #[error("calendar integration is not configured")]
    CalendarDisabled,
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        Self::Calendar(err.to_string())
    }
}
