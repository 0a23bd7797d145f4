use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::NotifyError;

pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

/// An all-attendee invite. `start` and `end` are RFC 3339 strings already
/// expressed in `time_zone`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalendarEvent {
    pub sender: String,
    pub summary: String,
    pub description: String,
    pub start: String,
    pub end: String,
    pub time_zone: String,
    pub attendees: Vec<String>,
}

#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Creates the event and returns its link.
    async fn create_event(&self, event: &CalendarEvent) -> Result<String, NotifyError>;
}

#[derive(Clone, Debug)]
pub struct GoogleCalendarConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub calendar_id: String,
    pub token_url: String,
    pub api_base: String,
}

impl GoogleCalendarConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
        calendar_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            calendar_id: calendar_id.into(),
            token_url: GOOGLE_TOKEN_URL.into(),
            api_base: GOOGLE_CALENDAR_API.into(),
        }
    }
}

/// Google Calendar over plain REST, authorised with a long-lived refresh token.
#[derive(Clone)]
pub struct GoogleCalendar {
    http: reqwest::Client,
    config: GoogleCalendarConfig,
}

#[derive(Deserialize)]
struct AccessToken {
    access_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventTime<'a> {
    date_time: &'a str,
    time_zone: &'a str,
}

#[derive(Serialize)]
struct Attendee<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct EventBody<'a> {
    summary: &'a str,
    description: &'a str,
    start: EventTime<'a>,
    end: EventTime<'a>,
    attendees: Vec<Attendee<'a>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedEvent {
    html_link: Option<String>,
    id: Option<String>,
}

impl GoogleCalendar {
    pub fn new(config: GoogleCalendarConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn access_token(&self) -> Result<String, NotifyError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NotifyError::Calendar(format!(
                "token refresh returned {}",
                response.status()
            )));
        }
        let token: AccessToken = response.json().await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl CalendarService for GoogleCalendar {
    async fn create_event(&self, event: &CalendarEvent) -> Result<String, NotifyError> {
        let token = self.access_token().await?;
        let body = EventBody {
            summary: &event.summary,
            description: &event.description,
            start: EventTime {
                date_time: &event.start,
                time_zone: &event.time_zone,
            },
            end: EventTime {
                date_time: &event.end,
                time_zone: &event.time_zone,
            },
            attendees: event
                .attendees
                .iter()
                .map(|email| Attendee { email })
                .collect(),
        };
        let url = format!(
            "{}/calendars/{}/events?sendUpdates=all",
            self.config.api_base, self.config.calendar_id
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(NotifyError::Calendar(format!("{status}: {detail}")));
        }
        let created: CreatedEvent = response.json().await?;
        let link = created.html_link.or(created.id).unwrap_or_default();
        info!(sender = %event.sender, summary = %event.summary, "calendar event created");
        Ok(link)
    }
}

/// Stand-in used when no calendar credentials are configured. Every call fails
/// so due-date updates surface the misconfiguration.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledCalendar;

#[async_trait]
impl CalendarService for DisabledCalendar {
    async fn create_event(&self, event: &CalendarEvent) -> Result<String, NotifyError> {
        debug!(summary = %event.summary, "calendar disabled, refusing event");
        Err(NotifyError::CalendarDisabled)
    }
}
