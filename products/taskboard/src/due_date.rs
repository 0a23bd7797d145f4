//! `DD-MM-YYYY` due dates and the calendar window derived from them.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{TaskboardError, TaskboardResult};

pub const CALENDAR_TIME_ZONE: Tz = chrono_tz::Asia::Jakarta;
pub const DUE_DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DueDate {
    /// Normalised `DD-MM-YYYY` form, as stored on the task.
    pub raw: String,
    pub date: NaiveDate,
}

impl DueDate {
    pub fn parse(field: &str, value: &str) -> TaskboardResult<Self> {
        let date = NaiveDate::parse_from_str(value.trim(), DUE_DATE_FORMAT).map_err(|_| {
            TaskboardError::validation(format!("{field} must be a date in DD-MM-YYYY format"))
        })?;
        Ok(Self {
            raw: date.format(DUE_DATE_FORMAT).to_string(),
            date,
        })
    }

    /// Start and end of the calendar event: from `now` until local midnight
    /// of the due date, both RFC 3339 in [`CALENDAR_TIME_ZONE`].
    pub fn event_window(&self, field: &str, now: DateTime<Utc>) -> TaskboardResult<(String, String)> {
        let start = now.with_timezone(&CALENDAR_TIME_ZONE);
        let midnight = self
            .date
            .and_hms_opt(0, 0, 0)
            .and_then(|naive| CALENDAR_TIME_ZONE.from_local_datetime(&naive).earliest())
            .ok_or_else(|| TaskboardError::validation(format!("{field} is not a valid local date")))?;
        if midnight <= start {
            return Err(TaskboardError::validation(format!(
                "{field} must be in the future"
            )));
        }
        Ok((start.to_rfc3339(), midnight.to_rfc3339()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, FixedOffset};

    use super::*;

    #[test]
    fn window_ends_at_jakarta_midnight() {
        let due = DueDate::parse("planning_due_date", "31-12-2099").unwrap();
        let (start, end) = due.event_window("planning_due_date", Utc::now()).unwrap();
        let end = DateTime::<FixedOffset>::parse_from_rfc3339(&end).unwrap();
        assert_eq!(end.offset().local_minus_utc(), 7 * 3600);
        assert_eq!((end.year(), end.month(), end.day()), (2099, 12, 31));
        assert!(start.ends_with("+07:00"));
    }

    #[test]
    fn malformed_and_past_dates_are_rejected() {
        assert!(matches!(
            DueDate::parse("planning_due_date", "not-a-date"),
            Err(TaskboardError::Validation(_))
        ));
        assert!(DueDate::parse("planning_due_date", "2099-12-31").is_err());
        let past = DueDate::parse("project_due_date", "01-01-2000").unwrap();
        assert!(matches!(
            past.event_window("project_due_date", Utc::now()),
            Err(TaskboardError::Validation(_))
        ));
    }

    #[test]
    fn single_digit_parts_are_normalised() {
        let due = DueDate::parse("planning_due_date", "1-2-2099").unwrap();
        assert_eq!(due.raw, "01-02-2099");
    }
}
