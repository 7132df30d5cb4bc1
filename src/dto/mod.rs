use std::time::SystemTime;
use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};

/// Game request/response payloads.
pub mod game;
/// Health payloads.
pub mod health;
/// Question payloads.
pub mod question;
/// Participant payloads.
pub mod user;
/// Validation helpers for DTOs.
pub mod validation;

pub(crate) fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Parse a caller-supplied date, accepting RFC 3339 or a bare `YYYY-MM-DD`
/// (interpreted as midnight UTC).
pub(crate) fn parse_date(value: &str) -> Option<SystemTime> {
    if let Ok(stamp) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(stamp.into());
    }

    let date_only = format_description!("[year]-[month]-[day]");
    Date::parse(value, &date_only)
        .ok()
        .map(|date| date.midnight().assume_utc().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_and_bare_dates() {
        assert!(parse_date("2024-01-10T12:00:00Z").is_some());
        assert!(parse_date("2024-01-10").is_some());
        assert!(parse_date("not a date").is_none());
        assert!(parse_date("2024-13-40").is_none());
    }

    #[test]
    fn bare_date_orders_like_midnight() {
        let early = parse_date("2024-01-01").unwrap();
        let late = parse_date("2024-01-10").unwrap();
        assert!(early < late);
    }
}
