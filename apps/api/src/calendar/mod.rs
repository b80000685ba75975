//! "Add to calendar" deep links for interview invites.

pub mod handlers;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Serialize;

const GOOGLE_BASE: &str = "https://calendar.google.com/calendar/render";
const OUTLOOK_BASE: &str = "https://outlook.live.com/calendar/0/deeplink/compose";

#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub title: String,
    pub start: DateTime<Utc>,
    pub duration: Duration,
    pub details: Option<String>,
    pub location: Option<String>,
}

impl CalendarEvent {
    pub fn end(&self) -> DateTime<Utc> {
        self.start + self.duration
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CalendarLinks {
    pub google: String,
    pub outlook: String,
}

pub fn calendar_links(event: &CalendarEvent) -> CalendarLinks {
    CalendarLinks {
        google: google_url(event),
        outlook: outlook_url(event),
    }
}

pub fn google_url(event: &CalendarEvent) -> String {
    let dates = format!(
        "{}/{}",
        event.start.format("%Y%m%dT%H%M%SZ"),
        event.end().format("%Y%m%dT%H%M%SZ")
    );
    let params = [
        ("action", Some("TEMPLATE")),
        ("text", Some(event.title.as_str())),
        ("dates", Some(dates.as_str())),
        ("details", event.details.as_deref()),
        ("location", event.location.as_deref()),
    ];
    format!("{GOOGLE_BASE}?{}", encode_query(&params))
}

pub fn outlook_url(event: &CalendarEvent) -> String {
    let start = event.start.to_rfc3339_opts(SecondsFormat::Secs, true);
    let end = event.end().to_rfc3339_opts(SecondsFormat::Secs, true);
    let params = [
        ("path", Some("/calendar/action/compose")),
        ("rru", Some("addevent")),
        ("subject", Some(event.title.as_str())),
        ("startdt", Some(start.as_str())),
        ("enddt", Some(end.as_str())),
        ("body", event.details.as_deref()),
        ("location", event.location.as_deref()),
    ];
    format!("{OUTLOOK_BASE}?{}", encode_query(&params))
}

/// Percent-encodes values and drops parameters that are absent or blank.
fn encode_query(params: &[(&str, Option<&str>)]) -> String {
    params
        .iter()
        .filter_map(|(key, value)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| format!("{key}={}", urlencoding::encode(v)))
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event() -> CalendarEvent {
        CalendarEvent {
            title: "Interview: Ada – Backend Engineer".to_string(),
            start: Utc.with_ymd_and_hms(2024, 5, 6, 14, 0, 0).unwrap(),
            duration: Duration::minutes(45),
            details: None,
            location: Some("Room 3 & 4".to_string()),
        }
    }

    #[test]
    fn test_google_url() {
        assert_eq!(
            google_url(&event()),
            "https://calendar.google.com/calendar/render?action=TEMPLATE\
             &text=Interview%3A%20Ada%20%E2%80%93%20Backend%20Engineer\
             &dates=20240506T140000Z%2F20240506T144500Z\
             &location=Room%203%20%26%204"
        );
    }

    #[test]
    fn test_outlook_url() {
        let url = outlook_url(&event());
        assert!(url.starts_with(
            "https://outlook.live.com/calendar/0/deeplink/compose?path=%2Fcalendar%2Faction%2Fcompose&rru=addevent"
        ));
        assert!(url.contains("&startdt=2024-05-06T14%3A00%3A00Z"));
        assert!(url.contains("&enddt=2024-05-06T14%3A45%3A00Z"));
        assert!(!url.contains("body="));
    }

    #[test]
    fn test_blank_optional_params_are_omitted() {
        let mut e = event();
        e.details = Some("   ".to_string());
        e.location = None;
        let links = calendar_links(&e);
        assert!(!links.google.contains("details="));
        assert!(!links.google.contains("location="));
    }

    #[test]
    fn test_end_crosses_midnight() {
        let mut e = event();
        e.start = Utc.with_ymd_and_hms(2024, 5, 6, 23, 30, 0).unwrap();
        e.duration = Duration::minutes(60);
        assert!(google_url(&e).contains("20240506T233000Z%2F20240507T003000Z"));
    }
}
