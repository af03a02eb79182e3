//! Vitals data types

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque patient identifier, as listed by `GET /patients`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(pub String);

impl PatientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PatientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One timestamped reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsSample {
    pub heart_rate: f64,
    pub temperature: f64,
    pub spo2: f64,
    /// ISO-8601 as sent by the backend
    pub timestamp: String,
}

impl VitalsSample {
    /// Local clock string for display
    pub fn time(&self) -> String {
        display_time(&self.timestamp)
    }
}

/// One page of history for one patient
#[derive(Debug, Clone, PartialEq)]
pub struct VitalsPage {
    pub patient: PatientId,
    pub page: u32,
    pub page_size: usize,
    /// Backend order, assumed chronological
    pub samples: Vec<VitalsSample>,
}

impl VitalsPage {
    /// A full page signals that more data may follow
    pub fn has_next(&self) -> bool {
        self.samples.len() == self.page_size
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    /// Most recent sample of the page (its last element)
    pub fn latest(&self) -> Option<&VitalsSample> {
        self.samples.last()
    }
}

/// Render a backend timestamp as a local `HH:MM:SS` string
pub fn display_time(timestamp: &str) -> String {
    display_time_in(timestamp, &Local)
}

/// Render a backend timestamp as `HH:MM:SS` in the given zone.
///
/// Timestamps without an offset are read as wall-clock time in `tz`.
/// Anything unparseable is returned verbatim.
pub fn display_time_in<Tz>(timestamp: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    const CLOCK: &str = "%H:%M:%S";
    let ts = timestamp.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return dt.with_timezone(tz).format(CLOCK).to_string();
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(ts) {
        return dt.with_timezone(tz).format(CLOCK).to_string();
    }

    let naive_formats = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    for fmt in naive_formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(ts, fmt) {
            if let Some(local) = tz.from_local_datetime(&naive).earliest() {
                return local.format(CLOCK).to_string();
            }
        }
    }

    timestamp.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(ts: &str) -> VitalsSample {
        VitalsSample {
            heart_rate: 72.0,
            temperature: 36.6,
            spo2: 98.0,
            timestamp: ts.to_string(),
        }
    }

    fn page(len: usize, page: u32) -> VitalsPage {
        VitalsPage {
            patient: PatientId::from("p1"),
            page,
            page_size: 10,
            samples: (0..len).map(|_| sample("2024-03-01T10:00:00Z")).collect(),
        }
    }

    #[test]
    fn test_display_time_rfc3339() {
        assert_eq!(display_time_in("2024-03-01T10:00:00Z", &Utc), "10:00:00");
        assert_eq!(display_time_in("2024-03-01T12:30:05+02:00", &Utc), "10:30:05");
    }

    #[test]
    fn test_display_time_naive_is_local_wall_clock() {
        assert_eq!(display_time_in("2024-03-01 08:15:00", &Utc), "08:15:00");
        assert_eq!(display_time_in("2024-03-01T08:15:00.250", &Utc), "08:15:00");
    }

    #[test]
    fn test_display_time_rfc2822() {
        assert_eq!(display_time_in("Fri, 01 Mar 2024 10:00:00 GMT", &Utc), "10:00:00");
    }

    #[test]
    fn test_display_time_unparseable_is_verbatim() {
        assert_eq!(display_time_in("yesterday-ish", &Utc), "yesterday-ish");
    }

    #[test]
    fn test_sample_deserializes_integer_readings() {
        let json = r#"{"heart_rate": 72, "temperature": 36.6, "spo2": 98, "timestamp": "2024-03-01T10:00:00Z"}"#;
        let s: VitalsSample = serde_json::from_str(json).unwrap();
        assert_eq!(s, sample("2024-03-01T10:00:00Z"));
    }

    #[test]
    fn test_has_next_only_when_full() {
        assert!(page(10, 0).has_next());
        assert!(!page(9, 0).has_next());
        assert!(!page(0, 0).has_next());
    }

    #[test]
    fn test_has_previous_iff_not_first() {
        assert!(!page(10, 0).has_previous());
        assert!(page(10, 1).has_previous());
    }

    #[test]
    fn test_latest_is_last_element() {
        let mut p = page(2, 0);
        p.samples[1].heart_rate = 120.0;
        assert_eq!(p.latest().map(|s| s.heart_rate), Some(120.0));
        assert!(page(0, 0).latest().is_none());
    }
}
