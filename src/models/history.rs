use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One SMS command sent to one phone number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Milliseconds since the Unix epoch.
    pub date_time: i64,
    pub phone_number: String,
    pub sms_command: String,
}

impl HistoryEntry {
    pub fn new(phone_number: impl Into<String>, sms_command: impl Into<String>) -> Self {
        Self::at(Utc::now().timestamp_millis(), phone_number, sms_command)
    }

    pub fn at(
        date_time: i64,
        phone_number: impl Into<String>,
        sms_command: impl Into<String>,
    ) -> Self {
        Self {
            date_time,
            phone_number: phone_number.into(),
            sms_command: sms_command.into(),
        }
    }

    /// Send time in local time, e.g. `Today 14:05`.
    pub fn formatted_date_time(&self) -> String {
        format_date_time(self.date_time, &Local::now())
    }
}

impl PartialEq for HistoryEntry {
    fn eq(&self, other: &Self) -> bool {
        self.date_time == other.date_time
    }
}

impl Eq for HistoryEntry {}

/// Human readable form of `date_time` relative to `now`.
///
/// Same-day and previous-day entries read `Today` and `Yesterday`; older ones
/// show the calendar date.
pub fn format_date_time<Tz: TimeZone>(date_time: i64, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let when = match Utc.timestamp_millis_opt(date_time).single() {
        Some(utc) => utc.with_timezone(&now.timezone()),
        None => return String::new(),
    };

    let today = now.date_naive();
    let date = if when.date_naive() == today {
        "Today".to_string()
    } else if Some(when.date_naive()) == today.pred_opt() {
        "Yesterday".to_string()
    } else {
        when.format("%Y-%m-%d").to_string()
    };
    format!("{} {}", date, when.format("%H:%M"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(s: &str) -> i64 {
        DateTime::parse_from_rfc3339(s).unwrap().timestamp_millis()
    }

    #[test]
    fn test_format_today_and_yesterday() {
        let now = Utc.timestamp_millis_opt(millis("2024-03-10T18:00:00Z")).unwrap();

        assert_eq!(format_date_time(millis("2024-03-10T08:15:00Z"), &now), "Today 08:15");
        assert_eq!(format_date_time(millis("2024-03-09T23:59:00Z"), &now), "Yesterday 23:59");
        assert_eq!(format_date_time(millis("2024-01-02T07:05:00Z"), &now), "2024-01-02 07:05");
    }

    #[test]
    fn test_equality_by_time() {
        let a = HistoryEntry::at(1000, "1", "imei123456");
        let b = HistoryEntry::at(1000, "2", "check123456");
        let c = HistoryEntry::at(1001, "1", "imei123456");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_new_uses_current_time() {
        let before = Utc::now().timestamp_millis();
        let entry = HistoryEntry::new("+40700000001", "imei123456");
        assert!(entry.date_time >= before);
        assert!(!entry.formatted_date_time().is_empty());
    }
}
