//! Wall-clock timestamps.
//!
//! All recorded times are milliseconds since the Unix epoch. The display
//! format (`YYYY/MM/DD HH:MM:SS`, local time) is the one used in operation
//! listings and accepted back by [`parse_time`].

use chrono::{Local, NaiveDateTime, TimeZone};

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

const USEFUL_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Current wall-clock time in milliseconds
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

/// Render a timestamp as `YYYY/MM/DD HH:MM:SS` in local time
pub fn to_useful_format(time: Timestamp) -> String {
    match Local.timestamp_millis_opt(time).single() {
        Some(dt) => dt.format(USEFUL_FORMAT).to_string(),
        None => time.to_string(),
    }
}

/// Parse a `YYYY/MM/DD HH:MM:SS` local time back into milliseconds
pub fn parse_time(text: &str) -> Option<Timestamp> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), USEFUL_FORMAT).ok()?;
    let local = Local.from_local_datetime(&naive).earliest()?;
    Some(local.timestamp_millis())
}

/// Render a timestamp as `YYYYMMDD` in local time
pub fn yyyymmdd(time: Timestamp) -> String {
    match Local.timestamp_millis_opt(time).single() {
        Some(dt) => dt.format("%Y%m%d").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_useful_format_round_trip() {
        let time = parse_time("2014/05/12 10:31:07").unwrap();
        assert_eq!(to_useful_format(time), "2014/05/12 10:31:07");
        assert_eq!(yyyymmdd(time), "20140512");
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert_eq!(parse_time("yesterday"), None);
        assert_eq!(parse_time("2014/05/12"), None);
    }

    #[test]
    fn test_now_is_positive() {
        assert!(now_millis() > 0);
    }
}
