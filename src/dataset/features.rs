use chrono::{DateTime, Datelike, Month, NaiveDate, NaiveDateTime, Timelike, Weekday};

use super::Cell;

/// Weekdays in chart order.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Naive formats tried after RFC 3339, most specific first.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Epoch values above this are taken as milliseconds.
const EPOCH_MILLIS_THRESHOLD: u64 = 100_000_000_000;

/// Calendar features of one play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedFeatures {
    pub hour: u32,
    pub weekday: Weekday,
    pub month: Month,
    pub year: i32,
    pub date: NaiveDate,
}

impl DerivedFeatures {
    pub fn from_timestamp(ts: NaiveDateTime) -> Self {
        Self {
            hour: ts.hour(),
            weekday: ts.weekday(),
            month: month_of(ts.month()),
            year: ts.year(),
            date: ts.date(),
        }
    }

    pub fn day_of_week(&self) -> &'static str {
        weekday_name(self.weekday)
    }

    pub fn month_name(&self) -> &'static str {
        self.month.name()
    }
}

/// Full English weekday name.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn month_of(number: u32) -> Month {
    // chrono guarantees 1..=12 for a valid date
    u8::try_from(number)
        .ok()
        .and_then(|n| Month::try_from(n).ok())
        .unwrap_or(Month::January)
}

/// Parse a timestamp cell leniently. Offsets are normalized to UTC; anything
/// unrecognized yields `None` and the row simply has no temporal features.
pub fn parse_timestamp(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::Text(s) => parse_timestamp_str(s.trim()),
        Cell::Int(i) => from_epoch(*i),
        Cell::Float(f) if f.is_finite() => from_epoch(*f as i64),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_utc());
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    s.parse::<i64>().ok().and_then(from_epoch)
}

fn from_epoch(value: i64) -> Option<NaiveDateTime> {
    let dt = if value.unsigned_abs() > EPOCH_MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    };
    dt.map(|d| d.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_parse_extended_history_format() {
        assert_eq!(
            parse_timestamp(&text("2023-07-14T21:05:33Z")),
            Some(at(2023, 7, 14, 21, 5, 33))
        );
    }

    #[test]
    fn test_parse_offset_is_normalized_to_utc() {
        assert_eq!(
            parse_timestamp(&text("2023-07-14T23:05:33+02:00")),
            Some(at(2023, 7, 14, 21, 5, 33))
        );
        assert_eq!(
            parse_timestamp(&text("2023-07-14 23:05:33+02:00")),
            Some(at(2023, 7, 14, 21, 5, 33))
        );
    }

    #[test]
    fn test_parse_account_data_format() {
        assert_eq!(
            parse_timestamp(&text("2020-03-01 08:15")),
            Some(at(2020, 3, 1, 8, 15, 0))
        );
    }

    #[test]
    fn test_parse_naive_and_date_only() {
        assert_eq!(
            parse_timestamp(&text("2020-03-01 08:15:42.250")).map(|t| t.second()),
            Some(42)
        );
        assert_eq!(
            parse_timestamp(&text("2020-03-01")),
            Some(at(2020, 3, 1, 0, 0, 0))
        );
        assert_eq!(
            parse_timestamp(&text("03/01/2020 17:30")),
            Some(at(2020, 3, 1, 17, 30, 0))
        );
    }

    #[test]
    fn test_parse_epoch_seconds_and_millis() {
        let expected = Some(at(2021, 1, 1, 0, 0, 0));
        assert_eq!(parse_timestamp(&Cell::Int(1_609_459_200)), expected);
        assert_eq!(parse_timestamp(&Cell::Int(1_609_459_200_000)), expected);
        assert_eq!(parse_timestamp(&text("1609459200")), expected);
    }

    #[test]
    fn test_unparseable_values_are_none() {
        assert_eq!(parse_timestamp(&text("yesterday")), None);
        assert_eq!(parse_timestamp(&text("2020-13-45")), None);
        assert_eq!(parse_timestamp(&text("   ")), None);
        assert_eq!(parse_timestamp(&Cell::Null), None);
        assert_eq!(parse_timestamp(&Cell::Bool(true)), None);
        assert_eq!(parse_timestamp(&Cell::Float(f64::NAN)), None);
    }

    #[test]
    fn test_out_of_range_epochs_are_none() {
        assert_eq!(parse_timestamp(&Cell::Int(i64::MIN)), None);
        assert_eq!(parse_timestamp(&Cell::Int(i64::MAX)), None);
        assert_eq!(parse_timestamp(&Cell::Float(-1e30)), None);
        assert_eq!(parse_timestamp(&text("-9223372036854775808")), None);
    }

    #[test]
    fn test_derived_features() {
        let f = DerivedFeatures::from_timestamp(at(2024, 2, 29, 23, 59, 0));
        assert_eq!(f.hour, 23);
        assert_eq!(f.day_of_week(), "Thursday");
        assert_eq!(f.month_name(), "February");
        assert_eq!(f.year, 2024);
        assert_eq!(f.date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_weekday_order_starts_monday() {
        let names: Vec<&str> = WEEKDAYS.iter().map(|d| weekday_name(*d)).collect();
        assert_eq!(names.first(), Some(&"Monday"));
        assert_eq!(names.last(), Some(&"Sunday"));
    }
}
