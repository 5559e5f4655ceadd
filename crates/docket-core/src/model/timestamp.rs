//! Reading stored timestamps.
//!
//! Records are always written as RFC 3339 UTC. Older records carry whatever
//! the browser printed, so reads also accept:
//!
//! ```text
//! Mon Oct 19 2026 15:04:05 GMT+0200 (Central European Summer Time)   Date#toString
//! 10/19/2026, 3:04:05 PM                                            en-US toLocaleString
//! 19/10/2026, 15:04:05                                              en-GB toLocaleString
//! 1792422245000                                                     epoch milliseconds
//! ```
//!
//! Locale strings carry no offset and are read as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

const JS_DATE_STRING: &str = "%a %b %d %Y %H:%M:%S GMT%z";
const LOCALE_FORMATS: [&str; 2] = ["%m/%d/%Y, %I:%M:%S %p", "%d/%m/%Y, %H:%M:%S"];

/// Parse any accepted timestamp text.
#[must_use]
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    // Newer ICU builds put narrow no-break spaces before AM/PM.
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if c == '\u{202f}' || c == '\u{a0}' { ' ' } else { c })
        .collect();

    if let Ok(at) = DateTime::parse_from_rfc3339(&cleaned) {
        return Some(at.with_timezone(&Utc));
    }

    let without_zone_name = cleaned
        .split_once(" (")
        .map_or(cleaned.as_str(), |(head, _)| head);
    if let Ok(at) = DateTime::parse_from_str(without_zone_name, JS_DATE_STRING) {
        return Some(at.with_timezone(&Utc));
    }

    LOCALE_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(&cleaned, format)
            .ok()
            .map(|naive| naive.and_utc())
    })
}

fn from_value<E: serde::de::Error>(value: &serde_json::Value) -> Result<DateTime<Utc>, E> {
    let parsed = match value {
        serde_json::Value::String(s) => parse(s),
        serde_json::Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    };
    parsed.ok_or_else(|| E::custom(format!("unrecognized timestamp {value}")))
}

/// `deserialize_with` for required timestamps.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    from_value(&serde_json::Value::deserialize(deserializer)?)
}

/// `deserialize_with` for optional timestamps; `null` reads as absent.
pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        value => from_value(&value).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, h, m, s).unwrap()
    }

    #[test]
    fn rfc3339_with_offset_is_normalized() {
        assert_eq!(parse("2026-10-19T17:04:05+02:00"), Some(utc(15, 4, 5)));
        assert_eq!(parse("2026-10-19T15:04:05.000Z"), Some(utc(15, 4, 5)));
    }

    #[test]
    fn browser_date_string() {
        assert_eq!(
            parse("Mon Oct 19 2026 17:04:05 GMT+0200 (Central European Summer Time)"),
            Some(utc(15, 4, 5))
        );
        assert_eq!(parse("Mon Oct 19 2026 15:04:05 GMT+0000"), Some(utc(15, 4, 5)));
    }

    #[test]
    fn locale_strings() {
        assert_eq!(parse("10/19/2026, 3:04:05 PM"), Some(utc(15, 4, 5)));
        assert_eq!(parse("10/19/2026, 3:04:05\u{202f}PM"), Some(utc(15, 4, 5)));
        assert_eq!(parse("19/10/2026, 15:04:05"), Some(utc(15, 4, 5)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse("yesterday"), None);
        assert_eq!(parse(""), None);
        assert!(from_value::<serde_json::Error>(&serde_json::json!(true)).is_err());
    }

    #[test]
    fn epoch_millis() {
        let millis = serde_json::json!(1_792_422_245_000_i64);
        let at = from_value::<serde_json::Error>(&millis).unwrap();
        assert_eq!(at, utc(15, 4, 5));
    }
}
