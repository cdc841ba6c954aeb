/*
 * date.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Corriere, a portable HTTP client library.
 *
 * Corriere is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Corriere is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Corriere.  If not, see <http://www.gnu.org/licenses/>.
 */

//! HTTP date parsing and formatting. Inputs arrive in RFC 1123, RFC 850,
//! asctime, and assorted tolerant variants; output is always canonical
//! RFC 1123 GMT. Parsing normalizes the input (weekday prefix, zone name,
//! two-digit year) and then tries a fixed pattern list in order.

use chrono::{NaiveDateTime, TimeZone, Utc};

/// 9999-12-31T23:59:59.999Z, the cap for cookie expiry times.
pub const MAX_DATE: i64 = 253_402_300_799_999;

/// 1601-01-01T00:00:00Z in epoch millis, the floor the formatter clamps to.
const MIN_FORMAT_DATE: i64 = -11_644_473_600_000;

/// Patterns tried in order, after preprocessing has removed the weekday
/// prefix and time zone and expanded two-digit years.
const DATE_PATTERNS: &[&str] = &[
    "%d %b %Y %H:%M:%S", // RFC 1123
    "%d-%b-%Y %H:%M:%S", // RFC 850
    "%d %b %Y %H-%M-%S",
    "%d-%b-%Y %H-%M-%S",
    "%b %d %H:%M:%S %Y", // asctime
    "%b %d %Y %H:%M:%S", // Yahoo
    "%d/%b/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%d %b %Y %H:%M", // no seconds
    "%d-%b-%Y %H:%M",
];

const WEEKDAYS: &[&str] = &[
    "sunday", "monday", "tuesday", "wednesday", "thursday", "friday", "saturday",
    "sun", "mon", "tue", "wed", "thu", "fri", "sat",
];

const MONTHS: &[&str] = &[
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Parse an HTTP date to epoch millis. The instant is UTC unless the text
/// carries a zone. None for empty or unrecognized input.
pub fn parse_http_date(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let collapsed = collapse_whitespace(value);
    let without_weekday = strip_weekday(&collapsed);
    let (without_zone, offset_minutes) = strip_zone(without_weekday);
    let expanded = expand_two_digit_year(without_zone.trim());

    for pattern in DATE_PATTERNS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&expanded, pattern) {
            let millis = naive.and_utc().timestamp_millis();
            return Some(millis - offset_minutes * 60_000);
        }
    }
    None
}

/// Format epoch millis as canonical RFC 1123: `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_http_date(epoch_millis: i64) -> String {
    let clamped = epoch_millis.clamp(MIN_FORMAT_DATE, MAX_DATE);
    let instant = Utc.timestamp_millis_opt(clamped).unwrap();
    instant.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn collapse_whitespace(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last_space = false;
    for c in value.chars() {
        if c == ' ' || c == '\t' {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }
    out
}

/// Drop a leading weekday name plus any comma and spaces after it.
fn strip_weekday(value: &str) -> &str {
    let token_end = value
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(value.len());
    let token = &value[..token_end];
    if WEEKDAYS.iter().any(|w| token.eq_ignore_ascii_case(w)) {
        value[token_end..].trim_start_matches(',').trim_start()
    } else {
        value
    }
}

/// Remove a trailing zone: a name mapped to its offset, or `+hhmm`/`-hhmm`.
/// Returns the remaining text and the offset in minutes.
fn strip_zone(value: &str) -> (&str, i64) {
    let named: &[(&str, i64)] = &[
        ("GMT", 0),
        ("UTC", 0),
        ("UT", 0),
        ("Z", 0),
        ("EST", -300),
        ("EDT", -240),
        ("CST", -360),
        ("CDT", -300),
        ("MST", -420),
        ("MDT", -360),
        ("PST", -480),
        ("PDT", -420),
    ];
    for (name, offset) in named {
        if value.len() > name.len() {
            let tail = &value[value.len() - name.len()..];
            let before = value.as_bytes()[value.len() - name.len() - 1];
            if tail.eq_ignore_ascii_case(name) && before == b' ' {
                return (value[..value.len() - name.len()].trim_end(), *offset);
            }
        }
    }
    // Numeric offset, e.g. "+0200" or "-0530".
    if value.len() > 5 {
        let tail = &value[value.len() - 5..];
        let bytes = tail.as_bytes();
        if (bytes[0] == b'+' || bytes[0] == b'-') && bytes[1..].iter().all(|b| b.is_ascii_digit()) {
            let hours: i64 = tail[1..3].parse().unwrap();
            let minutes: i64 = tail[3..5].parse().unwrap();
            let sign = if bytes[0] == b'-' { -1 } else { 1 };
            return (
                value[..value.len() - 5].trim_end(),
                sign * (hours * 60 + minutes),
            );
        }
    }
    (value, 0)
}

/// Expand a two-digit year token following a month name: 70..=99 maps to
/// 1970..=1999 and 00..=69 maps to 2000..=2069.
fn expand_two_digit_year(value: &str) -> String {
    let bytes = value.as_bytes();
    for month in MONTHS {
        for sep in [b' ', b'-'] {
            if let Some(pos) = find_month(value, month, sep) {
                let year_start = pos + month.len() + 1;
                let year_end = year_start
                    + bytes[year_start..]
                        .iter()
                        .position(|b| !b.is_ascii_digit())
                        .unwrap_or(bytes.len() - year_start);
                if year_end - year_start == 2 {
                    let yy: u32 = value[year_start..year_end].parse().unwrap();
                    let full = if yy >= 70 { 1900 + yy } else { 2000 + yy };
                    let mut out = String::with_capacity(value.len() + 2);
                    out.push_str(&value[..year_start]);
                    out.push_str(&full.to_string());
                    out.push_str(&value[year_end..]);
                    return out;
                }
            }
        }
    }
    value.to_string()
}

/// Offset of `<month><sep>` with a digit after the separator, or None.
fn find_month(value: &str, month: &str, sep: u8) -> Option<usize> {
    let bytes = value.as_bytes();
    let mut start = 0;
    while start + month.len() + 1 < value.len() {
        match value[start..].find(month) {
            Some(offset) => {
                let pos = start + offset;
                let after = pos + month.len();
                if after < bytes.len() && bytes[after] == sep {
                    if after + 1 < bytes.len() && bytes[after + 1].is_ascii_digit() {
                        return Some(pos);
                    }
                }
                start = pos + 1;
            }
            None => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOV_6_1994: i64 = 784_111_777_000;

    #[test]
    fn rfc1123() {
        assert_eq!(
            parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"),
            Some(NOV_6_1994)
        );
    }

    #[test]
    fn rfc850_full_weekday_two_digit_year() {
        assert_eq!(
            parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT"),
            Some(NOV_6_1994)
        );
    }

    #[test]
    fn asctime_single_and_double_space() {
        assert_eq!(parse_http_date("Sun Nov  6 08:49:37 1994"), Some(NOV_6_1994));
        assert_eq!(parse_http_date("Sun Nov 6 08:49:37 1994"), Some(NOV_6_1994));
    }

    #[test]
    fn yahoo_format() {
        assert_eq!(
            parse_http_date("Sun Nov 6 1994 08:49:37 GMT"),
            Some(NOV_6_1994)
        );
    }

    #[test]
    fn comma_without_space() {
        assert_eq!(
            parse_http_date("Sun,06-Nov-1994 08:49:37 GMT"),
            Some(NOV_6_1994)
        );
    }

    #[test]
    fn weekday_optional() {
        assert_eq!(parse_http_date("06 Nov 1994 08:49:37 GMT"), Some(NOV_6_1994));
    }

    #[test]
    fn two_digit_year_window() {
        // 70..99 -> 1970..1999, 00..69 -> 2000..2069
        assert_eq!(
            parse_http_date("Thu, 01 Jan 70 00:00:00 GMT"),
            Some(0)
        );
        assert_eq!(
            parse_http_date("01 Jan 00 00:00:00 GMT"),
            Some(946_684_800_000)
        );
        assert_eq!(
            parse_http_date("01 Jan 69 00:00:00 GMT"),
            parse_http_date("01 Jan 2069 00:00:00 GMT")
        );
        assert_eq!(
            parse_http_date("01 Jan 99 00:00:00 GMT"),
            parse_http_date("01 Jan 1999 00:00:00 GMT")
        );
    }

    #[test]
    fn numeric_offset_zone() {
        assert_eq!(
            parse_http_date("Sun, 06 Nov 1994 10:49:37 +0200"),
            Some(NOV_6_1994)
        );
        assert_eq!(
            parse_http_date("Sun, 06 Nov 1994 03:49:37 -0500"),
            Some(NOV_6_1994)
        );
    }

    #[test]
    fn named_zone() {
        assert_eq!(
            parse_http_date("Sun, 06 Nov 1994 03:49:37 EST"),
            Some(NOV_6_1994)
        );
    }

    #[test]
    fn numeric_month_separators() {
        assert_eq!(parse_http_date("06/11/1994 08:49:37"), Some(NOV_6_1994));
        assert_eq!(parse_http_date("06-11-1994 08:49:37"), Some(NOV_6_1994));
        assert_eq!(parse_http_date("06/Nov/1994 08:49:37"), Some(NOV_6_1994));
    }

    #[test]
    fn dash_time_separator() {
        assert_eq!(
            parse_http_date("Sun, 06-Nov-1994 08-49-37 GMT"),
            Some(NOV_6_1994)
        );
    }

    #[test]
    fn invalid_dates() {
        assert_eq!(parse_http_date(""), None);
        assert_eq!(parse_http_date("   "), None);
        assert_eq!(parse_http_date("not a date"), None);
        assert_eq!(parse_http_date("32 Jan 1994 00:00:00 GMT"), None);
    }

    #[test]
    fn format_canonical_rfc1123() {
        assert_eq!(
            format_http_date(NOV_6_1994),
            "Sun, 06 Nov 1994 08:49:37 GMT"
        );
        assert_eq!(format_http_date(0), "Thu, 01 Jan 1970 00:00:00 GMT");
    }

    #[test]
    fn format_parse_round_trip() {
        for millis in [0, NOV_6_1994, MAX_DATE - 999] {
            let formatted = format_http_date(millis);
            let parsed = parse_http_date(&formatted).unwrap();
            assert_eq!(parsed / 1000, millis / 1000, "round trip of {}", formatted);
        }
    }
}
