//! Human-friendly date phrases.
//!
//! A small fixed vocabulary gets exact relative semantics; everything else
//! is handed to `dateparser`, which accepts most common absolute formats.
//!
//! | Phrase | Result |
//! |---|---|
//! | `now` | the current instant |
//! | `today` | today at local midnight |
//! | `tomorrow` | today + 1 day at local midnight |
//! | `next week` | today + 7 days at local midnight |

use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime};

use crate::errors::{Result, TaskError};

/// Parse a date phrase relative to the current local time.
pub fn parse_human_date(input: &str) -> Result<DateTime<Local>> {
    parse_human_date_at(input, Local::now())
}

/// Parse a date phrase relative to `now`.
///
/// Matching of the fixed phrases ignores case and surrounding whitespace.
/// Zone-less absolute dates are read as local time, and date-only input
/// resolves to midnight.
pub fn parse_human_date_at(input: &str, now: DateTime<Local>) -> Result<DateTime<Local>> {
    let trimmed = input.trim();
    match trimmed.to_lowercase().as_str() {
        "now" => Ok(now),
        "today" => local_midnight(now.date_naive(), trimmed),
        "tomorrow" => local_midnight(add_days(now.date_naive(), 1, trimmed)?, trimmed),
        "next week" => local_midnight(add_days(now.date_naive(), 7, trimmed)?, trimmed),
        _ => dateparser::parse_with(trimmed, &Local, NaiveTime::MIN)
            .map(|parsed| parsed.with_timezone(&Local))
            .map_err(|_| TaskError::DateParse(trimmed.to_string())),
    }
}

fn add_days(date: NaiveDate, days: u64, input: &str) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| TaskError::DateParse(input.to_string()))
}

/// Midnight of `date` in the local zone. Where midnight falls in a DST gap
/// there is no such instant and the phrase is rejected.
fn local_midnight(date: NaiveDate, input: &str) -> Result<DateTime<Local>> {
    date.and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()
        .ok_or_else(|| TaskError::DateParse(input.to_string()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Timelike, Utc};

    use super::*;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 10, 15, 42, 7).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assert_midnight(parsed: DateTime<Local>, expected: NaiveDate) {
        assert_eq!(parsed.date_naive(), expected);
        assert_eq!((parsed.hour(), parsed.minute(), parsed.second()), (0, 0, 0));
    }

    #[test]
    fn now_is_the_injected_instant() {
        assert_eq!(parse_human_date_at("now", fixed_now()).unwrap(), fixed_now());
    }

    #[test]
    fn today_is_local_midnight() {
        let parsed = parse_human_date_at("today", fixed_now()).unwrap();
        assert_midnight(parsed, date(2026, 3, 10));
    }

    #[test]
    fn tomorrow_is_next_midnight() {
        let parsed = parse_human_date_at("tomorrow", fixed_now()).unwrap();
        assert_midnight(parsed, date(2026, 3, 11));
    }

    #[test]
    fn next_week_crosses_month_boundary() {
        let now = Local.with_ymd_and_hms(2026, 1, 28, 9, 0, 0).unwrap();
        let parsed = parse_human_date_at("next week", now).unwrap();
        assert_midnight(parsed, date(2026, 2, 4));
    }

    #[test]
    fn phrases_ignore_case_and_whitespace() {
        let parsed = parse_human_date_at("  ToMorrow \n", fixed_now()).unwrap();
        assert_midnight(parsed, date(2026, 3, 11));
        assert!(parse_human_date_at(" NEXT WEEK", fixed_now()).is_ok());
    }

    #[test]
    fn today_against_real_clock() {
        let parsed = parse_human_date("today").unwrap();
        let today = Local::now().date_naive();
        // tolerate a run that straddles midnight
        assert!(parsed.date_naive() == today || parsed.date_naive() + Days::new(1) == today);
        assert_eq!(parsed.hour(), 0);
    }

    #[test]
    fn rfc3339_is_delegated() {
        let parsed = parse_human_date_at("2024-01-15T10:30:00Z", fixed_now()).unwrap();
        assert_eq!(
            parsed.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn date_only_is_local_midnight() {
        let parsed = parse_human_date_at("2024-03-15", fixed_now()).unwrap();
        assert_midnight(parsed, date(2024, 3, 15));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_matches!(
            parse_human_date_at("not-a-date", fixed_now()),
            Err(TaskError::DateParse(s)) if s == "not-a-date"
        );
        assert!(parse_human_date("").is_err());
        assert!(parse_human_date("next month").is_err());
    }
}
