use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

/// Parses `DD/MM HH:MM` or `DD/MM/YYYY HH:MM` in the configured local
/// offset into a UTC instant. A year-less date that already passed this
/// year rolls over to the next one, so "25/12 19:30" typed in January
/// never lands in the past.
pub fn parse_event_time(
    input: &str,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Option<NaiveDateTime> {
    let re = Regex::new(r"^\s*(\d{1,2})/(\d{1,2})(?:/(\d{4}))?\s+(\d{1,2}):(\d{2})\s*$").unwrap();
    let caps = re.captures(input)?;

    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let explicit_year: Option<i32> = caps.get(3).and_then(|y| y.as_str().parse().ok());
    let hour: u32 = caps[4].parse().ok()?;
    let minute: u32 = caps[5].parse().ok()?;

    let local_now = now.with_timezone(&offset);
    let to_utc = |year: i32| -> Option<NaiveDateTime> {
        let local = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
        offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc).naive_utc())
    };

    if let Some(year) = explicit_year {
        let candidate = to_utc(year)?;
        return (candidate > now.naive_utc()).then_some(candidate);
    }

    let this_year = to_utc(local_now.year());
    if let Some(candidate) = this_year {
        if candidate > now.naive_utc() {
            return Some(candidate);
        }
    }
    let next_year = to_utc(local_now.year() + 1)?;
    (next_year > now.naive_utc()).then_some(next_year)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_future_date_same_year() {
        let parsed = parse_event_time("20/06 19:30", now(), offset()).unwrap();
        // 19:30 at -03:00 is 22:30 UTC
        assert_eq!(
            parsed,
            NaiveDate::from_ymd_opt(2025, 6, 20)
                .unwrap()
                .and_hms_opt(22, 30, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_past_date_rolls_to_next_year() {
        let parsed = parse_event_time("01/01 10:00", now(), offset()).unwrap();
        assert_eq!(
            parsed,
            NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(13, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_explicit_past_year_is_rejected() {
        assert!(parse_event_time("01/01/2020 10:00", now(), offset()).is_none());
    }

    #[test]
    fn test_invalid_formats() {
        assert!(parse_event_time("tomorrow at noon", now(), offset()).is_none());
        assert!(parse_event_time("32/01 10:00", now(), offset()).is_none());
        assert!(parse_event_time("20/06", now(), offset()).is_none());
    }
}
