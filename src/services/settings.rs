use chrono::{FixedOffset, NaiveTime};
use std::time::Duration;
use tracing::warn;

/// Runtime settings read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Local wall-clock times the digest broadcast fires at.
    pub digest_times: Vec<NaiveTime>,
    /// Offset applied to UTC to get the digest's local clock.
    pub digest_offset: FixedOffset,
    /// Pause between consecutive DM sends.
    pub dm_pacing: Duration,
}

impl BotSettings {
    pub fn from_env() -> Self {
        let digest_times = std::env::var("DIGEST_TIMES")
            .ok()
            .and_then(|raw| parse_digest_times(&raw))
            .unwrap_or_else(default_digest_times);

        let digest_offset = std::env::var("DIGEST_UTC_OFFSET")
            .ok()
            .and_then(|raw| parse_utc_offset(&raw))
            .unwrap_or_else(|| {
                warn!("DIGEST_UTC_OFFSET missing or invalid, defaulting to -03:00");
                FixedOffset::west_opt(3 * 3600).unwrap()
            });

        let dm_pacing = std::env::var("DM_PACING_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        Self {
            digest_times,
            digest_offset,
            dm_pacing,
        }
    }
}

fn default_digest_times() -> Vec<NaiveTime> {
    vec![
        NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
    ]
}

/// Comma-separated `HH:MM` list, e.g. `08:00,16:00`.
fn parse_digest_times(raw: &str) -> Option<Vec<NaiveTime>> {
    let mut times: Vec<NaiveTime> = raw
        .split(',')
        .map(|part| NaiveTime::parse_from_str(part.trim(), "%H:%M").ok())
        .collect::<Option<Vec<_>>>()?;
    times.sort();
    times.dedup();
    if times.is_empty() { None } else { Some(times) }
}

/// `+HH:MM` / `-HH:MM`.
fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => (1, raw),
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_digest_times() {
        let times = parse_digest_times("08:00, 16:00").unwrap();
        assert_eq!(
            times,
            vec![
                NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            ]
        );
        assert!(parse_digest_times("25:00").is_none());
        assert!(parse_digest_times("").is_none());
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(
            parse_utc_offset("-03:00"),
            FixedOffset::west_opt(3 * 3600)
        );
        assert_eq!(
            parse_utc_offset("+05:30"),
            FixedOffset::east_opt(5 * 3600 + 30 * 60)
        );
        assert!(parse_utc_offset("nonsense").is_none());
    }
}
