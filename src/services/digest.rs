use crate::db::entities::events::{self, EventStatus};
use crate::services::error::EventError;
use crate::services::render;
use crate::services::rsvp_ledger::RsvpLedger;
use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

/// Earliest configured fire instant strictly after `now`, resolved against
/// the digest's local clock.
pub fn next_digest_fire(
    now: DateTime<Utc>,
    times: &[NaiveTime],
    offset: FixedOffset,
) -> DateTime<Utc> {
    let local_now = now.with_timezone(&offset);
    let today = local_now.date_naive();

    for day_delta in 0..=1 {
        let date = today + Duration::days(day_delta);
        for &time in times {
            if let Some(candidate) = date
                .and_time(time)
                .and_local_timezone(offset)
                .single()
            {
                let candidate = candidate.with_timezone(&Utc);
                if candidate > now {
                    return candidate;
                }
            }
        }
    }

    // Unreachable with a non-empty schedule; fall back to a day out.
    now + Duration::days(1)
}

/// Active events in `guild_id` starting between local midnight today and the
/// end of the covered window, soonest first.
pub async fn upcoming_events(
    db: &DatabaseConnection,
    guild_id: i64,
    days: i64,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<Vec<events::Model>, EventError> {
    let local_now = now.with_timezone(&offset);
    let window_start = local_now
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_local_timezone(offset)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now);
    let window_end = window_start + Duration::days(days + 1);

    let rows = events::Entity::find()
        .filter(events::Column::GuildId.eq(guild_id))
        .filter(events::Column::Status.eq(EventStatus::Active))
        .filter(events::Column::EventTime.gte(window_start.naive_utc()))
        .filter(events::Column::EventTime.lt(window_end.naive_utc()))
        .order_by_asc(events::Column::EventTime)
        .all(db)
        .await?;

    Ok(rows)
}

/// Formatted multi-day summary for one guild.
pub async fn digest_content(
    db: &DatabaseConnection,
    ledger: &RsvpLedger,
    guild_id: i64,
    days: i64,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<String, EventError> {
    let upcoming = upcoming_events(db, guild_id, days, now, offset).await?;
    if upcoming.is_empty() {
        return Ok(format!(
            "No events scheduled for the next {days} days."
        ));
    }

    let mut lines = Vec::with_capacity(upcoming.len());
    for event in &upcoming {
        let partition = ledger.partition(event.id).await?;
        lines.push(render::digest_line(
            event,
            partition.confirmed.len(),
            partition.waitlisted.len(),
            offset,
        ));
    }

    Ok(lines.join("\n"))
}

/// Splits a multi-line message into chunks below the platform's length
/// cap, breaking on line boundaries.
pub fn chunk_message(content: &str, max_len: usize) -> Vec<String> {
    if content.len() <= max_len {
        return vec![content.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in content.lines() {
        if !current.is_empty() && current.len() + line.len() + 1 > max_len {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn schedule() -> Vec<NaiveTime> {
        vec![
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        ]
    }

    #[test]
    fn test_next_fire_same_day() {
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        // 10:00 UTC = 07:00 local; next slot is 08:00 local = 11:00 UTC.
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let next = next_digest_fire(now, &schedule(), offset);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 1, 11, 0, 0).unwrap());
    }

    #[test]
    fn test_next_fire_rolls_to_tomorrow() {
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        // 22:00 UTC = 19:00 local; both slots passed, roll to 08:00 local
        // next day = 11:00 UTC.
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 22, 0, 0).unwrap();
        let next = next_digest_fire(now, &schedule(), offset);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 2, 11, 0, 0).unwrap());
    }

    #[test]
    fn test_next_fire_is_strictly_future() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        let next = next_digest_fire(now, &schedule(), offset);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 1, 16, 0, 0).unwrap());
    }

    #[test]
    fn test_chunk_message_splits_on_lines() {
        let content = (0..10).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let chunks = chunk_message(&content, 20);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= 20));
        assert_eq!(chunks.join("\n"), content);

        let short = chunk_message("short", 100);
        assert_eq!(short, vec!["short".to_string()]);
    }
}
