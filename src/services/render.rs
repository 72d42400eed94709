use crate::db::entities::events::{self, EventStatus};
use crate::services::notify::message_link;
use crate::services::rsvp_ledger::RsvpPartition;
use poise::serenity_prelude as serenity;

fn unix_ts(time: chrono::NaiveDateTime) -> i64 {
    time.and_utc().timestamp()
}

fn mention(user_id: i64) -> String {
    format!("<@{user_id}>")
}

fn activity_colour(activity_type: &str) -> serenity::Colour {
    match activity_type {
        "Raid" => serenity::Colour::new(0x9b59b6),
        "Dungeon" => serenity::Colour::new(0xe67e22),
        t if t.starts_with("PvP") => serenity::Colour::new(0xe74c3c),
        _ => serenity::Colour::new(0x3498db),
    }
}

/// Numbered confirmed roster with blank lines for open seats, mirroring the
/// posted sign-up sheet.
pub fn confirmed_roster_lines(confirmed: &[i64], capacity: usize) -> String {
    if capacity == 0 {
        return "Nobody yet.".to_string();
    }
    (0..capacity)
        .map(|i| match confirmed.get(i) {
            Some(user_id) => format!("{}. {}", i + 1, mention(*user_id)),
            None => format!("{}. _________", i + 1),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn bucket_lines(user_ids: &[i64], numbered: bool) -> String {
    if user_ids.is_empty() {
        return "-".to_string();
    }
    user_ids
        .iter()
        .enumerate()
        .map(|(i, user_id)| {
            if numbered {
                format!("{}. {}", i + 1, mention(*user_id))
            } else {
                mention(*user_id)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Roster panel for an active event.
pub fn event_embed(event: &events::Model, partition: &RsvpPartition) -> serenity::CreateEmbed {
    let capacity = event.max_attendees.max(0) as usize;
    let ts = unix_ts(event.event_time);

    let description = event
        .description
        .as_deref()
        .map(|d| format!("**{d}**"))
        .unwrap_or_else(|| "*No description provided.*".to_string());

    let mut embed = serenity::CreateEmbed::new()
        .title(event.title.clone())
        .description(description)
        .colour(activity_colour(&event.activity_type))
        .field(
            "🗓️ Date & Time",
            format!("<t:{ts}:F> (<t:{ts}:R>)"),
            false,
        )
        .field("🎮 Activity", event.activity_type.clone(), true)
        .field("👑 Organizer", mention(event.creator_id), true)
        .field(
            format!("✅ Confirmed ({}/{})", partition.confirmed.len(), capacity),
            confirmed_roster_lines(&partition.confirmed, capacity),
            false,
        )
        .field(
            format!("⏳ Waitlist ({})", partition.waitlisted.len()),
            bucket_lines(&partition.waitlisted, true),
            false,
        )
        .field(
            format!("❌ Not going ({})", partition.declined.len()),
            bucket_lines(&partition.declined, false),
            true,
        )
        .field(
            format!("🔷 Maybe ({})", partition.tentative.len()),
            bucket_lines(&partition.tentative, false),
            true,
        );

    let restricted = event.restricted_roles();
    if !restricted.is_empty() {
        let names = restricted
            .iter()
            .map(|role_id| format!("- <@&{role_id}>"))
            .collect::<Vec<_>>()
            .join("\n");
        embed = embed.field("🚫 Restricted roles", names, false);
    }

    embed
        .field(
            "ℹ️ How to join",
            "Use the buttons below to set your attendance!",
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Event ID: {}",
            event.id
        )))
}

/// Terminal panel shown once an event is cancelled or completed.
pub fn finalized_embed(event: &events::Model) -> serenity::CreateEmbed {
    let ts = unix_ts(event.event_time);
    let (tag, note, colour) = match event.status {
        EventStatus::Cancelled | EventStatus::MessagePurgedCancelled => (
            "[CANCELLED]",
            "This event was cancelled.",
            serenity::Colour::new(0x5d6d7e),
        ),
        _ => (
            "[COMPLETED]",
            "This event has already finished.",
            serenity::Colour::new(0xaab7b8),
        ),
    };

    serenity::CreateEmbed::new()
        .title(format!("{tag} {}", event.title))
        .description(note)
        .colour(colour)
        .field("🗓️ Original date", format!("<t:{ts}:F>"), false)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Event ID: {}",
            event.id
        )))
}

/// RSVP buttons attached to the roster panel. Custom ids resolve back to
/// the event through the posted message id.
pub fn rsvp_buttons() -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new("rsvp:confirmed")
            .style(serenity::ButtonStyle::Secondary)
            .emoji('✅'),
        serenity::CreateButton::new("rsvp:declined")
            .style(serenity::ButtonStyle::Secondary)
            .emoji('❌'),
        serenity::CreateButton::new("rsvp:tentative")
            .style(serenity::ButtonStyle::Secondary)
            .emoji('🔷'),
    ])
}

/// One digest/listing line: title, local date, open-seat summary, link.
pub fn digest_line(
    event: &events::Model,
    confirmed_count: usize,
    waitlist_count: usize,
    offset: chrono::FixedOffset,
) -> String {
    let local = event.event_time.and_utc().with_timezone(&offset);
    let date_str = local.format("%a %d/%m at %H:%M");

    let open = event.max_attendees as i64 - confirmed_count as i64;
    let seats = if open <= 0 {
        if waitlist_count > 0 {
            format!("Full (waitlist: {waitlist_count})")
        } else {
            "Full".to_string()
        }
    } else if open == 1 {
        "1 spot left".to_string()
    } else {
        format!("{open} spots left")
    };

    let line = format!("{} - {} - {}", event.title, date_str, seats);
    match message_link(event) {
        Some(link) => format!("[{line}]({link})"),
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn sample_event() -> events::Model {
        events::Model {
            id: 12,
            guild_id: 1,
            channel_id: 2,
            creator_id: 3,
            title: "King's Fall".to_string(),
            description: None,
            event_time: chrono::NaiveDate::from_ymd_opt(2025, 6, 6)
                .unwrap()
                .and_hms_opt(23, 0, 0)
                .unwrap(),
            activity_type: "Raid".to_string(),
            max_attendees: 6,
            created_at: chrono::NaiveDate::from_ymd_opt(2025, 6, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            status: EventStatus::Active,
            delete_message_after: None,
            reminder_sent: false,
            confirmation_reminder_sent: false,
            temp_role_id: None,
            message_id: Some(900),
            restricted_role_ids: serde_json::json!([]),
        }
    }

    #[test]
    fn test_confirmed_roster_pads_open_seats() {
        let lines = confirmed_roster_lines(&[10, 20], 4);
        assert_eq!(lines, "1. <@10>\n2. <@20>\n3. _________\n4. _________");
    }

    #[test]
    fn test_digest_line_counts_open_seats() {
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        let line = digest_line(&sample_event(), 5, 0, offset);
        assert!(line.contains("1 spot left"), "{line}");
        // 23:00 UTC renders as 20:00 at -03:00
        assert!(line.contains("at 20:00"), "{line}");
        assert!(line.starts_with("[King's Fall"), "{line}");
    }

    #[test]
    fn test_digest_line_full_with_waitlist() {
        let line = digest_line(
            &sample_event(),
            6,
            2,
            FixedOffset::east_opt(0).unwrap(),
        );
        assert!(line.contains("Full (waitlist: 2)"), "{line}");
    }
}
