use crate::db::entities::events;
use chrono::NaiveDateTime;

/// Where an intent is delivered: a direct message, or a broadcast into the
/// event's channel (optionally mentioning the delegated role).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    User(i64),
    Channel {
        channel_id: i64,
        mention_role_id: Option<i64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Promotion,
    ReminderStandard,
    ReminderConfirmRequest,
    Cancellation,
    Reschedule,
}

/// Everything the delivery collaborator needs to render the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentContext {
    pub event_id: i32,
    pub title: String,
    pub event_time: NaiveDateTime,
    /// Deep link to the posted roster message, when it still exists.
    pub message_link: Option<String>,
    /// New start time carried by reschedule notices.
    pub rescheduled_to: Option<NaiveDateTime>,
}

/// One decided notification. Produced by the builder below, consumed by the
/// delivery collaborator; the ledger never waits on delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationIntent {
    pub recipient: Recipient,
    pub kind: MessageKind,
    pub context: IntentContext,
}

fn context_for(event: &events::Model) -> IntentContext {
    IntentContext {
        event_id: event.id,
        title: event.title.clone(),
        event_time: event.event_time,
        message_link: message_link(event),
        rescheduled_to: None,
    }
}

pub fn message_link(event: &events::Model) -> Option<String> {
    event.message_id.map(|message_id| {
        format!(
            "https://discord.com/channels/{}/{}/{}",
            event.guild_id, event.channel_id, message_id
        )
    })
}

/// Pure translation from state transitions to notification intents.
pub struct NotificationIntentBuilder;

impl NotificationIntentBuilder {
    /// DM telling a waitlisted user they now hold a confirmed spot.
    pub fn promotion(event: &events::Model, user_id: i64) -> NotificationIntent {
        NotificationIntent {
            recipient: Recipient::User(user_id),
            kind: MessageKind::Promotion,
            context: context_for(event),
        }
    }

    /// ~15 minute reminder. A delegated role turns this into a single
    /// channel mention; otherwise each confirmed attendee is DM'd.
    pub fn standard_reminder(
        event: &events::Model,
        confirmed: &[i64],
    ) -> Vec<NotificationIntent> {
        if let Some(role_id) = event.temp_role_id {
            return vec![NotificationIntent {
                recipient: Recipient::Channel {
                    channel_id: event.channel_id,
                    mention_role_id: Some(role_id),
                },
                kind: MessageKind::ReminderStandard,
                context: context_for(event),
            }];
        }

        confirmed
            .iter()
            .map(|&user_id| NotificationIntent {
                recipient: Recipient::User(user_id),
                kind: MessageKind::ReminderStandard,
                context: context_for(event),
            })
            .collect()
    }

    /// ~1 hour reconfirmation request, DM'd to every confirmed attendee
    /// except the organizer.
    pub fn confirm_requests(
        event: &events::Model,
        confirmed: &[i64],
    ) -> Vec<NotificationIntent> {
        confirmed
            .iter()
            .filter(|&&user_id| user_id != event.creator_id)
            .map(|&user_id| NotificationIntent {
                recipient: Recipient::User(user_id),
                kind: MessageKind::ReminderConfirmRequest,
                context: context_for(event),
            })
            .collect()
    }

    /// Cancellation notice, DM'd to every confirmed attendee.
    pub fn cancellation(event: &events::Model, confirmed: &[i64]) -> Vec<NotificationIntent> {
        confirmed
            .iter()
            .map(|&user_id| NotificationIntent {
                recipient: Recipient::User(user_id),
                kind: MessageKind::Cancellation,
                context: context_for(event),
            })
            .collect()
    }

    /// Channel broadcast mentioning the delegated role after a time change.
    /// Without a role there is nobody to address; no intent is produced.
    pub fn reschedule(
        event: &events::Model,
        new_time: NaiveDateTime,
    ) -> Option<NotificationIntent> {
        let role_id = event.temp_role_id?;
        let mut context = context_for(event);
        context.rescheduled_to = Some(new_time);
        Some(NotificationIntent {
            recipient: Recipient::Channel {
                channel_id: event.channel_id,
                mention_role_id: Some(role_id),
            },
            kind: MessageKind::Reschedule,
            context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::entities::events::EventStatus;

    fn sample_event(temp_role_id: Option<i64>) -> events::Model {
        events::Model {
            id: 7,
            guild_id: 100,
            channel_id: 200,
            creator_id: 1,
            title: "Vault run".to_string(),
            description: None,
            event_time: chrono::NaiveDate::from_ymd_opt(2025, 6, 1)
                .unwrap()
                .and_hms_opt(20, 0, 0)
                .unwrap(),
            activity_type: "Raid".to_string(),
            max_attendees: 6,
            created_at: chrono::NaiveDate::from_ymd_opt(2025, 5, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            status: EventStatus::Active,
            delete_message_after: None,
            reminder_sent: false,
            confirmation_reminder_sent: false,
            temp_role_id,
            message_id: Some(300),
            restricted_role_ids: serde_json::json!([]),
        }
    }

    #[test]
    fn test_standard_reminder_prefers_role_mention() {
        let event = sample_event(Some(42));
        let intents = NotificationIntentBuilder::standard_reminder(&event, &[1, 2, 3]);
        assert_eq!(intents.len(), 1);
        assert_eq!(
            intents[0].recipient,
            Recipient::Channel {
                channel_id: 200,
                mention_role_id: Some(42)
            }
        );
        assert_eq!(intents[0].kind, MessageKind::ReminderStandard);
    }

    #[test]
    fn test_standard_reminder_falls_back_to_dms() {
        let event = sample_event(None);
        let intents = NotificationIntentBuilder::standard_reminder(&event, &[1, 2]);
        assert_eq!(intents.len(), 2);
        assert_eq!(intents[0].recipient, Recipient::User(1));
        assert_eq!(intents[1].recipient, Recipient::User(2));
    }

    #[test]
    fn test_confirm_requests_skip_organizer() {
        let event = sample_event(None);
        let intents = NotificationIntentBuilder::confirm_requests(&event, &[1, 2, 3]);
        let recipients: Vec<_> = intents.iter().map(|i| i.recipient.clone()).collect();
        assert_eq!(recipients, vec![Recipient::User(2), Recipient::User(3)]);
    }

    #[test]
    fn test_reschedule_requires_role() {
        let new_time = chrono::NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(21, 0, 0)
            .unwrap();
        assert!(NotificationIntentBuilder::reschedule(&sample_event(None), new_time).is_none());

        let intent =
            NotificationIntentBuilder::reschedule(&sample_event(Some(42)), new_time).unwrap();
        assert_eq!(intent.kind, MessageKind::Reschedule);
        assert_eq!(intent.context.rescheduled_to, Some(new_time));
    }

    #[test]
    fn test_message_link_needs_posted_message() {
        let mut event = sample_event(None);
        assert_eq!(
            message_link(&event).as_deref(),
            Some("https://discord.com/channels/100/200/300")
        );
        event.message_id = None;
        assert!(message_link(&event).is_none());
    }
}
