pub mod designated_channels;
pub mod event_permissions;
pub mod events;
pub mod guild_configs;
pub mod rsvps;
