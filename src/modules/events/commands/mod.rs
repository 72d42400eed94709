mod cancel;
mod create;
mod edit;
mod list;
mod manage_rsvp;

use crate::{Context, Data, Error};

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![event()]
}

/// Scheduled events with capacity-aware RSVP rosters
#[poise::command(
    slash_command,
    guild_only,
    subcommands(
        "create::create",
        "list::list",
        "edit::edit",
        "cancel::cancel",
        "manage_rsvp::manage_rsvp"
    )
)]
pub async fn event(ctx: Context<'_>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content("Use a subcommand: `/event create`, `/event list`, `/event edit`, `/event cancel` or `/event manage_rsvp`.")
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Guild id, admin flag and role ids of the invoking member, as the
/// permission service wants them.
pub(super) async fn actor_context(ctx: &Context<'_>) -> Result<(i64, bool, Vec<i64>), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or_else(|| anyhow::anyhow!("This command is only available in a guild"))?;
    let member = ctx
        .author_member()
        .await
        .ok_or_else(|| anyhow::anyhow!("Could not resolve your guild membership"))?;

    let is_admin = member
        .permissions
        .map_or(false, |p| p.administrator());
    let roles = member.roles.iter().map(|r| r.get() as i64).collect();

    Ok((guild_id.get() as i64, is_admin, roles))
}

pub(super) async fn say_ephemeral(ctx: &Context<'_>, content: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(content)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
