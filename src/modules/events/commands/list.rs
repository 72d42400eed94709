use super::say_ephemeral;
use crate::services::digest;
use crate::{Context, Error};
use chrono::Utc;

/// List events scheduled over the next 3 days
#[poise::command(slash_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let data = ctx.data();
    let guild_id = ctx
        .guild_id()
        .ok_or_else(|| anyhow::anyhow!("This command is only available in a guild"))?;

    let content = digest::digest_content(
        &data.db,
        &data.ledger,
        guild_id.get() as i64,
        3,
        Utc::now(),
        data.settings.digest_offset,
    )
    .await?;

    let full = format!("**Scheduled events (next 3 days):**\n{content}");
    let mut chunks = digest::chunk_message(&full, 1900).into_iter();
    if let Some(first) = chunks.next() {
        let remainder = chunks.count();
        if remainder > 0 {
            say_ephemeral(
                &ctx,
                format!("{first}\n*…and more: see the digest channel for the full list.*"),
            )
            .await?;
        } else {
            say_ephemeral(&ctx, first).await?;
        }
    }

    Ok(())
}
