use anyhow::Context as _;
use clap::Parser as _;
use dotenvy::dotenv;
use fireteam_events::services::capacity::CapacityResolver;
use fireteam_events::services::delivery::{
    DiscordNotifier, DiscordRoleGateway, Notifier, RoleGateway,
};
use fireteam_events::services::event_manager;
use fireteam_events::services::locks::EventLockService;
use fireteam_events::services::permissions::PermissionService;
use fireteam_events::services::rsvp_ledger::RsvpLedger;
use fireteam_events::services::scheduler::LifecycleScheduler;
use fireteam_events::services::settings::BotSettings;
use fireteam_events::{db, modules, Data};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info};

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Publish commands. If no guild ID is provided, publish globally.
    #[arg(long, num_args = 0..)]
    publish: Option<Vec<u64>>,

    /// Clear all commands instead of publishing them.
    #[arg(long)]
    clear: bool,

    /// Rollback the specified number of migrations and run all migrations again.
    #[arg(long, num_args = 0..=1, default_missing_value = "1")]
    refresh_migrations: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::fmt::init();

    info!("Starting event scheduling bot...");

    let db = db::establish_connection()
        .await
        .context("Failed to connect to database")?;

    use sea_orm_migration::MigratorTrait;
    if let Some(depth) = args.refresh_migrations {
        info!("Refreshing migrations (down {}, then up)...", depth);
        db::migrations::Migrator::down(&db, Some(depth))
            .await
            .context("Failed to rollback migration")?;
    }

    db::migrations::Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;

    if args.refresh_migrations.is_some() {
        info!("Migrations refreshed successfully.");
        return Ok(());
    }

    let token = std::env::var("DISCORD_TOKEN").context("missing DISCORD_TOKEN")?;
    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let commands = modules::commands();

    // Handle command registration if requested
    if let Some(publish_args) = args.publish {
        let http = serenity::Http::new(&token);
        let app_info = http
            .get_current_application_info()
            .await
            .context("Failed to fetch application info")?;

        info!("Fetched Application ID: {}", app_info.id);

        let http = serenity::HttpBuilder::new(&token)
            .application_id(app_info.id)
            .build();

        let empty_commands = vec![];
        let commands = if args.clear { &empty_commands } else { &commands };

        if publish_args.is_empty() {
            if args.clear {
                info!("Clearing commands globally...");
            } else {
                info!("Registering commands globally...");
            }

            if let Err(e) = poise::builtins::register_globally(&http, commands).await {
                error!("Failed to register commands globally: {}", e);
            } else {
                info!("Global command operation successful");
            }
        } else {
            for guild_id in publish_args {
                if args.clear {
                    info!("Clearing commands in guild {}...", guild_id);
                } else {
                    info!("Registering commands in guild {}...", guild_id);
                }

                if let Err(e) = poise::builtins::register_in_guild(
                    &http,
                    commands,
                    serenity::GuildId::new(guild_id),
                )
                .await
                {
                    error!("Failed to register commands in guild {}: {}", guild_id, e);
                } else {
                    info!("Guild command operation successful for guild {}", guild_id);
                }
            }
        }
        return Ok(());
    }

    let settings = BotSettings::from_env();

    let framework_options = poise::FrameworkOptions {
        commands,
        event_handler: |ctx, event, framework, data| {
            Box::pin(event_manager::handle_event(ctx, event, framework, data))
        },
        ..Default::default()
    };

    let framework = poise::Framework::builder()
        .options(framework_options)
        .setup({
            let db = db.clone();
            move |ctx, _ready, _framework| {
                Box::pin(async move {
                    let http = ctx.http.clone();

                    let locks = Arc::new(EventLockService::new());
                    let ledger = RsvpLedger::new(db.clone());
                    let resolver = Arc::new(CapacityResolver::new(
                        db.clone(),
                        ledger.clone(),
                        locks.clone(),
                    ));
                    let permissions = PermissionService::new(db.clone());
                    let notifier: Arc<dyn Notifier> =
                        Arc::new(DiscordNotifier::new(http.clone(), settings.dm_pacing));
                    let roles: Arc<dyn RoleGateway> =
                        Arc::new(DiscordRoleGateway::new(http.clone()));

                    let scheduler = Arc::new(LifecycleScheduler::new(
                        db.clone(),
                        ledger.clone(),
                        locks.clone(),
                        notifier.clone(),
                        roles.clone(),
                        settings.clone(),
                    ));
                    scheduler.start(http);

                    info!("Bot is ready!");

                    Ok(Data {
                        db,
                        settings,
                        ledger,
                        locks,
                        resolver,
                        permissions,
                        notifier,
                        roles,
                    })
                })
            }
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .context("Failed to create client")?;

    client.start_autosharded().await.context("Client error")?;

    Ok(())
}
