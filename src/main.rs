use bistro_ledger::{
    bot::{self, BotData},
    config::{database, settings},
    core::{menu, rollover},
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::{env, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load config.toml (defaults when absent)
    let settings = Arc::new(
        settings::load_default_config()
            .inspect_err(|e| error!("Failed to load configuration: {e}"))?,
    );
    let rates = settings.tax_rates()?;
    info!(
        default_rate = %rates.default_rate(),
        "Configuration loaded"
    );

    // 4. Connect and create tables
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {e}"))?;

    // 5. Seed the menu from config
    menu::seed_menu(&db, &settings)
        .await
        .inspect_err(|e| error!("Failed to seed menu: {e}"))?;

    // 6. Generate reports for finished periods in the background
    tokio::spawn(rollover::run_rollover_loop(
        db.clone(),
        rates,
        settings.reports.clone(),
    ));

    // 7. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, BotData::new(db, Arc::clone(&settings), rates)).await
}
