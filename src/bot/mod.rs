//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the staff-facing Discord interface for the ledger, including all
//! slash commands, autocomplete handlers, and bot context management.

/// Discord command implementations (reports, menu prices, orders, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    config::settings::Settings,
    core::tax_rate::TaxRates,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{error, info};

/// Shared data available to all bot commands.
/// This structure holds the database connection, the loaded settings and the tax rates
/// derived from them.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Application settings
    pub settings: Arc<Settings>,
    /// Tax configuration handed to every rate resolution
    pub rates: TaxRates,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(
        database: DatabaseConnection,
        settings: Arc<Settings>,
        rates: TaxRates,
    ) -> Self {
        Self {
            database,
            settings,
            rates,
        }
    }
}

/// Poise context used by every command
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Message shown to staff for a failed command.
///
/// Input problems are shown as they are; anything else becomes a generic retryable error
/// so internal details never reach the channel.
#[must_use]
pub fn user_facing_message(error: &Error) -> String {
    if error.is_client_error() {
        format!("❌ {error}")
    } else {
        "❌ Something went wrong while processing this request. Please try again.".to_string()
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.is_client_error() {
                info!("Rejected `{}`: {error}", ctx.command().name);
            } else {
                error!("Error in command `{}`: {error:?}", ctx.command().name);
            }
            if let Err(e) = ctx.say(user_facing_message(&error)).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Builds the poise framework and runs the Discord client until it stops.
///
/// # Errors
/// Returns an error if the client cannot be created or the connection fails.
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::tax_report(),
                commands::menu_price(),
                commands::order_place(),
                commands::order_status(),
                commands::ping(),
                commands::help(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Registered commands globally");
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Starting bot client...");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;
    client.start().await?;
    Ok(())
}

pub use commands::*;
pub use handlers::*;
