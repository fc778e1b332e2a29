//! Bot layer - Discord-specific interface and command handlers
//!
//! This module exposes the pricing service to staff as Discord slash commands,
//! including autocomplete handlers and the shared bot context.

/// Discord command implementations (price, sourcing, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    core::{service::PricingService, store::DbOverrideRepository},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands.
/// This structure holds the database connection and the pricing service that
/// commands call into.
pub struct BotData {
    /// Database connection for sourced item operations
    pub database: DatabaseConnection,
    /// Pricing API backed by the `price_overrides` table
    pub pricing: PricingService<DbOverrideRepository>,
}

impl BotData {
    /// Creates a new `BotData` instance over one database connection.
    #[must_use]
    pub const fn new(
        database: DatabaseConnection,
        pricing: PricingService<DbOverrideRepository>,
    ) -> Self {
        Self { database, pricing }
    }

    /// Currency code used when displaying prices.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.pricing.settings().currency
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(format!("❌ An error occurred: {error}")).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Builds the poise framework, registers all commands globally and runs the client
/// until it stops.
///
/// # Errors
/// Returns an error if the client cannot be created or the gateway connection fails.
#[instrument(skip(token, data))]
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    // Slash commands only; no message content needed
    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot client...");
    client.start().await.map_err(Into::into)
}

pub use commands::*;
pub use handlers::*;
