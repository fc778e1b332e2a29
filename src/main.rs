use pricedesk::{
    bot::{self, BotData},
    config::{database, settings},
    core::{service::PricingService, store::DbOverrideRepository},
    errors::{Error, Result},
};
use std::{env, sync::Arc};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
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
    dotenvy::dotenv().ok();

    // 3. Load catalog and pricing settings
    let (catalog, pricing_settings) = settings::load_default_config()
        .and_then(settings::AppConfig::into_parts)
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!(
        product_types = catalog.product_types().len(),
        default_margin = pricing_settings.default_margin,
        currency = %pricing_settings.currency,
        "Configuration loaded"
    );

    // 4. Connect to the database and create tables
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Build the pricing service and log its change notifications
    let pricing = PricingService::new(
        DbOverrideRepository::new(db.clone()),
        Arc::new(catalog),
        pricing_settings,
    );
    let mut events = pricing.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!(?event, "Price event"),
                Err(RecvError::Lagged(missed)) => warn!(missed, "Price event log fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // 6. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, BotData::new(db, pricing)).await
}
