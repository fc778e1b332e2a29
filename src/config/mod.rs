/// Database configuration and connection management
pub mod database;

/// Pricing settings from the `[pricing]` table
pub mod pricing;

/// Application configuration loading from config.toml
pub mod settings;
