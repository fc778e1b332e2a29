//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// General utility commands
pub mod general;

/// Price override commands
pub mod price;

/// Currency-sourced item commands
pub mod sourcing;

use crate::{bot::BotData, errors::Error};

// Export commands
pub use general::*;
pub use price::*;
pub use sourcing::*;

/// Every top-level command the bot registers.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    vec![ping(), help(), price(), sourcing()]
}
