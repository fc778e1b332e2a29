//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions such as autocomplete
//! and other non-command interactions.

/// Autocomplete handlers for catalog identifiers and sourced item names
pub mod autocomplete;
