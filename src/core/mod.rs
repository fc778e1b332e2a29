//! Core business logic - framework-agnostic pricing operations.
//!
//! `pricing` and `currency` are pure arithmetic. `overrides` applies those to an
//! in-memory override history, `store` persists that history behind a repository
//! trait, and `service` is the API callers use. `sourcing` manages items bought in
//! a foreign currency.

/// Reference catalog of product types and variants
pub mod catalog;
/// Foreign sourcing price to local cost conversion
pub mod currency;
/// Override store sync and bulk rewrite over record lists
pub mod overrides;
/// Sale price and margin derivation, low-margin policy
pub mod pricing;
/// Caller-facing pricing API
pub mod service;
/// Currency-sourced catalog items
pub mod sourcing;
/// Override repositories (in-memory and SQL)
pub mod store;
