//! Chat-driven crypto quote bot.
//!
//! Fetches market data from the exchange's public REST API and answers
//! chat queries for prices, volumes, daily stats and the product list.
//! The interesting part is the cache layer: a fetch-once product catalog
//! and a per-product ticker cache whose staleness is judged from the
//! exchange's own trade timestamps.

pub mod cache;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod stats;

pub use error::{QuotelineError, Result};
