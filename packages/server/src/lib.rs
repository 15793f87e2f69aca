//! HTTP surface for the company enrichment pipeline.

pub mod config;
pub mod kernel;
pub mod server;

pub use config::Config;
