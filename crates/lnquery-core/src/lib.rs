//! Core types and configuration for lnquery.
//!
//! This crate provides the channel data model, configuration management,
//! and error types used across the lnquery workspace.

mod channel;
mod config;
mod error;

pub use channel::{
    Channel, ChannelSummary, EnrichedChannel, EnrichmentError, EnrichmentErrorKind,
    HealthCriteria,
};
pub use config::{Config, NodeConfig};
pub use error::{Error, Result, sanitize_error_message};
