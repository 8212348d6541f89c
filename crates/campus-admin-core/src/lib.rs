//! Core types and utilities for the campus admin dashboard
//!
//! This crate holds everything that does not talk to the network: the entity
//! schema registry, the record model, the pure list filter, the form engine
//! and the per-view cache used by the web layer.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod config;
pub mod confirm;
pub mod error;
pub mod filter;
pub mod form;
pub mod list;
pub mod record;
pub mod schema;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, LogFormat, LoggingConfig};
pub use confirm::ConfirmDialog;
pub use error::{Error, Result};
pub use filter::{ListQuery, filter_records};
pub use form::{FormAction, FormState, ModuleGroup, Part, Payload, SubmitMode, Upload};
pub use list::{LocalCollection, PhaseEvent, ViewPhase, WriteTicket};
pub use record::{Record, RecordId};
pub use schema::{EntitySchema, FieldKind, FieldSpec};

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    };

    installed.map_err(|e| Error::Other(format!("Failed to initialize logging: {e}")))
}
