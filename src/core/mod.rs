//! Core building blocks of the dataset generator.
//!
//! This module contains the foundations the rest of the pipeline is built
//! on:
//! - Error handling
//! - Run configuration
//! - The deadline-aware task executor
//! - Shared constants
//!
//! It also re-exports the commonly used types for convenience.

pub mod config;
pub mod constants;
pub mod errors;
pub mod executor;

pub use config::GeneratorConfig;
pub use constants::*;
pub use errors::{DatagenError, DatagenResult, GenerationStage};
pub use executor::{TaskHandle, TaskOutcome, run_tasks};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and
/// formatting layer. It's typically called at the start of an application to
/// enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
