//! Core functionality for the EV dashboard
//!
//! This crate provides the event bus, the selection state shared by every
//! widget, the resize debouncer and the dashboard configuration.

pub mod config;
pub mod debounce;
pub mod events;
pub mod state;

use thiserror::Error;

// Re-export commonly used types
pub use config::{DashboardConfig, ProjectEntry, ViewSpec};
pub use debounce::Debouncer;
pub use events::{names, BusEvent, EventBus, EventHandler, PublishReport, Subscription};
pub use state::{ProjectId, ProjectSelection};

/// Errors raised while setting up the dashboard
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid project id: {0:?}")]
    InvalidProjectId(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
