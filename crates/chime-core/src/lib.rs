//! `chime-core`: shared configuration, error taxonomy, and logging setup
//! for the chime workspace.

pub mod config;
pub mod error;
pub mod logging;

pub use config::ChimeConfig;
pub use error::{ChimeError, Result};
