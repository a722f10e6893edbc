//! Core types for the Apstra MCP server
//!
//! # Modules
//!
//! - `config`: Configuration loading (environment, env file, TOML file)
//! - `error`: Error types and Result alias

pub mod config;
pub mod error;

// Re-exports
pub use crate::config::{ApstraConfig, ConfigSources};
pub use crate::error::{Error, Result};
