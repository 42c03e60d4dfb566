//! docsync - pull, edit and push documents of a collection-based CMS.
//!
//! The binary wires these modules together; they are exposed as a library so
//! the HTTP gateway and the commands can be tested against a local server.

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod mirror;

pub use client::HttpStore;
pub use config::{Config, ConfigError, Connection, Overrides};
pub use error::{CliError, Result};
pub use mirror::Mirror;
