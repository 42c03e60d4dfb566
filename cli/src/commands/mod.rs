//! Command implementations.
//!
//! Each command takes the store, the local mirror and an output sink, so the
//! same code runs against the HTTP gateway in the binary and against an
//! in-memory store in tests.

pub mod get;
pub mod list;
pub mod update;

pub use docsync_engine::display_revision;

