//! Ambient utilities shared by every crate in the agent flow runtime.
//!
//! `flow-tooling` carries the concerns that have nothing to do with flow
//! semantics but that every node, resource, and adapter needs anyway:
//! structured logging helpers, error-chain formatting, `.env`/environment
//! loading, and a couple of small async utilities (retry, timeout). It has
//! no dependency on `flow-core` so that it can be reused by tests and
//! examples without pulling in the scheduler.

pub mod async_utils;
pub mod config;
pub mod error;
pub mod logging;

pub use error::ToolingError;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ToolingError>;
