//! # todo-core
//!
//! Shared vocabulary for the todo task tracker crates:
//!
//! - **Constants**: application name, on-disk locations, default log level
//! - **Logging**: `tracing` subscriber setup and an in-memory capture layer
//!   for asserting on log output in tests

#![deny(unsafe_code)]

pub mod constants;
pub mod logging;

pub use logging::{CapturedLogs, capture_logs, init_subscriber};
