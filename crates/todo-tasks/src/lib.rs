//! # todo-tasks
//!
//! Task model, validation, and the `SQLite`-backed [`TaskStore`].
//!
//! - [`Task`] is the single persisted entity. Priority and status are kept as
//!   the caller wrote them and checked against [`Priority`] / [`Status`].
//! - [`TaskStore`] wraps an r2d2 pool and exposes create, update, delete, get,
//!   filtered listing, completion, and bulk archiving.
//! - [`parse_human_date`] turns `today`, `tomorrow`, `next week`, or a
//!   concrete date string into a local timestamp.
//!
//! Storage internals live in [`repository`] (stateless SQL over a
//! `&Connection`) and [`migrations`].

#![deny(unsafe_code)]

pub mod connection;
pub mod dates;
pub mod errors;
pub mod migrations;
pub mod model;
pub mod repository;
pub mod store;
pub mod types;

pub use connection::{ConnectionConfig, ConnectionPool};
pub use dates::{parse_human_date, parse_human_date_at};
pub use errors::{Result, TaskError};
pub use model::{Priority, Status, Task, tags_from_string, tags_to_string};
pub use store::TaskStore;
pub use types::{TagCount, TaskFilter};
