//! SQLite backend for the staffing engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. [`SqliteStore`] implements every trait
//! in [`staffing_core::engine`].

mod alerts;
mod assignments;
mod attendance;
mod availability;
mod directory;
mod encode;
mod queries;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
