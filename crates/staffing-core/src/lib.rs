//! Core types, rules and trait definitions for the staffing engine.
//!
//! This crate is deliberately free of database and I/O dependencies. The
//! placement, attendance and coverage rules live here as plain functions;
//! storage backends gather rows, call them inside a transaction and persist
//! the outcome.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod assignment;
pub mod attendance;
pub mod availability;
pub mod coverage;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod personnel;
pub mod project;
pub mod range;
pub mod settings;
pub mod shift;

pub use error::{Entity, Error, Result};
