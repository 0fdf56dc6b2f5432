//! Core types and trait definitions for the outreach encounter tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it. The only storage it ships is
//! [`memory::MemoryStore`], which keeps rows in process memory.

// Store impls use plain `async fn`; the trait itself spells out `+ Send`.
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod encounter;
pub mod error;
pub mod memory;
pub mod store;

pub use error::{Error, Result};
