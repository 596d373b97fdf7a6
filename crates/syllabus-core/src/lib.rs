//! Core types and the ordered-content synchronization layer for Syllabus.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Backends implement [`store::SubjectStore`]; the editor drives a
//! [`coordinator::SubjectCoordinator`] and one [`autosave::AutosaveField`] per
//! free-text input.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod autosave;
pub mod content;
pub mod coordinator;
pub mod draft;
pub mod error;
pub mod store;
pub mod subject;
pub mod user;

#[cfg(test)]
mod testing;

pub use error::{ErrorKind, OperationError, Result};
