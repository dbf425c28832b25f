//! Core types and rules for the organizational hierarchy service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.
//!
//! - [`role`]: the nine roles and their rank table.
//! - [`policy`]: who may create, edit, delete or promote whom.
//! - [`hierarchy`]: manager/subordinate consistency checks.
//! - [`tree`]: org chart materialisation.
//! - [`promotion`]: the one-step promotion state machine.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod employee;
pub mod error;
pub mod hierarchy;
pub mod policy;
pub mod promotion;
pub mod role;
pub mod store;
pub mod tree;

pub use error::{Error, Result};
