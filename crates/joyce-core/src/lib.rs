//! Core types and trait definitions for Joyce activity streams.
//!
//! This crate is deliberately free of database dependencies. Host entities
//! are referenced polymorphically through [`entity::EntityRef`]; storage
//! backends implement [`store::ActivityStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod activity;
pub mod entity;
pub mod error;
pub mod owner;
pub mod registry;
pub mod store;
pub mod stream;

pub use error::{Error, Result};
