//! Shared types and models for the delivery tracker
//!
//! This crate contains types shared between the backend, the browser
//! frontend (via WASM), and the persisted document formats.

pub mod catalog;
pub mod models;
pub mod types;
pub mod validation;

pub use catalog::*;
pub use models::*;
pub use types::*;
pub use validation::*;
