//! Wire contract with the reporting backend.
//!
//! Request and response DTOs for the JSON endpoints. The shapes are
//! fixed by the server; panels never consume these directly, they build
//! [`crate::models`] values from them.

pub mod types;

pub use types::*;
