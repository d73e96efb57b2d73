//! Domain models for the CRM billing server
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
