//! Shared domain engine for the CRM billing pipeline
//!
//! Pure, I/O-free logic shared by the backend and the browser (via WASM):
//! GST line pricing, document totals, numbering, version chains, document
//! state rules and snapshot propagation.

pub mod error;
pub mod lifecycle;
pub mod models;
pub mod numbering;
pub mod snapshot;
pub mod tax;
pub mod totals;
pub mod types;
pub mod validation;
pub mod versioning;

pub use error::*;
pub use models::*;
pub use types::*;
pub use validation::*;
