//! Domain models for the quotation-to-invoice pipeline

mod invoice;
mod party;
mod product;
mod quotation;
mod settings;
mod work_order;

pub use invoice::*;
pub use party::*;
pub use product::*;
pub use quotation::*;
pub use settings::*;
pub use work_order::*;
