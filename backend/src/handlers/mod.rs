//! HTTP handlers for the CRM billing server

mod health;
mod invoice;
mod quotation;
mod settings;
mod storefront;
mod work_order;

pub use health::*;
pub use invoice::*;
pub use quotation::*;
pub use settings::*;
pub use storefront::*;
pub use work_order::*;
