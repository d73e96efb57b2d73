//! Business logic services for the quotation, work order and invoice pipeline

pub mod directory;
#[cfg(test)]
mod fixtures;
pub mod invoice;
pub mod quotation;
pub mod sequence;
pub mod settings;
pub mod storefront;
pub mod work_order;

pub use invoice::InvoiceService;
pub use quotation::QuotationService;
pub use settings::SettingsService;
pub use storefront::StorefrontService;
pub use work_order::WorkOrderService;
