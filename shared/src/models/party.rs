//! Customer identity and frozen party snapshots

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_COUNTRY: &str = "India";

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

/// Billing or shipping party as captured on a document.
///
/// Snapshots are copied at document creation and never follow later edits
/// of the lead they came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartySnapshot {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    /// GSTIN of the party, empty when unregistered
    #[serde(default)]
    pub gst: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub landmark: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default = "default_country")]
    pub country: String,
}

impl Default for PartySnapshot {
    fn default() -> Self {
        Self {
            name: String::new(),
            company: String::new(),
            phone: String::new(),
            email: String::new(),
            gst: String::new(),
            address: String::new(),
            landmark: String::new(),
            city: String::new(),
            state: String::new(),
            pincode: String::new(),
            country: default_country(),
        }
    }
}

/// A CRM lead as seen by the billing pipeline
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Lead {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub gst_number: Option<String>,
    pub billing_address: Option<String>,
    pub billing_landmark: Option<String>,
    pub billing_city: Option<String>,
    pub billing_state: Option<String>,
    pub billing_pincode: Option<String>,
    pub shipping_address: Option<String>,
    pub shipping_landmark: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_state: Option<String>,
    pub shipping_pincode: Option<String>,
}

impl Lead {
    /// "First Last", trimmed
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }

    pub fn billing_state(&self) -> &str {
        self.billing_state.as_deref().unwrap_or("")
    }
}
