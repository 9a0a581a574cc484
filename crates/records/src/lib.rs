//! Marketplace records as the engine sees them, plus the lenient raw shapes
//! they are converted from at the store boundary.

mod moderation;
pub mod raw;
mod store;

use catalog::{Period, Product, Role, Season};
use serde::{Deserialize, Serialize};

pub use moderation::{Listed, ModerationQueue, ModerationStats};
pub use store::{RecordSet, RecordStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub region: String,
    pub phone: String,
}

/// A farmer's planting plan. `area` keeps the submitted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmPlantingRecord {
    pub id: String,
    pub user_id: String,
    pub crop: Product,
    pub area: String,
    pub season: Season,
    pub submitted_at_ms: i64,
    #[serde(default)]
    pub approved: bool,
}

/// A trader's demand line. `quantity` keeps the submitted text; use
/// [`DemandRecord::units`] for arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandRecord {
    pub id: String,
    pub user_id: String,
    pub product: Product,
    pub quantity: String,
    pub period: Period,
    pub submitted_at_ms: i64,
    #[serde(default)]
    pub approved: bool,
}

impl DemandRecord {
    pub fn units(&self) -> u64 {
        parse_units(&self.quantity)
    }
}

/// Registration form of a new user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub region: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFarmRecord {
    pub user_id: String,
    pub crop: Product,
    pub area: String,
    pub season: Season,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDemandRecord {
    pub user_id: String,
    pub product: Product,
    pub quantity: String,
    pub period: Period,
}

/// Reads the leading unsigned integer of `text`, the way a browser form
/// value is read back: `" 12kg"` is 12, `"7.9"` is 7, and anything without
/// leading digits (including negatives) is 0. Saturates at `u64::MAX`.
pub fn parse_units(text: &str) -> u64 {
    let text = text.trim();
    let digits = text.strip_prefix('+').unwrap_or(text);
    digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u64, |acc, b| {
            acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
        })
}
