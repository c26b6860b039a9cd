//! Inventory models: product types, stock entries and donations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::column_enum;
use super::organization::Organization;

column_enum! {
    /// Kind of place stock can sit in or move between.
    pub enum LocationType {
        #[default]
        Organization => "ORGANIZATION",
        Housing => "HOUSING",
        Beneficiary => "BENEFICIARY",
    }
}

column_enum! {
    pub enum EntryType {
        #[default]
        Entrance => "ENTRANCE",
        Donation => "DONATION",
        Reallocation => "REALLOCATION",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductType {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    pub organization_id: Uuid,
    #[serde(default)]
    pub organization: Organization,
    #[serde(default)]
    pub unit_type: String,
    #[serde(default)]
    pub total_in_storage: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub unit_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub unit_type: Option<String>,
}

/// Stock bands: in stock (> 10), low (1..=10), out (0). The three bands
/// partition `total_products`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct InventoryStats {
    pub total_products: u64,
    pub in_stock_products: u64,
    pub low_stock_products: u64,
    pub out_of_stock_products: u64,
    pub total_quantity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EntryLocation {
    pub id: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
}

/// One movement of stock. Donations come from the `donations` table; other
/// entries are derived from the product's current state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductEntry {
    pub id: String,
    pub product_type_id: Uuid,
    pub product_type: ProductType,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub quantity: u64,
    pub from: EntryLocation,
    pub to: EntryLocation,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub organization_id: Uuid,
    #[serde(default)]
    pub organization: Organization,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddStock {
    pub quantity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveStock {
    pub from: EntryLocation,
    pub to: EntryLocation,
    pub quantity: u64,
}

/// Outcome of a stock change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockLevel {
    pub product_type_id: Uuid,
    pub total_in_storage: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageLocation {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageRecord {
    pub id: String,
    pub location: StorageLocation,
    pub quantity: u64,
}
