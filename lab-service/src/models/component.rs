//! Catalog component with stock, cost and compliance data.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: i64,
    pub part_number: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub subcategory: Option<String>,
    pub manufacturer: String,
    pub series: Option<String>,
    pub package_type: String,
    /// Free-form technical parameters, stored as-is.
    #[schema(value_type = Option<Object>)]
    pub technical_params: Option<serde_json::Value>,
    pub current_stock: i32,
    pub minimum_stock: i32,
    pub economic_order_quantity: i32,
    pub storage_location: Option<String>,
    pub standard_cost: f64,
    pub currency: String,
    pub rohs: bool,
    pub reach: bool,
    pub msl: Option<String>,
    pub esd_level: Option<String>,
    pub temp_min: i32,
    pub temp_max: i32,
    pub datasheet: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Component {
    /// Case-insensitive substring match over name, part number and manufacturer.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        [&self.name, &self.part_number, &self.manufacturer]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }
}

/// Validated component ready for insertion.
#[derive(Debug, Clone)]
pub struct NewComponent {
    pub part_number: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub subcategory: Option<String>,
    pub manufacturer: String,
    pub series: Option<String>,
    pub package_type: String,
    pub technical_params: Option<serde_json::Value>,
    pub current_stock: i32,
    pub minimum_stock: i32,
    pub economic_order_quantity: i32,
    pub storage_location: Option<String>,
    pub standard_cost: f64,
    pub currency: String,
    pub rohs: bool,
    pub reach: bool,
    pub msl: Option<String>,
    pub esd_level: Option<String>,
    pub temp_min: i32,
    pub temp_max: i32,
    pub datasheet: Option<String>,
    pub status: String,
}

impl NewComponent {
    pub fn into_component(self, id: i64, now: DateTime<Utc>) -> Component {
        Component {
            id,
            part_number: self.part_number,
            name: self.name,
            description: self.description,
            category: self.category,
            subcategory: self.subcategory,
            manufacturer: self.manufacturer,
            series: self.series,
            package_type: self.package_type,
            technical_params: self.technical_params,
            current_stock: self.current_stock,
            minimum_stock: self.minimum_stock,
            economic_order_quantity: self.economic_order_quantity,
            storage_location: self.storage_location,
            standard_cost: self.standard_cost,
            currency: self.currency,
            rohs: self.rohs,
            reach: self.reach,
            msl: self.msl,
            esd_level: self.esd_level,
            temp_min: self.temp_min,
            temp_max: self.temp_max,
            datasheet: self.datasheet,
            status: self.status,
            created_at: now,
            updated_at: now,
        }
    }
}
