use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::NewComponent;

fn default_currency() -> String {
    "BRL".to_string()
}

fn default_temp_min() -> i32 {
    -40
}

fn default_temp_max() -> i32 {
    85
}

fn default_status() -> String {
    "active".to_string()
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateComponentRequest {
    #[serde(rename = "partNumber")]
    #[validate(custom(function = "crate::utils::non_blank"))]
    #[schema(example = "LM7805CT")]
    pub part_number: String,

    #[validate(custom(function = "crate::utils::non_blank"))]
    #[schema(example = "Voltage regulator 5V")]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "crate::utils::non_blank"))]
    #[schema(example = "regulators")]
    pub category: String,

    #[serde(default)]
    pub subcategory: Option<String>,

    #[validate(custom(function = "crate::utils::non_blank"))]
    #[schema(example = "Texas Instruments")]
    pub manufacturer: String,

    #[serde(default)]
    pub series: Option<String>,

    #[serde(rename = "packageType")]
    #[validate(custom(function = "crate::utils::non_blank"))]
    #[schema(example = "TO-220")]
    pub package_type: String,

    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub technical_params: Option<serde_json::Map<String, serde_json::Value>>,

    #[serde(default)]
    pub current_stock: i32,

    #[serde(default)]
    pub minimum_stock: i32,

    #[serde(default)]
    pub economic_order_quantity: i32,

    #[serde(default)]
    pub storage_location: Option<String>,

    #[serde(default)]
    pub standard_cost: f64,

    #[serde(default = "default_currency")]
    #[validate(length(equal = 3, message = "must be a 3-letter currency code"))]
    pub currency: String,

    #[serde(default)]
    pub rohs: bool,

    #[serde(default)]
    pub reach: bool,

    #[serde(default)]
    pub msl: Option<String>,

    #[serde(default)]
    pub esd_level: Option<String>,

    #[serde(default = "default_temp_min")]
    pub temp_min: i32,

    #[serde(default = "default_temp_max")]
    pub temp_max: i32,

    /// Opaque datasheet reference.
    #[serde(default)]
    pub datasheet: Option<String>,

    #[serde(default = "default_status")]
    #[validate(custom(function = "crate::utils::non_blank"))]
    pub status: String,
}

impl From<CreateComponentRequest> for NewComponent {
    fn from(req: CreateComponentRequest) -> Self {
        NewComponent {
            part_number: req.part_number,
            name: req.name,
            description: req.description,
            category: req.category,
            subcategory: req.subcategory,
            manufacturer: req.manufacturer,
            series: req.series,
            package_type: req.package_type,
            technical_params: req.technical_params.map(serde_json::Value::Object),
            current_stock: req.current_stock,
            minimum_stock: req.minimum_stock,
            economic_order_quantity: req.economic_order_quantity,
            storage_location: req.storage_location,
            standard_cost: req.standard_cost,
            currency: req.currency,
            rohs: req.rohs,
            reach: req.reach,
            msl: req.msl,
            esd_level: req.esd_level,
            temp_min: req.temp_min,
            temp_max: req.temp_max,
            datasheet: req.datasheet,
            status: req.status,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Case-insensitive fragment of name, part number or manufacturer.
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BarcodeQuery {
    #[serde(default)]
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let req: CreateComponentRequest = serde_json::from_value(serde_json::json!({
            "partNumber": "LM7805CT",
            "name": "Regulator",
            "category": "regulators",
            "manufacturer": "TI",
            "packageType": "TO-220"
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        let component = NewComponent::from(req);
        assert_eq!(component.currency, "BRL");
        assert_eq!(component.status, "active");
        assert_eq!(component.temp_min, -40);
        assert_eq!(component.temp_max, 85);
        assert_eq!(component.current_stock, 0);
        assert!(!component.rohs);
        assert!(component.technical_params.is_none());
    }

    #[test]
    fn test_required_fields_are_reported() {
        let req: CreateComponentRequest = serde_json::from_value(serde_json::json!({
            "partNumber": "",
            "name": "Regulator",
            "category": " ",
            "manufacturer": "TI",
            "packageType": "TO-220"
        }))
        .unwrap();

        let errors = req.validate().unwrap_err();
        let fields = service_core::error::field_errors(&errors);
        assert!(fields.contains_key("partNumber"));
        assert!(fields.contains_key("category"));
        assert!(!fields.contains_key("name"));
    }
}
