use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Role;

/// Administrative account creation. Same hashing and default-role rules as
/// self-registration.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[serde(rename = "gmail")]
    #[validate(email(message = "must be a valid email address"))]
    #[schema(example = "professor@gmail.com")]
    pub identifier: String,

    #[serde(rename = "nome")]
    #[validate(
        custom(function = "crate::utils::non_blank"),
        length(min = 2, max = 120, message = "must be between 2 and 120 characters")
    )]
    pub name: String,

    #[serde(rename = "senha")]
    #[validate(length(min = 6, max = 100, message = "must be between 6 and 100 characters"))]
    pub password: String,

    #[serde(rename = "matricula", default)]
    pub registration: Option<String>,

    #[serde(rename = "curso", default)]
    pub course: Option<String>,

    #[serde(rename = "telefone", default)]
    pub phone: Option<String>,

    #[serde(rename = "ativo", default)]
    pub active: Option<bool>,

    #[serde(default)]
    pub roles: Option<Vec<Role>>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(rename = "nome", default)]
    #[validate(
        custom(function = "crate::utils::non_blank"),
        length(min = 2, max = 120, message = "must be between 2 and 120 characters")
    )]
    pub name: Option<String>,

    #[serde(rename = "curso", default)]
    pub course: Option<String>,

    #[serde(rename = "telefone", default)]
    pub phone: Option<String>,

    #[serde(rename = "ativo", default)]
    pub active: Option<bool>,

    #[serde(default)]
    #[validate(length(min = 1, message = "must contain at least one role"))]
    pub roles: Option<Vec<Role>>,

    /// New plaintext password; hashed before storage.
    #[serde(rename = "senha", default)]
    #[validate(length(min = 6, max = 100, message = "must be between 6 and 100 characters"))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRolesRequest {
    #[validate(length(min = 1, message = "must contain at least one role"))]
    pub roles: Vec<Role>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeviceTokenRequest {
    #[serde(rename = "deviceToken")]
    #[validate(
        custom(function = "crate::utils::non_blank"),
        length(max = 512, message = "must be at most 512 characters")
    )]
    pub device_token: String,
}
