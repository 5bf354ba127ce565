use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Role;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[serde(rename = "gmail")]
    #[validate(email(message = "must be a valid email address"))]
    #[schema(example = "ana@gmail.com")]
    pub identifier: String,

    #[serde(rename = "nome")]
    #[validate(
        custom(function = "crate::utils::non_blank"),
        length(min = 2, max = 120, message = "must be between 2 and 120 characters")
    )]
    #[schema(example = "Ana Souza")]
    pub name: String,

    #[serde(rename = "senha")]
    #[validate(length(min = 6, max = 100, message = "must be between 6 and 100 characters"))]
    #[schema(example = "segredo123", min_length = 6, max_length = 100)]
    pub password: String,

    #[serde(rename = "matricula", default)]
    pub registration: Option<String>,

    #[serde(rename = "curso", default)]
    pub course: Option<String>,

    #[serde(rename = "telefone", default)]
    pub phone: Option<String>,

    /// Defaults to `["ACADEMICO"]` when absent or empty.
    #[serde(default)]
    pub roles: Option<Vec<Role>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(rename = "gmail")]
    #[validate(email(message = "must be a valid email address"))]
    #[schema(example = "ana@gmail.com")]
    pub identifier: String,

    #[serde(rename = "senha")]
    #[validate(custom(function = "crate::utils::non_blank"))]
    #[schema(example = "segredo123")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[serde(rename = "gmail")]
    #[validate(email(message = "must be a valid email address"))]
    #[schema(example = "ana@gmail.com")]
    pub identifier: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(custom(function = "crate::utils::non_blank"))]
    pub token: String,

    #[serde(rename = "novaSenha")]
    #[validate(length(min = 6, max = 100, message = "must be between 6 and 100 characters"))]
    #[schema(example = "novoSegredo456", min_length = 6, max_length = 100)]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiJ9...")]
    pub token: String,
}
