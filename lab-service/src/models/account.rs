//! Account model - a registered identity with credentials and roles.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::Role;

/// Account entity as persisted.
///
/// Deliberately not `Serialize`: the password hash and reset token digest
/// must never leave the service. Use [`AccountResponse`] for output.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    /// Unique email-like login identifier.
    pub identifier: String,
    pub name: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub active: bool,
    /// Academic registration number.
    pub registration: Option<String>,
    pub course: Option<String>,
    pub phone: Option<String>,
    pub device_token: Option<String>,
    /// SHA-256 digest of the outstanding reset token.
    pub reset_token_hash: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to insert an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub identifier: String,
    pub name: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub active: bool,
    pub registration: Option<String>,
    pub course: Option<String>,
    pub phone: Option<String>,
}

/// Partial update applied by administrators. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub course: Option<String>,
    pub phone: Option<String>,
    pub active: Option<bool>,
    pub roles: Option<Vec<Role>>,
    pub password_hash: Option<String>,
}

/// Account as returned by the API (no credentials).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountResponse {
    pub id: i64,
    #[serde(rename = "gmail")]
    pub identifier: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "matricula")]
    pub registration: Option<String>,
    #[serde(rename = "curso")]
    pub course: Option<String>,
    #[serde(rename = "telefone")]
    pub phone: Option<String>,
    #[serde(rename = "ativo")]
    pub active: bool,
    pub roles: Vec<Role>,
    #[serde(rename = "criadoEm")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "atualizadoEm")]
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            identifier: a.identifier,
            name: a.name,
            registration: a.registration,
            course: a.course,
            phone: a.phone,
            active: a.active,
            roles: a.roles,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_omits_credentials() {
        let now = Utc::now();
        let account = Account {
            id: 7,
            identifier: "ana@gmail.com".to_string(),
            name: "Ana".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            roles: vec![Role::Academico],
            active: true,
            registration: Some("2023001".to_string()),
            course: None,
            phone: None,
            device_token: Some("device".to_string()),
            reset_token_hash: Some("digest".to_string()),
            reset_token_expires_at: Some(now),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(AccountResponse::from(account)).unwrap();
        assert_eq!(json["gmail"], "ana@gmail.com");
        assert_eq!(json["matricula"], "2023001");
        assert_eq!(json["roles"][0], "ACADEMICO");

        let text = json.to_string();
        assert!(!text.contains("argon2"));
        assert!(!text.contains("digest"));
        assert!(!text.contains("device"));
    }
}
