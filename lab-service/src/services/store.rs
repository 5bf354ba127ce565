//! Persistence seams. `Database` backs them with PostgreSQL, `MemoryStore`
//! with in-process maps.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Account, AccountUpdate, Component, NewAccount, NewComponent, Record, RecordKind};

#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the constraint name.
    #[error("Duplicate value violates {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Internal(String),
}

pub const ACCOUNT_IDENTIFIER_KEY: &str = "accounts_identifier_key";
pub const COMPONENT_PART_NUMBER_KEY: &str = "components_part_number_key";

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    async fn find_account_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, StoreError>;

    async fn find_account_by_id(&self, id: i64) -> Result<Option<Account>, StoreError>;

    async fn find_account_by_reset_token(&self, digest: &str)
        -> Result<Option<Account>, StoreError>;

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError>;

    /// Fails with `StoreError::Duplicate(ACCOUNT_IDENTIFIER_KEY)` on a taken identifier.
    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError>;

    async fn update_account(
        &self,
        id: i64,
        update: AccountUpdate,
    ) -> Result<Option<Account>, StoreError>;

    async fn delete_account(&self, id: i64) -> Result<bool, StoreError>;

    /// Replaces any outstanding reset token for the account.
    async fn set_reset_token(
        &self,
        id: i64,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Atomically swaps in `password_hash` and clears the reset token, but
    /// only while `digest` is still the account's token and its expiry is
    /// after `now`. `None` means nothing matched.
    async fn complete_password_reset(
        &self,
        digest: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError>;

    async fn set_device_token(
        &self,
        identifier: &str,
        device_token: &str,
    ) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait ComponentStore: Send + Sync {
    /// Fails with `StoreError::Duplicate(COMPONENT_PART_NUMBER_KEY)` on a taken part number.
    async fn insert_component(&self, component: NewComponent) -> Result<Component, StoreError>;

    async fn list_components(&self) -> Result<Vec<Component>, StoreError>;

    async fn find_component(&self, id: i64) -> Result<Option<Component>, StoreError>;

    async fn find_component_by_part_number(
        &self,
        part_number: &str,
    ) -> Result<Option<Component>, StoreError>;

    async fn search_components(&self, term: &str) -> Result<Vec<Component>, StoreError>;

    async fn list_components_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Component>, StoreError>;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_record(
        &self,
        kind: RecordKind,
        data: serde_json::Value,
        created_by: &str,
    ) -> Result<Record, StoreError>;

    /// Oldest first.
    async fn list_records(&self, kind: RecordKind) -> Result<Vec<Record>, StoreError>;
}
