//! In-process store used by the test suite and `STORAGE_BACKEND=memory`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::store::{
    AccountStore, ComponentStore, RecordStore, StoreError, ACCOUNT_IDENTIFIER_KEY,
    COMPONENT_PART_NUMBER_KEY,
};
use crate::models::{Account, AccountUpdate, Component, NewAccount, NewComponent, Record, RecordKind};

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<i64, Account>,
    components: BTreeMap<i64, Component>,
    records: BTreeMap<i64, (RecordKind, Record)>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// One mutex guards every table; it is never held across an `.await`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|e| StoreError::Internal(format!("Memory store mutex poisoned: {}", e)))
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    async fn find_account_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, StoreError> {
        Ok(self
            .lock()?
            .accounts
            .values()
            .find(|a| a.identifier == identifier)
            .cloned())
    }

    async fn find_account_by_id(&self, id: i64) -> Result<Option<Account>, StoreError> {
        Ok(self.lock()?.accounts.get(&id).cloned())
    }

    async fn find_account_by_reset_token(
        &self,
        digest: &str,
    ) -> Result<Option<Account>, StoreError> {
        Ok(self
            .lock()?
            .accounts
            .values()
            .find(|a| a.reset_token_hash.as_deref() == Some(digest))
            .cloned())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.lock()?.accounts.values().cloned().collect())
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut tables = self.lock()?;
        if tables
            .accounts
            .values()
            .any(|a| a.identifier == account.identifier)
        {
            return Err(StoreError::Duplicate(ACCOUNT_IDENTIFIER_KEY.to_string()));
        }

        let id = tables.next_id();
        let now = Utc::now();
        let stored = Account {
            id,
            identifier: account.identifier,
            name: account.name,
            password_hash: account.password_hash,
            roles: account.roles,
            active: account.active,
            registration: account.registration,
            course: account.course,
            phone: account.phone,
            device_token: None,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.accounts.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_account(
        &self,
        id: i64,
        update: AccountUpdate,
    ) -> Result<Option<Account>, StoreError> {
        let mut tables = self.lock()?;
        let Some(account) = tables.accounts.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            account.name = name;
        }
        if let Some(course) = update.course {
            account.course = Some(course);
        }
        if let Some(phone) = update.phone {
            account.phone = Some(phone);
        }
        if let Some(active) = update.active {
            account.active = active;
        }
        if let Some(roles) = update.roles {
            account.roles = roles;
        }
        if let Some(hash) = update.password_hash {
            account.password_hash = hash;
        }
        account.updated_at = Utc::now();

        Ok(Some(account.clone()))
    }

    async fn delete_account(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.lock()?.accounts.remove(&id).is_some())
    }

    async fn set_reset_token(
        &self,
        id: i64,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if let Some(account) = tables.accounts.get_mut(&id) {
            account.reset_token_hash = Some(digest.to_string());
            account.reset_token_expires_at = Some(expires_at);
            account.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn complete_password_reset(
        &self,
        digest: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError> {
        let mut tables = self.lock()?;
        let Some(account) = tables.accounts.values_mut().find(|a| {
            a.reset_token_hash.as_deref() == Some(digest)
                && a.reset_token_expires_at.is_some_and(|exp| exp > now)
        }) else {
            return Ok(None);
        };

        account.password_hash = password_hash.to_string();
        account.reset_token_hash = None;
        account.reset_token_expires_at = None;
        account.updated_at = now;
        Ok(Some(account.clone()))
    }

    async fn set_device_token(
        &self,
        identifier: &str,
        device_token: &str,
    ) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        match tables
            .accounts
            .values_mut()
            .find(|a| a.identifier == identifier)
        {
            Some(account) => {
                account.device_token = Some(device_token.to_string());
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ComponentStore for MemoryStore {
    async fn insert_component(&self, component: NewComponent) -> Result<Component, StoreError> {
        let mut tables = self.lock()?;
        if tables
            .components
            .values()
            .any(|c| c.part_number == component.part_number)
        {
            return Err(StoreError::Duplicate(COMPONENT_PART_NUMBER_KEY.to_string()));
        }

        let id = tables.next_id();
        let stored = component.into_component(id, Utc::now());
        tables.components.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_components(&self) -> Result<Vec<Component>, StoreError> {
        Ok(self.lock()?.components.values().cloned().collect())
    }

    async fn find_component(&self, id: i64) -> Result<Option<Component>, StoreError> {
        Ok(self.lock()?.components.get(&id).cloned())
    }

    async fn find_component_by_part_number(
        &self,
        part_number: &str,
    ) -> Result<Option<Component>, StoreError> {
        Ok(self
            .lock()?
            .components
            .values()
            .find(|c| c.part_number == part_number)
            .cloned())
    }

    async fn search_components(&self, term: &str) -> Result<Vec<Component>, StoreError> {
        Ok(self
            .lock()?
            .components
            .values()
            .filter(|c| c.matches(term))
            .cloned()
            .collect())
    }

    async fn list_components_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Component>, StoreError> {
        Ok(self
            .lock()?
            .components
            .values()
            .filter(|c| c.category == category)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_record(
        &self,
        kind: RecordKind,
        data: serde_json::Value,
        created_by: &str,
    ) -> Result<Record, StoreError> {
        let mut tables = self.lock()?;
        let id = tables.next_id();
        let record = Record {
            id,
            data,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        tables.records.insert(id, (kind, record.clone()));
        Ok(record)
    }

    async fn list_records(&self, kind: RecordKind) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .lock()?
            .records
            .values()
            .filter(|(k, _)| *k == kind)
            .map(|(_, r)| r.clone())
            .collect())
    }
}
