//! PostgreSQL-backed store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use tracing::{info, instrument};

use super::store::{AccountStore, ComponentStore, RecordStore, StoreError};
use crate::models::{Account, AccountUpdate, Component, NewAccount, NewComponent, Record, RecordKind, Role};

const ACCOUNT_COLUMNS: &str = "id, identifier, name, password_hash, roles, active, registration, \
     course, phone, device_token, reset_token_hash, reset_token_expires_at, created_at, updated_at";

const COMPONENT_COLUMNS: &str = "id, part_number, name, description, category, subcategory, \
     manufacturer, series, package_type, technical_params, current_stock, minimum_stock, \
     economic_order_quantity, storage_location, standard_cost, currency, rohs, reach, msl, \
     esd_level, temp_min, temp_max, datasheet, status, created_at, updated_at";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    identifier: String,
    name: String,
    password_hash: String,
    roles: Vec<String>,
    active: bool,
    registration: Option<String>,
    course: Option<String>,
    phone: Option<String>,
    device_token: Option<String>,
    reset_token_hash: Option<String>,
    reset_token_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let roles = row
            .roles
            .iter()
            .map(|r| r.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::Internal)?;

        Ok(Account {
            id: row.id,
            identifier: row.identifier,
            name: row.name,
            password_hash: row.password_hash,
            roles,
            active: row.active,
            registration: row.registration,
            course: row.course,
            phone: row.phone,
            device_token: row.device_token,
            reset_token_hash: row.reset_token_hash,
            reset_token_expires_at: row.reset_token_expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn role_names(roles: &[Role]) -> Vec<String> {
    roles.iter().map(|r| r.as_str().to_string()).collect()
}

/// Unique violations become `Duplicate(constraint)`; everything else passes through.
fn map_write_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            StoreError::Duplicate(db_err.constraint().unwrap_or_default().to_string())
        }
        other => StoreError::Database(other),
    }
}

/// `%term%` with LIKE metacharacters escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn account_query(filter: &str) -> String {
    format!("SELECT {} FROM accounts WHERE {}", ACCOUNT_COLUMNS, filter)
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for Database {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_account_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, StoreError> {
        sqlx::query_as::<_, AccountRow>(&account_query("identifier = $1"))
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn find_account_by_id(&self, id: i64) -> Result<Option<Account>, StoreError> {
        sqlx::query_as::<_, AccountRow>(&account_query("id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    #[instrument(skip_all)]
    async fn find_account_by_reset_token(
        &self,
        digest: &str,
    ) -> Result<Option<Account>, StoreError> {
        sqlx::query_as::<_, AccountRow>(&account_query("reset_token_hash = $1"))
            .bind(digest)
            .fetch_optional(&self.pool)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let sql = format!("SELECT {} FROM accounts ORDER BY id", ACCOUNT_COLUMNS);
        sqlx::query_as::<_, AccountRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    #[instrument(skip(self, account), fields(identifier = %account.identifier))]
    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO accounts (identifier, name, password_hash, roles, active, registration, course, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(&account.identifier)
            .bind(&account.name)
            .bind(&account.password_hash)
            .bind(role_names(&account.roles))
            .bind(account.active)
            .bind(&account.registration)
            .bind(&account.course)
            .bind(&account.phone)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;

        info!(account_id = row.id, "Account inserted");
        Account::try_from(row)
    }

    #[instrument(skip(self, update))]
    async fn update_account(
        &self,
        id: i64,
        update: AccountUpdate,
    ) -> Result<Option<Account>, StoreError> {
        let sql = format!(
            r#"
            UPDATE accounts SET
                name = COALESCE($2, name),
                course = COALESCE($3, course),
                phone = COALESCE($4, phone),
                active = COALESCE($5, active),
                roles = COALESCE($6, roles),
                password_hash = COALESCE($7, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );

        sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .bind(&update.name)
            .bind(&update.course)
            .bind(&update.phone)
            .bind(update.active)
            .bind(update.roles.as_deref().map(role_names))
            .bind(&update.password_hash)
            .fetch_optional(&self.pool)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn delete_account(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, digest))]
    async fn set_reset_token(
        &self,
        id: i64,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET reset_token_hash = $2, reset_token_expires_at = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(digest)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn complete_password_reset(
        &self,
        digest: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError> {
        let sql = format!(
            r#"
            UPDATE accounts
            SET password_hash = $2,
                reset_token_hash = NULL,
                reset_token_expires_at = NULL,
                updated_at = $3
            WHERE reset_token_hash = $1 AND reset_token_expires_at > $3
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );

        sqlx::query_as::<_, AccountRow>(&sql)
            .bind(digest)
            .bind(password_hash)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    #[instrument(skip(self, device_token))]
    async fn set_device_token(
        &self,
        identifier: &str,
        device_token: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE accounts SET device_token = $2, updated_at = NOW() WHERE identifier = $1",
        )
        .bind(identifier)
        .bind(device_token)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ComponentStore for Database {
    #[instrument(skip(self, component), fields(part_number = %component.part_number))]
    async fn insert_component(&self, component: NewComponent) -> Result<Component, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO components (
                part_number, name, description, category, subcategory, manufacturer, series,
                package_type, technical_params, current_stock, minimum_stock,
                economic_order_quantity, storage_location, standard_cost, currency, rohs, reach,
                msl, esd_level, temp_min, temp_max, datasheet, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20, $21, $22, $23)
            RETURNING {}
            "#,
            COMPONENT_COLUMNS
        );

        let stored = sqlx::query_as::<_, Component>(&sql)
            .bind(&component.part_number)
            .bind(&component.name)
            .bind(&component.description)
            .bind(&component.category)
            .bind(&component.subcategory)
            .bind(&component.manufacturer)
            .bind(&component.series)
            .bind(&component.package_type)
            .bind(&component.technical_params)
            .bind(component.current_stock)
            .bind(component.minimum_stock)
            .bind(component.economic_order_quantity)
            .bind(&component.storage_location)
            .bind(component.standard_cost)
            .bind(&component.currency)
            .bind(component.rohs)
            .bind(component.reach)
            .bind(&component.msl)
            .bind(&component.esd_level)
            .bind(component.temp_min)
            .bind(component.temp_max)
            .bind(&component.datasheet)
            .bind(&component.status)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;

        info!(component_id = stored.id, "Component inserted");
        Ok(stored)
    }

    async fn list_components(&self) -> Result<Vec<Component>, StoreError> {
        let sql = format!("SELECT {} FROM components ORDER BY id", COMPONENT_COLUMNS);
        Ok(sqlx::query_as::<_, Component>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_component(&self, id: i64) -> Result<Option<Component>, StoreError> {
        let sql = format!("SELECT {} FROM components WHERE id = $1", COMPONENT_COLUMNS);
        Ok(sqlx::query_as::<_, Component>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_component_by_part_number(
        &self,
        part_number: &str,
    ) -> Result<Option<Component>, StoreError> {
        let sql = format!(
            "SELECT {} FROM components WHERE part_number = $1",
            COMPONENT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Component>(&sql)
            .bind(part_number)
            .fetch_optional(&self.pool)
            .await?)
    }

    #[instrument(skip(self))]
    async fn search_components(&self, term: &str) -> Result<Vec<Component>, StoreError> {
        let sql = format!(
            r#"
            SELECT {} FROM components
            WHERE name ILIKE $1 OR part_number ILIKE $1 OR manufacturer ILIKE $1
            ORDER BY id
            "#,
            COMPONENT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Component>(&sql)
            .bind(like_pattern(term))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_components_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Component>, StoreError> {
        let sql = format!(
            "SELECT {} FROM components WHERE category = $1 ORDER BY id",
            COMPONENT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Component>(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await?)
    }
}

#[async_trait]
impl RecordStore for Database {
    #[instrument(skip(self, data))]
    async fn insert_record(
        &self,
        kind: RecordKind,
        data: serde_json::Value,
        created_by: &str,
    ) -> Result<Record, StoreError> {
        Ok(sqlx::query_as::<_, Record>(
            r#"
            INSERT INTO lab_records (kind, data, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, data, created_by, created_at
            "#,
        )
        .bind(kind.as_str())
        .bind(&data)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_records(&self, kind: RecordKind) -> Result<Vec<Record>, StoreError> {
        Ok(sqlx::query_as::<_, Record>(
            "SELECT id, data, created_by, created_at FROM lab_records WHERE kind = $1 ORDER BY id",
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("LM7805"), "%LM7805%");
        assert_eq!(like_pattern("50%_x"), "%50\\%\\_x%");
    }

    #[test]
    fn test_stored_roles_parse_back() {
        let now = Utc::now();
        let row = AccountRow {
            id: 1,
            identifier: "ana@gmail.com".to_string(),
            name: "Ana".to_string(),
            password_hash: "hash".to_string(),
            roles: role_names(&[Role::Professor, Role::Admin]),
            active: true,
            registration: None,
            course: None,
            phone: None,
            device_token: None,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        };
        let account = Account::try_from(row).unwrap();
        assert_eq!(account.roles, vec![Role::Professor, Role::Admin]);
    }
}
