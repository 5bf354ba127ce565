//! Account lifecycle: registration, login, password reset and the
//! administrative operations on accounts.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use super::{
    jwt::JwtService,
    notifier::ResetNotifier,
    store::{AccountStore, StoreError},
    ServiceError,
};
use crate::{
    dtos::{
        auth::RegisterRequest,
        users::{CreateUserRequest, UpdateUserRequest},
    },
    models::{normalize_roles, Account, AccountResponse, AccountUpdate, NewAccount, Role},
    utils::{
        digest_token, dummy_password_hash, generate_reset_token, hash_password, verify_password,
        Password, PasswordHashString,
    },
};

type VerifyFn = fn(&Password, &PasswordHashString) -> Result<bool, anyhow::Error>;

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    jwt: JwtService,
    notifier: Arc<dyn ResetNotifier>,
    reset_token_ttl: Duration,
    verify: VerifyFn,
}

fn hash(plaintext: &str) -> Result<String, ServiceError> {
    hash_password(&Password::new(plaintext))
        .map(PasswordHashString::into_string)
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))
}

fn map_insert_error(err: StoreError) -> ServiceError {
    match err {
        StoreError::Duplicate(_) => ServiceError::DuplicateIdentifier,
        other => ServiceError::Store(other),
    }
}

impl AccountService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        jwt: JwtService,
        notifier: Arc<dyn ResetNotifier>,
        reset_token_ttl: Duration,
    ) -> Self {
        Self {
            store,
            jwt,
            notifier,
            reset_token_ttl,
            verify: verify_password,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_verifier(mut self, verify: VerifyFn) -> Self {
        self.verify = verify;
        self
    }

    fn issue_token(&self, account: &Account) -> Result<String, ServiceError> {
        self.jwt
            .issue(&account.identifier, &account.roles)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Token issuance failed: {}", e)))
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, ServiceError> {
        if self
            .store
            .find_account_by_identifier(&account.identifier)
            .await?
            .is_some()
        {
            return Err(ServiceError::DuplicateIdentifier);
        }

        // The unique constraint still catches a concurrent insert that passed the check.
        self.store.insert_account(account).await.map_err(map_insert_error)
    }

    /// Create an account and return a session token for it.
    pub async fn register(&self, req: RegisterRequest) -> Result<String, ServiceError> {
        let account = self
            .insert(NewAccount {
                identifier: req.identifier,
                name: req.name,
                password_hash: hash(&req.password)?,
                roles: normalize_roles(req.roles),
                active: true,
                registration: req.registration,
                course: req.course,
                phone: req.phone,
            })
            .await?;

        tracing::info!(account_id = account.id, roles = ?account.roles, "Account registered");

        self.issue_token(&account)
    }

    /// Unknown identifier, wrong password and inactive account are
    /// indistinguishable to the caller.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<String, ServiceError> {
        let account = self.store.find_account_by_identifier(identifier).await?;

        // Unknown identifiers still pay for one verification.
        let stored = match &account {
            Some(account) => PasswordHashString::new(account.password_hash.clone()),
            None => dummy_password_hash()
                .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?
                .clone(),
        };

        let matches = (self.verify)(&Password::new(password), &stored).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Stored password hash is unreadable");
            false
        });

        let Some(account) = account else {
            tracing::warn!("Login failed: unknown identifier");
            return Err(ServiceError::InvalidCredentials);
        };

        if !matches {
            tracing::warn!(account_id = account.id, "Login failed: password mismatch");
            return Err(ServiceError::InvalidCredentials);
        }

        if !account.active {
            tracing::warn!(account_id = account.id, "Login failed: account inactive");
            return Err(ServiceError::InvalidCredentials);
        }

        tracing::info!(account_id = account.id, "Login succeeded");
        self.issue_token(&account)
    }

    /// Succeeds silently when the identifier is unknown.
    pub async fn initiate_password_reset(&self, identifier: &str) -> Result<(), ServiceError> {
        let Some(account) = self.store.find_account_by_identifier(identifier).await? else {
            tracing::debug!("Password reset requested for unknown identifier");
            return Ok(());
        };

        let token = generate_reset_token();
        let expires_at = Utc::now() + self.reset_token_ttl;
        self.store
            .set_reset_token(account.id, &digest_token(&token), expires_at)
            .await?;

        tracing::info!(account_id = account.id, %expires_at, "Password reset token issued");

        if let Err(e) = self
            .notifier
            .send_reset_token(&account.identifier, &token)
            .await
        {
            tracing::warn!(account_id = account.id, error = %e, "Failed to deliver password reset token");
        }

        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ServiceError> {
        self.reset_password_at(token, new_password, Utc::now()).await
    }

    /// Reset against an explicit clock. A token is expired once `now`
    /// reaches its expiry.
    pub(crate) async fn reset_password_at(
        &self,
        token: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let digest = digest_token(token);

        let account = self
            .store
            .find_account_by_reset_token(&digest)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        match account.reset_token_expires_at {
            Some(expires_at) if expires_at > now => {}
            _ => return Err(ServiceError::ExpiredToken),
        }

        let password_hash = hash(new_password)?;

        // Another request may have redeemed the token since the lookup.
        let updated = self
            .store
            .complete_password_reset(&digest, &password_hash, now)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        tracing::info!(account_id = updated.id, "Password reset completed");
        Ok(())
    }

    pub async fn me(&self, identifier: &str) -> Result<AccountResponse, ServiceError> {
        self.store
            .find_account_by_identifier(identifier)
            .await?
            .map(AccountResponse::from)
            .ok_or_else(|| ServiceError::NotFound("Account".to_string()))
    }

    pub async fn list(&self) -> Result<Vec<AccountResponse>, ServiceError> {
        Ok(self
            .store
            .list_accounts()
            .await?
            .into_iter()
            .map(AccountResponse::from)
            .collect())
    }

    pub async fn create(&self, req: CreateUserRequest) -> Result<AccountResponse, ServiceError> {
        let account = self
            .insert(NewAccount {
                identifier: req.identifier,
                name: req.name,
                password_hash: hash(&req.password)?,
                roles: normalize_roles(req.roles),
                active: req.active.unwrap_or(true),
                registration: req.registration,
                course: req.course,
                phone: req.phone,
            })
            .await?;

        tracing::info!(account_id = account.id, "Account created by administrator");
        Ok(account.into())
    }

    pub async fn update(
        &self,
        id: i64,
        req: UpdateUserRequest,
    ) -> Result<AccountResponse, ServiceError> {
        let roles = match req.roles {
            Some(roles) if roles.is_empty() => {
                return Err(ServiceError::Validation("roles must not be empty".to_string()))
            }
            Some(roles) => Some(normalize_roles(Some(roles))),
            None => None,
        };

        let password_hash = match req.password.as_deref() {
            Some(p) => Some(hash(p)?),
            None => None,
        };

        let update = AccountUpdate {
            name: req.name,
            course: req.course,
            phone: req.phone,
            active: req.active,
            roles,
            password_hash,
        };

        let account = self
            .store
            .update_account(id, update)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Account".to_string()))?;

        tracing::info!(account_id = account.id, "Account updated");
        Ok(account.into())
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.store.delete_account(id).await? {
            return Err(ServiceError::NotFound("Account".to_string()));
        }
        tracing::info!(account_id = id, "Account deleted");
        Ok(())
    }

    /// Replace the role set. Tokens issued earlier keep their old claims
    /// until they expire.
    pub async fn update_roles(
        &self,
        id: i64,
        roles: Vec<Role>,
    ) -> Result<AccountResponse, ServiceError> {
        if roles.is_empty() {
            return Err(ServiceError::Validation("roles must not be empty".to_string()));
        }

        let update = AccountUpdate {
            roles: Some(normalize_roles(Some(roles))),
            ..Default::default()
        };

        let account = self
            .store
            .update_account(id, update)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Account".to_string()))?;

        tracing::info!(account_id = account.id, roles = ?account.roles, "Account roles updated");
        Ok(account.into())
    }

    pub async fn register_device_token(
        &self,
        identifier: &str,
        device_token: &str,
    ) -> Result<(), ServiceError> {
        if !self.store.set_device_token(identifier, device_token).await? {
            return Err(ServiceError::NotFound("Account".to_string()));
        }
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(self.store.health_check().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::services::{MemoryStore, MockNotifier};

    struct Harness {
        service: AccountService,
        store: Arc<MemoryStore>,
        notifier: Arc<MockNotifier>,
        jwt: JwtService,
    }

    fn harness_with(notifier: MockNotifier) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(notifier);
        let jwt = JwtService::new(&JwtConfig {
            secret: "unit-test-secret-that-is-long-enough".to_string(),
            expiry_minutes: 60,
        });
        let service = AccountService::new(
            store.clone(),
            jwt.clone(),
            notifier.clone(),
            Duration::minutes(60),
        );
        Harness {
            service,
            store,
            notifier,
            jwt,
        }
    }

    fn harness() -> Harness {
        harness_with(MockNotifier::new())
    }

    fn register_request(identifier: &str, roles: Option<Vec<Role>>) -> RegisterRequest {
        RegisterRequest {
            identifier: identifier.to_string(),
            name: "Ana Souza".to_string(),
            password: "segredo123".to_string(),
            registration: None,
            course: None,
            phone: None,
            roles,
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password_and_defaults_role() {
        let h = harness();
        let token = h
            .service
            .register(register_request("ana@gmail.com", None))
            .await
            .unwrap();

        let claims = h.jwt.verify(&token).unwrap();
        assert_eq!(claims.sub, "ana@gmail.com");
        assert_eq!(claims.roles, vec![Role::Academico]);

        let stored = h
            .store
            .find_account_by_identifier("ana@gmail.com")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored.password_hash, "segredo123");
        assert!(stored.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_register_keeps_requested_roles() {
        let h = harness();
        let token = h
            .service
            .register(register_request("prof@gmail.com", Some(vec![Role::Professor])))
            .await
            .unwrap();
        assert_eq!(h.jwt.verify(&token).unwrap().roles, vec![Role::Professor]);
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_rejected() {
        let h = harness();
        h.service
            .register(register_request("ana@gmail.com", None))
            .await
            .unwrap();

        let err = h
            .service
            .register(register_request("ana@gmail.com", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateIdentifier));
        assert_eq!(h.store.list_accounts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let h = harness();
        h.service
            .register(register_request("ana@gmail.com", None))
            .await
            .unwrap();

        let unknown = h.service.login("bob@gmail.com", "segredo123").await.unwrap_err();
        let wrong = h.service.login("ana@gmail.com", "errada").await.unwrap_err();

        assert!(matches!(unknown, ServiceError::InvalidCredentials));
        assert!(matches!(wrong, ServiceError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    thread_local! {
        static VERIFIED_HASHES: std::cell::RefCell<Vec<String>> =
            const { std::cell::RefCell::new(Vec::new()) };
    }

    fn recording_verifier(
        password: &Password,
        hash: &PasswordHashString,
    ) -> Result<bool, anyhow::Error> {
        VERIFIED_HASHES.with(|seen| seen.borrow_mut().push(hash.as_str().to_string()));
        verify_password(password, hash)
    }

    #[tokio::test]
    async fn test_unknown_identifier_still_runs_password_verification() {
        let h = harness();
        let service = h.service.clone().with_verifier(recording_verifier);
        service
            .register(register_request("ana@gmail.com", None))
            .await
            .unwrap();
        VERIFIED_HASHES.with(|seen| seen.borrow_mut().clear());

        let unknown = service.login("bob@gmail.com", "segredo123").await.unwrap_err();
        let wrong = service.login("ana@gmail.com", "errada").await.unwrap_err();

        assert!(matches!(unknown, ServiceError::InvalidCredentials));
        assert!(matches!(wrong, ServiceError::InvalidCredentials));

        let seen = VERIFIED_HASHES.with(|seen| seen.borrow().clone());
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], dummy_password_hash().unwrap().as_str());
        assert!(seen[0].starts_with("$argon2id$"));
        assert_ne!(seen[0], seen[1]);
    }

    #[tokio::test]
    async fn test_login_rejects_inactive_account() {
        let h = harness();
        h.service
            .register(register_request("ana@gmail.com", None))
            .await
            .unwrap();
        let account = h
            .store
            .find_account_by_identifier("ana@gmail.com")
            .await
            .unwrap()
            .unwrap();
        h.store
            .update_account(
                account.id,
                AccountUpdate {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = h.service.login("ana@gmail.com", "segredo123").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_unknown_identifier_reset_is_silent() {
        let h = harness();
        h.service.initiate_password_reset("ghost@gmail.com").await.unwrap();
        assert!(h.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_reset_flow_replaces_password_once() {
        let h = harness();
        h.service
            .register(register_request("ana@gmail.com", None))
            .await
            .unwrap();

        h.service.initiate_password_reset("ana@gmail.com").await.unwrap();
        let token = h.notifier.last_token_for("ana@gmail.com").unwrap();

        let stored = h
            .store
            .find_account_by_identifier("ana@gmail.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.reset_token_hash.as_deref(), Some(digest_token(&token).as_str()));

        h.service.reset_password(&token, "novoSegredo456").await.unwrap();
        assert!(h.service.login("ana@gmail.com", "novoSegredo456").await.is_ok());
        assert!(h.service.login("ana@gmail.com", "segredo123").await.is_err());

        let again = h.service.reset_password(&token, "outraSenha789").await.unwrap_err();
        assert!(matches!(again, ServiceError::InvalidToken));
    }

    #[tokio::test]
    async fn test_second_reset_request_invalidates_first_token() {
        let h = harness();
        h.service
            .register(register_request("ana@gmail.com", None))
            .await
            .unwrap();

        h.service.initiate_password_reset("ana@gmail.com").await.unwrap();
        let first = h.notifier.last_token_for("ana@gmail.com").unwrap();
        h.service.initiate_password_reset("ana@gmail.com").await.unwrap();
        let second = h.notifier.last_token_for("ana@gmail.com").unwrap();
        assert_ne!(first, second);

        let err = h.service.reset_password(&first, "novoSegredo456").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidToken));
        h.service.reset_password(&second, "novoSegredo456").await.unwrap();
    }

    #[tokio::test]
    async fn test_token_expires_at_its_deadline() {
        let h = harness();
        h.service
            .register(register_request("ana@gmail.com", None))
            .await
            .unwrap();
        h.service.initiate_password_reset("ana@gmail.com").await.unwrap();
        let token = h.notifier.last_token_for("ana@gmail.com").unwrap();

        let expires_at = h
            .store
            .find_account_by_identifier("ana@gmail.com")
            .await
            .unwrap()
            .unwrap()
            .reset_token_expires_at
            .unwrap();

        let err = h
            .service
            .reset_password_at(&token, "novoSegredo456", expires_at)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ExpiredToken));

        let err = h
            .service
            .reset_password_at(&token, "novoSegredo456", expires_at + Duration::seconds(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ExpiredToken));

        h.service
            .reset_password_at(&token, "novoSegredo456", expires_at - Duration::seconds(1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_reset_token_is_invalid() {
        let h = harness();
        let err = h.service.reset_password("deadbeef", "novoSegredo456").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidToken));
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_fail_the_request() {
        let h = harness_with(MockNotifier::failing());
        h.service
            .register(register_request("ana@gmail.com", None))
            .await
            .unwrap();

        h.service.initiate_password_reset("ana@gmail.com").await.unwrap();
        assert_eq!(h.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_role_update_does_not_touch_existing_tokens() {
        let h = harness();
        let token = h
            .service
            .register(register_request("ana@gmail.com", None))
            .await
            .unwrap();
        let id = h.service.me("ana@gmail.com").await.unwrap().id;

        let updated = h.service.update_roles(id, vec![Role::Admin]).await.unwrap();
        assert_eq!(updated.roles, vec![Role::Admin]);
        assert_eq!(h.jwt.verify(&token).unwrap().roles, vec![Role::Academico]);

        let fresh = h.service.login("ana@gmail.com", "segredo123").await.unwrap();
        assert_eq!(h.jwt.verify(&fresh).unwrap().roles, vec![Role::Admin]);
    }

    #[tokio::test]
    async fn test_empty_role_update_is_rejected() {
        let h = harness();
        h.service
            .register(register_request("ana@gmail.com", None))
            .await
            .unwrap();
        let id = h.service.me("ana@gmail.com").await.unwrap().id;

        let err = h.service.update_roles(id, vec![]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_admin_update_and_delete() {
        let h = harness();
        h.service
            .register(register_request("ana@gmail.com", None))
            .await
            .unwrap();
        let id = h.service.me("ana@gmail.com").await.unwrap().id;

        let updated = h
            .service
            .update(
                id,
                UpdateUserRequest {
                    course: Some("Engenharia".to_string()),
                    password: Some("trocada123".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.course.as_deref(), Some("Engenharia"));
        assert_eq!(updated.name, "Ana Souza");
        assert!(h.service.login("ana@gmail.com", "trocada123").await.is_ok());

        h.service.delete(id).await.unwrap();
        assert!(matches!(
            h.service.delete(id).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            h.service.me("ana@gmail.com").await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }
}
