use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use super::manager::DatabaseManager;
use super::models::{Category, NewTransaction, NewUser, Transaction, TransactionFilter, User};
use super::postgres::{PgCategoryStore, PgTransactionStore, PgUserStore};
use super::{with_timeout, StoreError};

/// User accounts and their one-time tokens. Token arguments are always the
/// stored digest, never the plain token.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Active user by id.
    async fn get_by_id(&self, id: i64) -> Result<User, StoreError>;

    /// Active user by email.
    async fn get_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Inserts an inactive user together with an invitation valid for `exp`.
    async fn create_and_invite(&self, user: NewUser, token_hash: &str, exp: Duration) -> Result<User, StoreError>;

    /// Activates the user owning an unexpired invitation and consumes it.
    async fn activate(&self, token_hash: &str) -> Result<(), StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    async fn invitation_exists(&self, token_hash: &str) -> Result<bool, StoreError>;

    /// Unexpired password reset tokens outstanding for `user_id`.
    async fn reset_password_token_count(&self, user_id: i64) -> Result<i64, StoreError>;

    async fn create_reset_password_token(&self, user_id: i64, token_hash: &str, exp: Duration) -> Result<(), StoreError>;

    async fn delete_reset_password_token(&self, token_hash: &str) -> Result<(), StoreError>;

    async fn reset_token_exists(&self, token_hash: &str) -> Result<bool, StoreError>;

    /// Replaces the password of the user owning an unexpired reset token and
    /// drops all of that user's reset tokens.
    async fn reset_password(&self, token_hash: &str, password_hash: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, StoreError>;

    async fn list_by_user(&self, user_id: i64, filter: &TransactionFilter) -> Result<Vec<Transaction>, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Transaction, StoreError>;

    /// Persists amount, category, type, date and description. Scoped to the
    /// transaction's owner.
    async fn update(&self, transaction: &Transaction) -> Result<Transaction, StoreError>;

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Category>, StoreError>;

    /// Lookup by lower-cased name.
    async fn get_by_name(&self, name: &str) -> Result<Category, StoreError>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl HealthCheck for DatabaseManager {
    async fn ping(&self) -> Result<(), StoreError> {
        with_timeout(self.health_check()).await
    }
}

/// Every store the handlers and middleware reach, behind trait objects.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserStore>,
    pub transactions: Arc<dyn TransactionStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub health: Arc<dyn HealthCheck>,
}

impl Storage {
    pub fn postgres(manager: DatabaseManager) -> Self {
        let pool: PgPool = manager.pool().clone();
        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            transactions: Arc::new(PgTransactionStore::new(pool.clone())),
            categories: Arc::new(PgCategoryStore::new(pool)),
            health: Arc::new(manager),
        }
    }
}
