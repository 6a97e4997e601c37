//! In-memory doubles for the stores and the mailer, plus a harness that
//! wires them into a real router for request-level tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use crate::app::build_router;
use crate::auth::password::hash_password;
use crate::auth::{Authenticator, Claims, JwtAuthenticator};
use crate::config::{AppConfig, QUERY_TIMEOUT};
use crate::database::models::{
    Category, NewTransaction, NewUser, Role, Transaction, TransactionFilter, TransactionType, User,
};
use crate::database::storage::{CategoryStore, HealthCheck, TransactionStore, UserStore};
use crate::database::{Storage, StoreError};
use crate::mail::{MailError, MailTemplate, Mailer};
use crate::ratelimiter::{FixedWindowRateLimiter, RateLimiter};
use crate::state::AppState;

pub const TEST_SECRET: &str = "test-secret";

fn role(name: &str) -> Role {
    let (id, level) = if name == "admin" { (2, 3) } else { (1, 1) };
    Role {
        id,
        name: name.to_string(),
        level,
        description: None,
    }
}

fn expiry(exp: Duration) -> DateTime<Utc> {
    Utc::now() + chrono::Duration::from_std(exp).unwrap()
}

fn simulated_failure() -> StoreError {
    StoreError::Timeout(QUERY_TIMEOUT)
}

#[derive(Default)]
struct UserState {
    next_id: i64,
    users: Vec<User>,
    invitations: HashMap<String, (i64, DateTime<Utc>)>,
    resets: HashMap<String, (i64, DateTime<Utc>)>,
}

/// Users, invitations and reset tokens kept in memory.
#[derive(Default)]
pub struct MemoryUserStore {
    state: Mutex<UserState>,
    failing: AtomicBool,
}

impl MemoryUserStore {
    pub fn insert_user(&self, username: &str, email: &str, password_hash: &str, is_active: bool) -> User {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let user = User {
            id: state.next_id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_active,
            role: role("user"),
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        user
    }

    /// Makes every call fail as if the database timed out.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().unwrap().users.len()
    }

    pub fn find(&self, id: i64) -> Option<User> {
        self.state.lock().unwrap().users.iter().find(|u| u.id == id).cloned()
    }

    pub fn outstanding_resets(&self) -> usize {
        self.state.lock().unwrap().resets.len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(simulated_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_by_id(&self, id: i64) -> Result<User, StoreError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.id == id && u.is_active)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.email == email && u.is_active)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_and_invite(&self, user: NewUser, token_hash: &str, exp: Duration) -> Result<User, StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::DuplicateUsername);
        }

        state.next_id += 1;
        let created = User {
            id: state.next_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_active: false,
            role: role(&user.role_name),
            created_at: Utc::now(),
        };
        state.users.push(created.clone());
        state
            .invitations
            .insert(token_hash.to_string(), (created.id, expiry(exp)));
        Ok(created)
    }

    async fn activate(&self, token_hash: &str) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let user_id = match state.invitations.get(token_hash) {
            Some((user_id, expires)) if *expires > Utc::now() => *user_id,
            _ => return Err(StoreError::NotFound),
        };
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
            user.is_active = true;
        }
        state.invitations.retain(|_, (id, _)| *id != user_id);
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Err(StoreError::NotFound);
        }
        state.invitations.retain(|_, (user_id, _)| *user_id != id);
        state.resets.retain(|_, (user_id, _)| *user_id != id);
        Ok(())
    }

    async fn invitation_exists(&self, token_hash: &str) -> Result<bool, StoreError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(matches!(state.invitations.get(token_hash), Some((_, expires)) if *expires > Utc::now()))
    }

    async fn reset_password_token_count(&self, user_id: i64) -> Result<i64, StoreError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        let now = Utc::now();
        Ok(state
            .resets
            .values()
            .filter(|(id, expires)| *id == user_id && *expires > now)
            .count() as i64)
    }

    async fn create_reset_password_token(&self, user_id: i64, token_hash: &str, exp: Duration) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.resets.insert(token_hash.to_string(), (user_id, expiry(exp)));
        Ok(())
    }

    async fn delete_reset_password_token(&self, token_hash: &str) -> Result<(), StoreError> {
        self.check()?;
        self.state.lock().unwrap().resets.remove(token_hash);
        Ok(())
    }

    async fn reset_token_exists(&self, token_hash: &str) -> Result<bool, StoreError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(matches!(state.resets.get(token_hash), Some((_, expires)) if *expires > Utc::now()))
    }

    async fn reset_password(&self, token_hash: &str, password_hash: &str) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let user_id = match state.resets.get(token_hash) {
            Some((user_id, expires)) if *expires > Utc::now() => *user_id,
            _ => return Err(StoreError::NotFound),
        };
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
            user.password_hash = password_hash.to_string();
        }
        state.resets.retain(|_, (id, _)| *id != user_id);
        Ok(())
    }
}

/// Transactions kept in memory, joined against a fixed category list.
pub struct MemoryTransactionStore {
    rows: Mutex<Vec<Transaction>>,
    next_id: Mutex<i64>,
    categories: Vec<Category>,
    failing: AtomicBool,
}

impl MemoryTransactionStore {
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            next_id: Mutex::new(0),
            categories,
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(simulated_failure());
        }
        Ok(())
    }

    fn category_name(&self, id: i64) -> String {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, StoreError> {
        self.check()?;
        let id = {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            *next_id
        };
        let now = Utc::now();
        let created = Transaction {
            id,
            user_id: transaction.user_id,
            amount: transaction.amount,
            category_id: transaction.category_id,
            category_name: self.category_name(transaction.category_id),
            transaction_type: transaction.transaction_type,
            transaction_date: transaction.transaction_date,
            description: transaction.description,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn list_by_user(&self, user_id: i64, filter: &TransactionFilter) -> Result<Vec<Transaction>, StoreError> {
        self.check()?;
        let mut rows: Vec<Transaction> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id && filter.matches(t))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn get_by_id(&self, id: i64) -> Result<Transaction, StoreError> {
        self.check()?;
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, transaction: &Transaction) -> Result<Transaction, StoreError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|t| t.id == transaction.id && t.user_id == transaction.user_id)
            .ok_or(StoreError::NotFound)?;
        row.amount = transaction.amount;
        row.category_id = transaction.category_id;
        row.category_name = self.category_name(transaction.category_id);
        row.transaction_type = transaction.transaction_type;
        row.transaction_date = transaction.transaction_date;
        row.description = transaction.description.clone();
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|t| t.id != id);
        if rows.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

pub struct MemoryCategoryStore {
    categories: Vec<Category>,
}

#[async_trait]
impl CategoryStore for MemoryCategoryStore {
    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.categories.clone())
    }

    async fn get_by_name(&self, name: &str) -> Result<Category, StoreError> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[derive(Default)]
pub struct MemoryHealth {
    down: AtomicBool,
}

impl MemoryHealth {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl HealthCheck for MemoryHealth {
    async fn ping(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(simulated_failure());
        }
        Ok(())
    }
}

/// A mail that went through [`RecordingMailer`].
#[derive(Debug, Clone)]
pub struct SentMail {
    pub template: MailTemplate,
    pub email: String,
    pub is_sandbox: bool,
}

/// Mailer that records every send and can be told to fail.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(
        &self,
        template: &MailTemplate,
        _username: &str,
        email: &str,
        is_sandbox: bool,
    ) -> Result<u16, MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Exhausted {
                attempts: 1,
                last: "simulated outage".to_string(),
            });
        }
        self.sent.lock().unwrap().push(SentMail {
            template: template.clone(),
            email: email.to_string(),
            is_sandbox,
        });
        Ok(200)
    }
}

pub fn test_categories() -> Vec<Category> {
    vec![
        Category {
            id: 1,
            name: "food".to_string(),
            category_type: "expense".to_string(),
        },
        Category {
            id: 2,
            name: "salary".to_string(),
            category_type: "income".to_string(),
        },
    ]
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.auth.token_secret = TEST_SECRET.to_string();
    config.rate_limiter.enabled = false;
    config
}

/// Application state backed entirely by in-memory doubles.
pub struct TestApp {
    pub state: AppState,
    pub users: Arc<MemoryUserStore>,
    pub transactions: Arc<MemoryTransactionStore>,
    pub health: Arc<MemoryHealth>,
    pub mailer: Arc<RecordingMailer>,
    pub authenticator: Arc<JwtAuthenticator>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Same as [`TestApp::new`] with the limiter switched on.
    pub fn with_rate_limit(limit: u32, window: Duration) -> Self {
        let mut config = test_config();
        config.rate_limiter.enabled = true;
        config.rate_limiter.requests_per_window = limit;
        config.rate_limiter.window = window;
        Self::with_config(config)
    }

    pub fn with_config(config: AppConfig) -> Self {
        let users = Arc::new(MemoryUserStore::default());
        let transactions = Arc::new(MemoryTransactionStore::new(test_categories()));
        let health = Arc::new(MemoryHealth::default());
        let mailer = Arc::new(RecordingMailer::default());
        let authenticator =
            Arc::new(JwtAuthenticator::new(&config.auth.token_secret, &config.auth.issuer, &config.auth.issuer).unwrap());
        let rate_limiter: Arc<dyn RateLimiter> = Arc::new(FixedWindowRateLimiter::new(
            config.rate_limiter.requests_per_window,
            config.rate_limiter.window,
        ));

        let store = Storage {
            users: users.clone(),
            transactions: transactions.clone(),
            categories: Arc::new(MemoryCategoryStore {
                categories: test_categories(),
            }),
            health: health.clone(),
        };
        let state = AppState::new(config, store, authenticator.clone(), mailer.clone(), rate_limiter);

        Self {
            state,
            users,
            transactions,
            health,
            mailer,
            authenticator,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// An active user whose password is `password`.
    pub fn seed_user(&self, username: &str, email: &str, password: &str) -> User {
        let hash = hash_password(password).unwrap();
        self.users.insert_user(username, email, &hash, true)
    }

    pub async fn seed_transaction(&self, user_id: i64, amount: &str, kind: TransactionType, date: NaiveDate) -> Transaction {
        let new = NewTransaction {
            user_id,
            amount: amount.parse::<Decimal>().unwrap(),
            category_id: if kind == TransactionType::Income { 2 } else { 1 },
            transaction_type: kind,
            transaction_date: date,
            description: String::new(),
        };
        self.transactions.create(new).await.unwrap()
    }

    pub fn token_for(&self, user_id: i64) -> String {
        let auth = &self.state.config.auth;
        let claims = Claims::new(user_id, "user", &auth.issuer, auth.token_exp);
        self.authenticator.generate_token(&claims).unwrap()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends `request` through `router` and decodes the JSON body, if any.
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
