use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::models::{NewUser, User};
use crate::database::storage::UserStore;
use crate::database::{with_timeout, StoreError};

const USER_SELECT: &str = r#"
    SELECT
        u.id, u.username, u.email, u.password, u.is_active, u.created_at,
        r.id AS role_id, r.name AS role_name, r.level AS role_level, r.description AS role_description
    FROM users u
    JOIN roles r ON r.id = u.role_id
"#;

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique violations on the users table surface as duplicate errors.
fn map_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.constraint() {
            Some("users_email_key") => return StoreError::DuplicateEmail,
            Some("users_username_key") => return StoreError::DuplicateUsername,
            _ => {}
        }
    }
    StoreError::Sqlx(err)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_by_id(&self, id: i64) -> Result<User, StoreError> {
        let query = format!("{} WHERE u.id = $1 AND u.is_active = TRUE", USER_SELECT);
        with_timeout(async {
            sqlx::query_as::<_, User>(&query)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        let query = format!("{} WHERE u.email = $1 AND u.is_active = TRUE", USER_SELECT);
        with_timeout(async {
            sqlx::query_as::<_, User>(&query)
                .bind(email)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn create_and_invite(&self, user: NewUser, token_hash: &str, exp: Duration) -> Result<User, StoreError> {
        let select = format!("{} WHERE u.id = $1", USER_SELECT);
        with_timeout(async {
            let mut tx = self.pool.begin().await?;

            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO users (username, email, password, role_id)
                VALUES ($1, $2, $3, (SELECT id FROM roles WHERE name = $4))
                RETURNING id
                "#,
            )
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.role_name)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_insert_error)?;

            sqlx::query(
                "INSERT INTO user_invitations (token, user_id, expiry) VALUES ($1, $2, NOW() + make_interval(secs => $3))",
            )
            .bind(token_hash)
            .bind(id)
            .bind(exp.as_secs_f64())
            .execute(&mut *tx)
            .await?;

            let created = sqlx::query_as::<_, User>(&select)
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok(created)
        })
        .await
    }

    async fn activate(&self, token_hash: &str) -> Result<(), StoreError> {
        with_timeout(async {
            let mut tx = self.pool.begin().await?;

            let user_id: i64 = sqlx::query_scalar(
                "SELECT user_id FROM user_invitations WHERE token = $1 AND expiry > NOW()",
            )
            .bind(token_hash)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound)?;

            sqlx::query("UPDATE users SET is_active = TRUE WHERE id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query("DELETE FROM user_invitations WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        with_timeout(async {
            let result = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
        .await
    }

    async fn invitation_exists(&self, token_hash: &str) -> Result<bool, StoreError> {
        with_timeout(async {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM user_invitations WHERE token = $1 AND expiry > NOW())",
            )
            .bind(token_hash)
            .fetch_one(&self.pool)
            .await?;
            Ok(exists)
        })
        .await
    }

    async fn reset_password_token_count(&self, user_id: i64) -> Result<i64, StoreError> {
        with_timeout(async {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM password_resets WHERE user_id = $1 AND expiry > NOW()",
            )
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
            Ok(count)
        })
        .await
    }

    async fn create_reset_password_token(&self, user_id: i64, token_hash: &str, exp: Duration) -> Result<(), StoreError> {
        with_timeout(async {
            sqlx::query(
                "INSERT INTO password_resets (token, user_id, expiry) VALUES ($1, $2, NOW() + make_interval(secs => $3))",
            )
            .bind(token_hash)
            .bind(user_id)
            .bind(exp.as_secs_f64())
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await
    }

    async fn delete_reset_password_token(&self, token_hash: &str) -> Result<(), StoreError> {
        with_timeout(async {
            sqlx::query("DELETE FROM password_resets WHERE token = $1")
                .bind(token_hash)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }

    async fn reset_token_exists(&self, token_hash: &str) -> Result<bool, StoreError> {
        with_timeout(async {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM password_resets WHERE token = $1 AND expiry > NOW())",
            )
            .bind(token_hash)
            .fetch_one(&self.pool)
            .await?;
            Ok(exists)
        })
        .await
    }

    async fn reset_password(&self, token_hash: &str, password_hash: &str) -> Result<(), StoreError> {
        with_timeout(async {
            let mut tx = self.pool.begin().await?;

            let user_id: i64 = sqlx::query_scalar(
                "SELECT user_id FROM password_resets WHERE token = $1 AND expiry > NOW()",
            )
            .bind(token_hash)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound)?;

            sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
                .bind(password_hash)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok(())
        })
        .await
    }
}
