use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::models::{NewTransaction, Transaction, TransactionFilter};
use crate::database::storage::TransactionStore;
use crate::database::{with_timeout, StoreError};

const TRANSACTION_COLUMNS: &str = r#"
    t.id, t.user_id, t.amount, t.category_id, c.name AS category_name,
    t.transaction_type, t.transaction_date, t.description, t.created_at, t.updated_at
"#;

pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, StoreError> {
        let query = format!(
            r#"
            WITH inserted AS (
                INSERT INTO individual_transactions
                    (user_id, amount, category_id, transaction_type, description, transaction_date)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            SELECT {} FROM inserted t JOIN categories c ON c.id = t.category_id
            "#,
            TRANSACTION_COLUMNS
        );
        with_timeout(async {
            let created = sqlx::query_as::<_, Transaction>(&query)
                .bind(transaction.user_id)
                .bind(transaction.amount)
                .bind(transaction.category_id)
                .bind(transaction.transaction_type.as_str())
                .bind(&transaction.description)
                .bind(transaction.transaction_date)
                .fetch_one(&self.pool)
                .await?;
            Ok(created)
        })
        .await
    }

    async fn list_by_user(&self, user_id: i64, filter: &TransactionFilter) -> Result<Vec<Transaction>, StoreError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM individual_transactions t JOIN categories c ON c.id = t.category_id WHERE t.user_id = ",
            TRANSACTION_COLUMNS
        ));
        query.push_bind(user_id);

        if let Some(start) = filter.start_date {
            query.push(" AND t.transaction_date >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND t.transaction_date <= ").push_bind(end);
        }
        if let Some(kind) = filter.transaction_type {
            query.push(" AND t.transaction_type = ").push_bind(kind.as_str());
        }
        query.push(" ORDER BY t.transaction_date DESC, t.id DESC");

        with_timeout(async {
            let rows = query
                .build_query_as::<Transaction>()
                .fetch_all(&self.pool)
                .await?;
            Ok(rows)
        })
        .await
    }

    async fn get_by_id(&self, id: i64) -> Result<Transaction, StoreError> {
        let query = format!(
            "SELECT {} FROM individual_transactions t JOIN categories c ON c.id = t.category_id WHERE t.id = $1",
            TRANSACTION_COLUMNS
        );
        with_timeout(async {
            sqlx::query_as::<_, Transaction>(&query)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn update(&self, transaction: &Transaction) -> Result<Transaction, StoreError> {
        let query = format!(
            r#"
            WITH updated AS (
                UPDATE individual_transactions
                SET amount = $1, category_id = $2, transaction_type = $3, description = $4,
                    transaction_date = $5, updated_at = NOW()
                WHERE id = $6 AND user_id = $7
                RETURNING *
            )
            SELECT {} FROM updated t JOIN categories c ON c.id = t.category_id
            "#,
            TRANSACTION_COLUMNS
        );
        with_timeout(async {
            sqlx::query_as::<_, Transaction>(&query)
                .bind(transaction.amount)
                .bind(transaction.category_id)
                .bind(transaction.transaction_type.as_str())
                .bind(&transaction.description)
                .bind(transaction.transaction_date)
                .bind(transaction.id)
                .bind(transaction.user_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        with_timeout(async {
            let result = sqlx::query("DELETE FROM individual_transactions WHERE id = $1")
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
}
