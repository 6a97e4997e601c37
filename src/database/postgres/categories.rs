use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::models::Category;
use crate::database::storage::CategoryStore;
use crate::database::{with_timeout, StoreError};

pub struct PgCategoryStore {
    pool: PgPool,
}

impl PgCategoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryStore for PgCategoryStore {
    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        with_timeout(async {
            let categories = sqlx::query_as::<_, Category>("SELECT id, name, type FROM categories ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
            Ok(categories)
        })
        .await
    }

    async fn get_by_name(&self, name: &str) -> Result<Category, StoreError> {
        with_timeout(async {
            sqlx::query_as::<_, Category>("SELECT id, name, type FROM categories WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(StoreError::NotFound)
        })
        .await
    }
}
