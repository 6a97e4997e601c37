// handlers/protected/categories.rs - GET /api/v1/categories

use axum::extract::State;

use crate::database::models::Category;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

pub async fn categories_get(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    let categories = state.store.categories.list().await?;
    Ok(ApiResponse::success(categories))
}
