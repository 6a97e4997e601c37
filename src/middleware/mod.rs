pub mod auth;
pub mod rate_limit;
pub mod response;
pub mod transaction;

pub use auth::{auth_token_middleware, Principal};
pub use rate_limit::rate_limit_middleware;
pub use response::{ApiResponse, ApiResult};
pub use transaction::{transaction_context_middleware, transaction_ownership_middleware};
