// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every route here runs behind `auth_token_middleware`, so a `Principal` is
// always present in the request extensions. Routes addressing a single
// transaction additionally run the context and ownership middleware, which
// place the owned `Transaction` in the extensions before the handler runs.

pub mod categories;
pub mod transactions;
pub mod users;

pub use categories::categories_get;
pub use users::token_user_get;
