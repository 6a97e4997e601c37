// handlers/protected/transactions/mod.rs - transaction CRUD
//
// Collection routes (`/transactions`) act on the principal's own rows.
// Record routes (`/transactions/:id`) read the already loaded and
// ownership-checked `Transaction` from the request extensions.

pub mod collection;
pub mod payload;
pub mod record;

pub use collection::{transactions_get, transactions_post};
pub use record::{transaction_delete, transaction_get, transaction_patch};
