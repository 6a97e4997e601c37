//! Postgres-backed store implementations. Every call runs under the shared
//! per-query timeout.

pub mod categories;
pub mod transactions;
pub mod users;

pub use categories::PgCategoryStore;
pub use transactions::PgTransactionStore;
pub use users::PgUserStore;
