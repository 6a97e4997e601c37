pub mod category;
pub mod transaction;
pub mod user;

pub use category::Category;
pub use transaction::{NewTransaction, Transaction, TransactionFilter, TransactionType};
pub use user::{NewUser, Role, User, DEFAULT_ROLE};
