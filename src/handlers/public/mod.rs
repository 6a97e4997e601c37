// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Account lifecycle endpoints: registration, login, activation and password
// reset, plus the health probe. Still subject to the global rate limiter.

pub mod auth;
pub mod health;
pub mod users;

pub use health::health_get;
pub use users::activate_put;
