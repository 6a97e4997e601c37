// handlers/public/auth/mod.rs - Public authentication handlers
//
// Token acquisition and account recovery. One-time tokens handed out here
// (invitations, password resets) are UUIDs; only their SHA-256 digest is
// persisted, so every handler hashes before touching the store.

pub mod invitation; // GET  /auth/validate-invitation-token/:token
pub mod login;      // POST /auth/login
pub mod password;   // POST /auth/forgot-password, GET /auth/validate-reset-token/:token, PUT /auth/reset-password
pub mod register;   // POST /auth/register

pub use invitation::validate_invitation_get;
pub use login::login_post;
pub use password::{forgot_password_post, reset_password_put, validate_reset_token_get};
pub use register::register_post;
