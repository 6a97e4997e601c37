// handlers/mod.rs - two-tier handler layout
//
// Public (no auth) and Protected (bearer token + principal in extensions).

pub mod protected;
pub mod public;
pub mod utils;
