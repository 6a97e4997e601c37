pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod middleware;
pub mod ratelimiter;
pub mod state;

#[cfg(test)]
pub mod testing;
