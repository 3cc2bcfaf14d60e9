//! Web-call token issuer — library crate.
//!
//! Exchanges a browser's `agent_id` for a short-lived Retell web-call access
//! token. Re-exports modules needed by integration tests in `tests/`.

pub mod cli;
pub mod config;
pub mod errors;
pub mod function;
pub mod issuer;
pub mod provider;
pub mod server;
