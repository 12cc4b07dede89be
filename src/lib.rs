#![doc = "The `taskforge_auth` library crate."]
#![doc = ""]
#![doc = "Authentication and authorization core of the TaskForge tracker: credential"]
#![doc = "storage, bearer tokens, the password reset handshake, access rules, and the"]
#![doc = "actix-web routes built on them. `main.rs` wires these into a running server."]

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod notifier;
pub mod routes;
pub mod state;
pub mod store;

pub use crate::error::AppError;
pub use crate::state::AppState;
