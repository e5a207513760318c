//! Route modules.

pub mod auth;
pub mod health;
pub mod inventory;
pub mod plays;
pub mod progress;
pub mod scenarios;
