//! Application services: backend access, persistence and the play session.

pub mod auth;
pub mod graph_accessor;
pub mod inventory;
pub mod progress_recorder;
pub mod session;
