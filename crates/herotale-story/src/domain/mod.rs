//! Pure domain model: graph projection, progression state machine, actions.

pub mod commands;
pub mod errors;
pub mod events;
pub mod graph;
pub mod progression;
