//! Story progression for the Herotale story engine.
//!
//! Responsible for the scenario graph projection, the scene progression state
//! machine, progress recording and the play session that drives them.

pub mod application;
pub mod domain;
