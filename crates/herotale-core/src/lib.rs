//! Shared abstractions for the Herotale story engine.
//!
//! This crate defines the identifiers, wire-neutral records and backend ports
//! that the story engine and its adapters depend on. It contains no
//! infrastructure code.

pub mod clock;
pub mod command;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod ids;
