//! GraphQL backend gateway.
//!
//! Implements the engine's backend ports against the Herotale GraphQL API:
//! one HTTP POST per operation to `{base}/graphql/`, authenticated with an
//! `Authorization: JWT <token>` header when a principal is involved.

pub mod client;
pub mod config;
pub mod gateway;
mod identity;
mod inventory;
mod ledger;
pub mod queries;
mod wire;

pub use client::GraphqlClient;
pub use config::GraphqlConfig;
pub use gateway::GraphqlGateway;
