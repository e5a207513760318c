//! Shared test fakes and fixtures for the Herotale story engine.

mod catalog;
mod clock;
pub mod fixtures;
mod identity;
mod ledger;
mod source;

pub use catalog::InMemoryAssetCatalog;
pub use clock::FixedClock;
pub use fixtures::ScenarioFixture;
pub use identity::StaticIdentityGateway;
pub use ledger::{FailingProgressLedger, RecordingProgressLedger};
pub use source::InMemoryScenarioSource;
