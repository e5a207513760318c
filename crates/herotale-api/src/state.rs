//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use herotale_core::clock::Clock;
use herotale_core::gateway::{AssetCatalog, ProgressLedger, ScenarioGraphSource};
use herotale_core::identity::IdentityGateway;
use herotale_story::application::graph_accessor::GraphAccessor;
use herotale_story::application::session::{SessionConfig, StorySession};
use tokio::sync::{Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::info;
use uuid::Uuid;

/// A live play, one story session behind a lock.
pub type PlayHandle = Arc<Mutex<StorySession>>;

struct PlayEntry {
    handle: PlayHandle,
    touched: Instant,
}

/// Plays currently held in memory, keyed by play id.
///
/// Each lookup marks the play as used. Plays nobody has looked up for a while
/// are dropped by [`PlayRegistry::evict_idle`].
#[derive(Clone, Default)]
pub struct PlayRegistry {
    plays: Arc<RwLock<HashMap<Uuid, PlayEntry>>>,
}

impl PlayRegistry {
    /// Stores `session` under a fresh id.
    pub async fn insert(&self, session: StorySession) -> (Uuid, PlayHandle) {
        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(session));
        let entry = PlayEntry {
            handle: handle.clone(),
            touched: Instant::now(),
        };
        self.plays.write().await.insert(id, entry);
        (id, handle)
    }

    pub async fn get(&self, id: Uuid) -> Option<PlayHandle> {
        let mut plays = self.plays.write().await;
        let entry = plays.get_mut(&id)?;
        entry.touched = Instant::now();
        Some(entry.handle.clone())
    }

    /// Drops a play. Its pending progress writes still run to completion.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.plays.write().await.remove(&id).is_some()
    }

    /// Number of plays held.
    pub async fn count(&self) -> usize {
        self.plays.read().await.len()
    }

    /// Drops every play not looked up within `max_idle`. Returns how many
    /// were dropped.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        match Instant::now().checked_sub(max_idle) {
            Some(cutoff) => self.evict_touched_before(cutoff).await,
            None => 0,
        }
    }

    /// Runs [`Self::evict_idle`] every `period` until the registry is dropped
    /// by everyone else.
    pub async fn sweep(self, period: Duration, max_idle: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if Arc::strong_count(&self.plays) == 1 {
                break;
            }
            let evicted = self.evict_idle(max_idle).await;
            if evicted > 0 {
                info!(evicted, "idle plays dropped");
            }
        }
    }

    async fn evict_touched_before(&self, cutoff: Instant) -> usize {
        let mut plays = self.plays.write().await;
        let before = plays.len();
        plays.retain(|_, entry| entry.touched > cutoff);
        before - plays.len()
    }
}

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Read access to scenarios and their graphs.
    pub accessor: GraphAccessor,
    /// Remote progress ledger.
    pub ledger: Arc<dyn ProgressLedger>,
    /// Player inventories.
    pub catalog: Arc<dyn AssetCatalog>,
    /// Login and token checks.
    pub identity: Arc<dyn IdentityGateway>,
    /// Timestamps for transition records.
    pub clock: Arc<dyn Clock>,
    /// Sessions in play.
    pub plays: PlayRegistry,
    /// Settings applied to every new session.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        source: Arc<dyn ScenarioGraphSource>,
        ledger: Arc<dyn ProgressLedger>,
        catalog: Arc<dyn AssetCatalog>,
        identity: Arc<dyn IdentityGateway>,
        clock: Arc<dyn Clock>,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            accessor: GraphAccessor::new(source),
            ledger,
            catalog,
            identity,
            clock,
            plays: PlayRegistry::default(),
            session_config,
        }
    }
}
