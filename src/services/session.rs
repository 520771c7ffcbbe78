use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Library, PriceMap, Recommendation, ResolvedIdentifier};

/// Where a submission cycle currently stands
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Resolving,
    Fetching,
    Enriching,
    Ready,
    Failed,
}

/// Per-session view state, owned by the most recent submission
#[derive(Debug, Clone)]
pub struct ViewState {
    pub generation: u64,
    pub phase: Phase,
    pub message: Option<String>,
    pub identifier: Option<ResolvedIdentifier>,
    pub library: Option<Library>,
    pub recommendations: Vec<Recommendation>,
    pub prices: PriceMap,
    pub updated_at: DateTime<Utc>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            generation: 0,
            phase: Phase::Idle,
            message: None,
            identifier: None,
            library: None,
            recommendations: Vec::new(),
            prices: PriceMap::new(),
            updated_at: Utc::now(),
        }
    }
}

impl ViewState {
    /// Starts a new submission cycle, discarding every prior result
    pub fn begin(&mut self) -> u64 {
        let generation = self.generation + 1;
        *self = Self {
            generation,
            ..Self::default()
        };
        generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Applies `update` only if `generation` still owns this view.
    ///
    /// Returns false for results from a superseded cycle, which are dropped.
    pub fn apply(&mut self, generation: u64, update: impl FnOnce(&mut Self)) -> bool {
        if !self.is_current(generation) {
            tracing::debug!(
                generation = generation,
                current = self.generation,
                "Dropping stale update"
            );
            return false;
        }
        update(self);
        self.updated_at = Utc::now();
        true
    }
}

const DEFAULT_IDLE_TTL_SECS: i64 = 30 * 60;

/// In-memory view state for every active session
///
/// Sessions untouched for longer than the idle TTL are evicted whenever a
/// submission begins.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, ViewState>>>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_ttl(Duration::seconds(DEFAULT_IDLE_TTL_SECS))
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    /// Starts a submission for `session_id`, creating the session if needed
    pub async fn begin(&self, session_id: Uuid) -> u64 {
        let mut sessions = self.inner.write().await;
        self.evict_idle(&mut sessions, session_id);
        sessions.entry(session_id).or_default().begin()
    }

    /// Commits an update from submission `generation`; see [`ViewState::apply`]
    pub async fn commit(
        &self,
        session_id: Uuid,
        generation: u64,
        update: impl FnOnce(&mut ViewState),
    ) -> bool {
        let mut sessions = self.inner.write().await;
        match sessions.get_mut(&session_id) {
            Some(view) => view.apply(generation, update),
            None => false,
        }
    }

    pub async fn contains(&self, session_id: Uuid) -> bool {
        self.inner.read().await.contains_key(&session_id)
    }

    pub async fn snapshot(&self, session_id: Uuid) -> Option<ViewState> {
        self.inner.read().await.get(&session_id).cloned()
    }

    fn evict_idle(&self, sessions: &mut HashMap<Uuid, ViewState>, keep: Uuid) {
        let cutoff = Utc::now() - self.idle_ttl;
        let before = sessions.len();
        sessions.retain(|id, view| *id == keep || view.updated_at > cutoff);

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
    }
}
