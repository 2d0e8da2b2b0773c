//! The application context: owns the durable store and every in-memory
//! collection, and carries the per-session status the probes maintain.
//!
//! All mutation happens on the single interactive-loop task, so the
//! collections need no locking; the store is written back on every mutation.

use chrono::{DateTime, Local, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ChatSession, KnowledgeSource, Message, UsageStats, VisitStatus, VisitorLog};
use crate::services::network_service::{self, ConnectionStatus, Location};
use crate::services::store_service::{StateStore, StoreKey};
use crate::services::usage_service;

pub struct App {
    store: StateStore,

    pub messages: Vec<Message>,
    pub sources: Vec<KnowledgeSource>,
    pub history: Vec<ChatSession>,
    pub usage: UsageStats,

    pub visitor_logs: Vec<VisitorLog>,
    pub connection: ConnectionStatus,
    pub location: Location,
    pub update_available: bool,

    /// Fence for in-flight answer requests: a completion is applied only if
    /// it carries the current generation.
    generation: u64,

    baseline_version: Option<i64>,
    last_rollover_day: NaiveDate,

    /// Client used by the probes (the generation client is built per request)
    pub http: reqwest::Client,
}

impl App {
    pub fn load() -> Result<Self> {
        Ok(Self::with_store(StateStore::open()?))
    }

    /// Build the context over an explicit store, loading every collection
    /// with its fallback.
    pub fn with_store(store: StateStore) -> Self {
        let messages = store.load_messages();
        let sources = store.load_sources();
        let history = store.load_history();
        let usage = store.load_usage();

        Self {
            store,
            messages,
            sources,
            history,
            usage,
            visitor_logs: Vec::new(),
            connection: ConnectionStatus::default(),
            location: Location::default(),
            update_available: false,
            generation: 0,
            baseline_version: None,
            last_rollover_day: Local::now().date_naive(),
            http: network_service::probe_client(),
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    // ------------------------------------------------------------------
    // Persistence cycle: one save per collection, called after mutation
    // ------------------------------------------------------------------

    pub fn save_messages(&self) {
        self.store.save_messages(&self.messages);
    }

    pub fn save_sources(&self) {
        self.store.save_sources(&self.sources);
    }

    pub fn save_history(&self) {
        self.store.save_history(&self.history);
    }

    pub fn save_usage(&self) {
        self.store.save_usage(&self.usage);
    }

    pub fn welcome_seen(&self) -> bool {
        self.store.welcome_seen()
    }

    pub fn mark_welcome_seen(&self) {
        self.store.mark_welcome_seen();
    }

    /// Erase the durable history key along with the collection
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.store.delete(StoreKey::History);
    }

    /// Erase everything durable; the caller restarts from a clean state
    pub fn clear_all(&self) -> Result<()> {
        self.store.clear_all()
    }

    // ------------------------------------------------------------------
    // Request fencing
    // ------------------------------------------------------------------

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new logical request (or invalidate outstanding ones)
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    // ------------------------------------------------------------------
    // Probe state
    // ------------------------------------------------------------------

    /// Feed one observed manifest timestamp. The first observation becomes
    /// the baseline; any later one signals an available update. Returns true
    /// when the flag newly flipped.
    pub fn observe_version(&mut self, timestamp: i64) -> bool {
        match self.baseline_version {
            None => {
                self.baseline_version = Some(timestamp);
                false
            }
            Some(baseline) if timestamp > baseline && !self.update_available => {
                self.update_available = true;
                true
            }
            _ => false,
        }
    }

    /// Record the geolocation result and seed the session's visitor log
    pub fn set_location(&mut self, location: Location) {
        let resolved = location.ip != "Unknown";
        self.location = location;
        if resolved {
            self.push_visitor_log("System Check", VisitStatus::Success);
        }
    }

    pub fn push_visitor_log(&mut self, model_used: &str, status: VisitStatus) {
        self.visitor_logs.push(VisitorLog {
            id: Uuid::new_v4().to_string(),
            ip: self.location.ip.clone(),
            location: self.location.city.clone(),
            timestamp: Utc::now(),
            model_used: model_used.to_string(),
            status,
        });
    }

    /// Minute-polled sweep; clears usage stats and visitor logs once per
    /// local date change.
    pub fn run_daily_rollover(&mut self, now: DateTime<Local>) -> bool {
        let swept = usage_service::run_daily_rollover(
            &mut self.usage,
            &mut self.visitor_logs,
            &mut self.last_rollover_day,
            now,
        );
        if swept {
            self.save_usage();
        }
        swept
    }
}
