//! The polling tracker: owns the snapshot, refreshes it, answers queries.
//!
//! Lifecycle:
//! 1. `Tracker::connect` authenticates, lists circles, and runs one refresh
//!    pass before returning, so the first query always sees loaded data.
//!    It never fails and never spawns work; failures leave the tracker in a
//!    degraded state with an empty snapshot.
//! 2. `Tracker::start` launches the single background refresh task.
//! 3. `Tracker::stop` / `Tracker::shutdown` end it after its current cycle.
//!
//! Every refresh pass, background or manual, holds `refresh_lock`, so at most
//! one pass writes the snapshot at a time.

mod query;
mod refresh;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::client::REQUEST_TIMEOUT_SECS;
use crate::api::SessionGateway;
use crate::auth::SessionData;
use crate::cache::{Snapshot, SnapshotStore};
use crate::config::TrackerConfig;
use crate::distance::DistanceOracle;
use crate::models::CircleSummary;

pub use refresh::RefreshReport;

/// Outcome of the connection attempt made at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Logged in and the circle list was loaded
    Connected,
    /// Logged in, but the circle list could not be loaded (or was empty)
    NotConnected,
    /// Authentication failed
    NotLoggedIn,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::NotConnected => write!(f, "not connected"),
            ConnectionState::NotLoggedIn => write!(f, "not logged in"),
        }
    }
}

/// State shared between the owner and the background refresh task.
struct TrackerInner {
    config: TrackerConfig,
    gateway: Arc<dyn SessionGateway>,
    oracle: Arc<dyn DistanceOracle>,
    session: Option<SessionData>,
    state: ConnectionState,
    store: SnapshotStore,
    refresh_lock: Mutex<()>,
}

/// A spawned refresh loop and its own stop signal
struct RefreshTask {
    handle: JoinHandle<()>,
    stop: watch::Sender<bool>,
}

impl RefreshTask {
    fn is_live(&self) -> bool {
        !self.handle.is_finished() && !*self.stop.borrow()
    }
}

pub struct Tracker {
    inner: Arc<TrackerInner>,
    task: Option<RefreshTask>,
}

/// Bound on any single gateway call, whatever the gateway implementation
pub(crate) fn call_timeout() -> Duration {
    Duration::from_secs(REQUEST_TIMEOUT_SECS)
}

impl Tracker {
    /// Log in, load the circle list, and perform the first refresh pass.
    pub async fn connect(
        config: TrackerConfig,
        gateway: Arc<dyn SessionGateway>,
        oracle: Arc<dyn DistanceOracle>,
    ) -> Self {
        let store = SnapshotStore::new();

        let session = match tokio::time::timeout(
            call_timeout(),
            gateway.authenticate(&config.identifier, &config.secret),
        )
        .await
        {
            Ok(Ok(session)) => Some(session),
            Ok(Err(e)) => {
                warn!(identifier = %config.identifier, error = %e, "Authentication failed");
                None
            }
            Err(_) => {
                warn!(identifier = %config.identifier, "Authentication timed out");
                None
            }
        };

        let state = match &session {
            None => ConnectionState::NotLoggedIn,
            Some(session) => {
                match tokio::time::timeout(call_timeout(), gateway.list_circles(session)).await {
                    Ok(Ok(circles)) if !circles.is_empty() => {
                        info!(circles = circles.len(), "Circle list loaded");
                        store.replace_circles(circles);
                        ConnectionState::Connected
                    }
                    Ok(Ok(_)) => {
                        warn!("Provider returned no circles");
                        ConnectionState::NotConnected
                    }
                    Ok(Err(e)) => {
                        warn!(error = %e, "Failed to load circle list");
                        ConnectionState::NotConnected
                    }
                    Err(_) => {
                        warn!("Circle list request timed out");
                        ConnectionState::NotConnected
                    }
                }
            }
        };

        let inner = Arc::new(TrackerInner {
            config,
            gateway,
            oracle,
            session,
            state,
            store,
            refresh_lock: Mutex::new(()),
        });

        let report = inner.refresh_all().await;
        info!(
            state = %state,
            updated = report.updated,
            failed = report.failed.len(),
            "Initial refresh complete"
        );

        Self { inner, task: None }
    }

    /// Launch the background refresh loop.
    ///
    /// Returns true if a loop is running afterwards. Does nothing when
    /// `auto_refresh` is off or a loop is already running. A loop that was
    /// stopped but is still finishing its pass keeps its own stop signal and
    /// exits; the new loop's passes queue behind it on `refresh_lock`.
    pub fn start(&mut self) -> bool {
        if !self.inner.config.auto_refresh {
            info!("Auto refresh disabled, not starting refresh loop");
            return false;
        }
        if self.is_running() {
            return true;
        }

        let (stop, stop_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let interval = self.inner.config.refresh_interval();
        let handle = tokio::spawn(async move {
            TrackerInner::run_refresh_loop(inner, interval, stop_rx).await;
        });
        self.task = Some(RefreshTask { handle, stop });
        true
    }

    /// Ask the refresh loop to exit. A pass already under way finishes;
    /// in-flight fetches are not cancelled.
    pub fn stop(&self) {
        if let Some(task) = &self.task {
            task.stop.send_replace(true);
        }
    }

    /// Stop the refresh loop and wait for it to exit.
    pub async fn shutdown(&mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.handle.await {
                warn!(error = %e, "Refresh loop ended abnormally");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(RefreshTask::is_live)
    }

    /// Run one refresh pass now. Waits for a background pass in progress.
    pub async fn refresh_all(&self) -> RefreshReport {
        self.inner.refresh_all().await
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.state != ConnectionState::NotLoggedIn
    }

    pub fn is_connected(&self) -> bool {
        self.inner.state == ConnectionState::Connected
    }

    /// Number of circles from the circle list loaded at construction
    pub fn circle_count(&self) -> usize {
        self.inner.store.load().circles.len()
    }

    pub fn circles(&self) -> Vec<CircleSummary> {
        self.inner.store.load().circles.iter().map(|c| c.summary()).collect()
    }

    /// Consistent point-in-time view of all circles and members
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.store.load()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.inner.config
    }
}
