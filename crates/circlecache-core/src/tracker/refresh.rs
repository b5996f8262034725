use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{call_timeout, TrackerInner};

/// Result of one refresh pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Circles whose member list was replaced
    pub updated: usize,
    /// IDs of circles left at their previous member list
    pub failed: Vec<String>,
}

impl TrackerInner {
    /// Re-fetch members for every known circle, in circle-list order.
    ///
    /// A circle whose fetch fails, times out, or returns no members keeps its
    /// previous list; the pass continues with the next circle.
    pub(super) async fn refresh_all(&self) -> RefreshReport {
        let _pass = self.refresh_lock.lock().await;
        let mut report = RefreshReport::default();
        let Some(session) = &self.session else {
            debug!("Not logged in, skipping refresh");
            return report;
        };

        let circle_ids: Vec<String> = self
            .store
            .load()
            .circles
            .iter()
            .map(|c| c.id.clone())
            .collect();

        for (index, circle_id) in circle_ids.iter().enumerate() {
            let fetch = self.gateway.fetch_members(session, circle_id);
            match tokio::time::timeout(call_timeout(), fetch).await {
                Ok(Ok(members)) if !members.is_empty() => {
                    debug!(circle = %circle_id, members = members.len(), "Members refreshed");
                    if self.store.replace_members(index, members) {
                        report.updated += 1;
                    }
                }
                Ok(Ok(_)) => {
                    warn!(circle = %circle_id, "Provider returned no members, keeping previous list");
                    report.failed.push(circle_id.clone());
                }
                Ok(Err(e)) => {
                    warn!(circle = %circle_id, error = %e, "Member fetch failed, keeping previous list");
                    report.failed.push(circle_id.clone());
                }
                Err(_) => {
                    warn!(circle = %circle_id, "Member fetch timed out, keeping previous list");
                    report.failed.push(circle_id.clone());
                }
            }
        }

        if report.updated > 0 {
            self.store.mark_refreshed();
        }
        report
    }

    /// Refresh, sleep, repeat until `stop` turns true or its sender is dropped.
    pub(super) async fn run_refresh_loop(
        inner: Arc<TrackerInner>,
        interval: Duration,
        mut stop: watch::Receiver<bool>,
    ) {
        info!(interval_secs = interval.as_secs(), "Refresh loop started");

        while !*stop.borrow_and_update() {
            let report = inner.refresh_all().await;
            if !report.failed.is_empty() {
                debug!(failed = ?report.failed, "Refresh pass finished with stale circles");
            }
            if let Some(session) = &inner.session {
                debug!(session_age_secs = session.age().num_seconds(), "Refresh pass done");
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = stop.changed() => {
                    // Sender gone means the Tracker was dropped
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Refresh loop stopped");
    }
}
