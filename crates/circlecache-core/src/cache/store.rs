use std::sync::Arc;
use std::time::Duration as StdDuration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::models::{Circle, CircleSummary, Member};

/// A snapshot is considered stale once it misses this many refresh intervals.
const STALE_INTERVALS: u32 = 3;

/// Point-in-time copy of every circle and its members.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub circles: Vec<Circle>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Every member across every circle, in circle-then-member order
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.circles.iter().flat_map(|c| c.members.iter())
    }

    pub fn age_minutes(&self) -> Option<i64> {
        self.refreshed_at.map(|at| (Utc::now() - at).num_minutes())
    }

    pub fn age_display(&self) -> String {
        let Some(minutes) = self.age_minutes() else {
            return "never".to_string();
        };
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            let remaining_mins = minutes % 60;
            if remaining_mins >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            let remaining_hours = (minutes % 1440) / 60;
            if remaining_hours >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    /// True when no refresh has landed within `STALE_INTERVALS` intervals
    pub fn is_stale(&self, refresh_interval: StdDuration) -> bool {
        let Some(at) = self.refreshed_at else {
            return true;
        };
        let window = refresh_interval * STALE_INTERVALS;
        match chrono::Duration::from_std(window) {
            Ok(window) => Utc::now() - at > window,
            Err(_) => false,
        }
    }
}

/// Owner of the current snapshot.
///
/// Readers call `load()` and get an immutable `Arc<Snapshot>` without locking.
/// The single writer publishes whole new values; a reader never sees a
/// partially replaced member list.
pub struct SnapshotStore {
    current: ArcSwap<Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::default()),
        }
    }

    pub fn load(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Install the circle list. Member lists start empty.
    pub fn replace_circles(&self, circles: Vec<CircleSummary>) {
        let circles: Vec<Circle> = circles.into_iter().map(Circle::from).collect();
        self.current.store(Arc::new(Snapshot {
            circles,
            refreshed_at: None,
        }));
    }

    /// Substitute one circle's member list. Returns false if `index` is out of range.
    pub fn replace_members(&self, index: usize, members: Vec<Member>) -> bool {
        let mut replaced = false;
        self.current.rcu(|current| {
            let mut next = Snapshot::clone(current);
            replaced = match next.circles.get_mut(index) {
                Some(circle) => {
                    circle.members = members.clone();
                    true
                }
                None => false,
            };
            next
        });
        if !replaced {
            warn!(index, "Member update for unknown circle index ignored");
        }
        replaced
    }

    /// Record that a refresh pass finished
    pub fn mark_refreshed(&self) {
        self.current.rcu(|current| Snapshot {
            circles: current.circles.clone(),
            refreshed_at: Some(Utc::now()),
        });
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
