//! Shared fakes for tracker integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use circlecache_core::distance::parse_distance;
use circlecache_core::{
    CircleSummary, DistanceOracle, LatLng, Member, SessionData, SessionGateway, TrackerConfig,
    WifiState,
};

pub fn member(name: &str, lat: f64, lng: f64) -> Member {
    Member {
        name: name.to_string(),
        phone: "5551234567".to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        disconnected: false,
        lat_lng: LatLng::new(lat, lng),
        since: "Mon Oct 19 12:00:00 2026".to_string(),
        address: "1 Main St".to_string(),
        battery: 75.0,
        charging: false,
        wifi: WifiState::On,
        speed: 0.0,
        driving: false,
    }
}

pub fn config() -> TrackerConfig {
    TrackerConfig::new("5551234567", "secret").with_auto_refresh(false)
}

/// Gateway backed by in-memory circle data that tests can change between passes.
/// A circle mapped to `None` fails its fetch.
pub struct FakeGateway {
    auth_ok: bool,
    circles: Option<Vec<CircleSummary>>,
    members: Mutex<HashMap<String, Option<Vec<Member>>>>,
    fetches: AtomicUsize,
    fetch_delay_ms: u64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeGateway {
    pub fn new(circles: Vec<(&str, Vec<Member>)>) -> Self {
        let summaries = circles
            .iter()
            .map(|(id, members)| CircleSummary {
                id: id.to_string(),
                name: format!("Circle {}", id),
                member_count: members.len() as u32,
            })
            .collect();
        let members = circles
            .into_iter()
            .map(|(id, members)| (id.to_string(), Some(members)))
            .collect();
        Self {
            auth_ok: true,
            circles: Some(summaries),
            members: Mutex::new(members),
            fetches: AtomicUsize::new(0),
            fetch_delay_ms: 0,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Hold every member fetch open for `delay_ms`
    pub fn with_fetch_delay_ms(mut self, delay_ms: u64) -> Self {
        self.fetch_delay_ms = delay_ms;
        self
    }

    pub fn rejecting_login() -> Self {
        Self {
            auth_ok: false,
            ..Self::new(vec![])
        }
    }

    pub fn failing_circle_list() -> Self {
        Self {
            circles: None,
            ..Self::new(vec![])
        }
    }

    pub fn set_members(&self, circle_id: &str, members: Option<Vec<Member>>) {
        self.members
            .lock()
            .unwrap()
            .insert(circle_id.to_string(), members);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Most member fetches ever open at the same moment
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionGateway for FakeGateway {
    async fn authenticate(&self, identifier: &str, _secret: &str) -> Result<SessionData> {
        if self.auth_ok {
            Ok(SessionData::new("Bearer".to_string(), "token".to_string(), identifier))
        } else {
            Err(anyhow!("Unauthorized"))
        }
    }

    async fn list_circles(&self, _session: &SessionData) -> Result<Vec<CircleSummary>> {
        self.circles.clone().ok_or_else(|| anyhow!("circle list unavailable"))
    }

    async fn fetch_members(&self, _session: &SessionData, circle_id: &str) -> Result<Vec<Member>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fetch_delay_ms > 0 {
            let open = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(open, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(self.fetch_delay_ms)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        self.members
            .lock()
            .unwrap()
            .get(circle_id)
            .cloned()
            .flatten()
            .ok_or_else(|| anyhow!("fetch failed for {}", circle_id))
    }
}

/// Oracle answering from a table of raw response texts keyed by "from->to".
/// Unknown pairs and unparsable texts are errors. Each answer is delayed by
/// `delay_ms` minus 10ms per prior entry, so earlier pairs finish last.
pub struct FakeOracle {
    responses: Vec<(String, String)>,
    delay_ms: u64,
    pub calls: Arc<AtomicUsize>,
}

impl FakeOracle {
    pub fn new(responses: &[((f64, f64), (f64, f64), &str)]) -> Self {
        Self {
            responses: responses
                .iter()
                .map(|(from, to, text)| {
                    (Self::key(LatLng::from(*from), LatLng::from(*to)), text.to_string())
                })
                .collect(),
            delay_ms: 0,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn empty() -> Self {
        Self::new(&[])
    }

    fn key(from: LatLng, to: LatLng) -> String {
        format!("{}->{}", from, to)
    }
}

#[async_trait]
impl DistanceOracle for FakeOracle {
    async fn distance(&self, from: LatLng, to: LatLng) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = Self::key(from, to);
        let position = self.responses.iter().position(|(k, _)| *k == key);

        let delay = self
            .delay_ms
            .saturating_sub(position.unwrap_or(0) as u64 * 10);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let text = position
            .map(|p| self.responses[p].1.as_str())
            .ok_or_else(|| anyhow!("no route for {}", key))?;
        parse_distance(text).ok_or_else(|| anyhow!("unparsable distance: {}", text))
    }
}
