//! Concurrent distance lookups against an external oracle.
//!
//! Each coordinate pair costs one network round trip and the oracle has no
//! batch endpoint, so a batch is dispatched concurrently (bounded by
//! `MAX_CONCURRENT_DISTANCE_REQUESTS`) and reassembled in input order.
//! A failed lookup degrades to `0.0` for that pair only.

pub mod directions;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::api::client::REQUEST_TIMEOUT_SECS;
use crate::models::LatLng;

pub use directions::DirectionsOracle;

/// Maximum in-flight oracle requests per batch.
/// Batches are small and bursty; this caps outbound connections if they grow.
pub const MAX_CONCURRENT_DISTANCE_REQUESTS: usize = 8;

/// Distance reported for a pair whose lookup failed
pub const UNAVAILABLE_DISTANCE: f64 = 0.0;

/// Converts two coordinates into a travel distance.
#[async_trait]
pub trait DistanceOracle: Send + Sync {
    async fn distance(&self, from: LatLng, to: LatLng) -> Result<f64>;
}

/// Look up every pair concurrently. Output order matches `pairs` regardless
/// of completion order; failures become `UNAVAILABLE_DISTANCE`.
pub async fn fan_out(oracle: &dyn DistanceOracle, pairs: &[(LatLng, LatLng)]) -> Vec<f64> {
    debug!(pairs = pairs.len(), "Dispatching distance lookups");

    stream::iter(pairs.iter().copied())
        .map(|(from, to)| async move {
            let lookup = oracle.distance(from, to);
            match tokio::time::timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS), lookup).await {
                Ok(Ok(distance)) if distance.is_finite() => distance,
                Ok(Ok(distance)) => {
                    warn!(%from, %to, distance, "Oracle returned a non-finite distance");
                    UNAVAILABLE_DISTANCE
                }
                Ok(Err(e)) => {
                    warn!(%from, %to, error = %e, "Distance lookup failed");
                    UNAVAILABLE_DISTANCE
                }
                Err(_) => {
                    warn!(%from, %to, timeout_secs = REQUEST_TIMEOUT_SECS, "Distance lookup timed out");
                    UNAVAILABLE_DISTANCE
                }
            }
        })
        .buffered(MAX_CONCURRENT_DISTANCE_REQUESTS)
        .collect()
        .await
}

/// Parse the leading number of an oracle distance string.
///
/// `"5 mi"` → 5, `"1,204 km"` → 1204, `"abc"` → None.
pub fn parse_distance(text: &str) -> Option<f64> {
    let token = text.split_whitespace().next()?;
    let cleaned: String = token.chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|d| d.is_finite())
}
