//! circlecache core - polls a family location-sharing service, keeps the
//! latest snapshot of every circle in memory, and answers queries over it.
//!
//! - `api`: the session gateway trait and the provider HTTP client
//! - `cache`: the atomically swapped in-memory snapshot
//! - `tracker`: construction, the background refresh loop, and queries
//! - `distance`: concurrent fan-out to a distance oracle

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod distance;
pub mod error;
pub mod models;
pub mod tracker;
pub mod utils;

pub use api::{ApiClient, ApiError, SessionGateway};
pub use auth::{LoginKind, SessionData};
pub use cache::Snapshot;
pub use config::TrackerConfig;
pub use distance::{DirectionsOracle, DistanceOracle};
pub use error::TrackerError;
pub use models::{
    Circle, CircleSummary, LatLng, LocationTag, Member, MemberDistance, Movement, PointDistance,
    WifiState,
};
pub use tracker::{ConnectionState, RefreshReport, Tracker};
