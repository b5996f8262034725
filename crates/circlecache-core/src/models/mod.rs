//! Data models for circles and their members.
//!
//! - `Circle`, `CircleSummary`: shared-location groups
//! - `Member`: one person's latest location and device status
//! - Query results: `LocationTag`, `Movement`, `MemberDistance`, `PointDistance`

pub mod circle;
pub mod member;

pub use circle::{Circle, CircleSummary};
pub use member::{LatLng, LocationTag, Member, MemberDistance, Movement, PointDistance, WifiState};
