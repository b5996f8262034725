use anyhow::Result;
use async_trait::async_trait;

use crate::auth::SessionData;
use crate::models::{CircleSummary, Member};

/// Authenticated access to the location-sharing provider.
///
/// Any `Err` is treated by the tracker as "no update this cycle", never as fatal.
#[async_trait]
pub trait SessionGateway: Send + Sync {
    /// Exchange credentials for a bearer session
    async fn authenticate(&self, identifier: &str, secret: &str) -> Result<SessionData>;

    /// List the circles visible to the session, in provider order
    async fn list_circles(&self, session: &SessionData) -> Result<Vec<CircleSummary>>;

    /// Fetch the current member list of one circle, in provider order
    async fn fetch_members(&self, session: &SessionData, circle_id: &str) -> Result<Vec<Member>>;
}
