use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;

use crate::api::client::REQUEST_TIMEOUT_SECS;
use crate::api::ApiError;
use crate::models::LatLng;

use super::{parse_distance, DistanceOracle};

/// Search page that renders a directions card for "directions from A to B"
const DIRECTIONS_SEARCH_URL: &str = "https://www.google.com/search";

/// Class list of the element holding the travel distance ("5 mi")
const DISTANCE_ELEMENT_CLASS: &str = "BbbuR uc9Qxb uE1RRc";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Distance oracle backed by a web directions search.
///
/// Best-effort: the page layout is not a stable API, so any response that
/// does not contain a parsable distance is reported as an error.
#[derive(Clone)]
pub struct DirectionsOracle {
    client: Client,
    search_url: String,
    distance_element: Regex,
    tags: Regex,
}

impl DirectionsOracle {
    pub fn new() -> Result<Self> {
        Self::with_search_url(DIRECTIONS_SEARCH_URL)
    }

    /// Point the oracle at another search endpoint (a local mock server in tests)
    pub fn with_search_url(search_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(BROWSER_USER_AGENT)
            .build()?;

        let distance_element = Regex::new(&format!(
            r#"(?s)<div[^>]*class="{}"[^>]*>(.*?)</div>"#,
            regex::escape(DISTANCE_ELEMENT_CLASS)
        ))
        .context("Invalid distance element pattern")?;
        let tags = Regex::new(r"<[^>]+>").context("Invalid tag pattern")?;

        Ok(Self {
            client,
            search_url: search_url.into(),
            distance_element,
            tags,
        })
    }

    /// Pull the distance out of a directions results page
    fn extract_distance(&self, html: &str) -> Option<f64> {
        let inner = self.distance_element.captures(html)?.get(1)?.as_str();
        let text = self.tags.replace_all(inner, " ");
        parse_distance(&text)
    }
}

#[async_trait]
impl DistanceOracle for DirectionsOracle {
    async fn distance(&self, from: LatLng, to: LatLng) -> Result<f64> {
        let query = format!("directions from {} to {}", from, to);

        let response = self
            .client
            .get(&self.search_url)
            .query(&[("q", query.as_str())])
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to send directions request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body).into());
        }

        let html = response.text().await.context("Failed to read directions page")?;
        self.extract_distance(&html)
            .ok_or_else(|| anyhow!("No distance found in directions page for {} -> {}", from, to))
    }
}
