//! HTTP client for the Life360 v3 REST API.
//!
//! `ApiClient` implements `SessionGateway`: credential exchange, circle
//! listing, and per-circle member fetches.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::{LoginKind, SessionData};
use crate::models::{CircleSummary, Member};

use super::wire::{AuthResponse, CircleApi, CircleDetailResponse, CirclesResponse, MemberApi};
use super::{ApiError, SessionGateway};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for all provider endpoints
const API_BASE_URL: &str = "https://www.life360.com";

/// Public client credential the provider's own web app sends with the token request
const CLIENT_BASIC_AUTH: &str = "Basic U3dlcUFOQWdFVkVoVWt1cGVjcmVrYXN0ZXFhVGVXckFTV2E1dXN3MzpXMnZBV3JlY2hhUHJlZGFoVVJhZ1VYYWZyQW5hbWVqdQ==";

/// HTTP request timeout in seconds.
/// A slow call counts as that call's failure instead of stalling a refresh pass.
pub const REQUEST_TIMEOUT_SECS: u64 = 5;

const USER_AGENT: &str = concat!("circlecache/", env!("CARGO_PKG_VERSION"));

/// API client for the location-sharing provider.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    login: LoginKind,
}

impl ApiClient {
    /// Create a new API client against the production endpoints
    pub fn new(login: LoginKind) -> Result<Self> {
        Self::with_base_url(API_BASE_URL, login)
    }

    /// Create a client against another host (a local mock server in tests)
    pub fn with_base_url(base_url: impl Into<String>, login: LoginKind) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            login,
        })
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, session: &SessionData, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header(header::AUTHORIZATION, session.authorization())
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }
}

#[async_trait]
impl SessionGateway for ApiClient {
    async fn authenticate(&self, identifier: &str, secret: &str) -> Result<SessionData> {
        let url = format!("{}/v3/oauth2/token.json", self.base_url);

        let mut form: Vec<(&str, &str)> = Vec::with_capacity(5);
        match &self.login {
            LoginKind::Phone { country_code } => {
                form.push(("countryCode", country_code.as_str()));
                form.push(("phone", identifier));
            }
            LoginKind::Email => form.push(("username", identifier)),
        }
        form.push(("password", secret));
        form.push(("grant_type", "password"));

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .header(header::AUTHORIZATION, CLIENT_BASIC_AUTH)
            .form(&form)
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to send authentication request")?;

        let response = Self::check_response(response).await?;

        let auth: AuthResponse = response.json().await.context("Failed to parse auth response")?;
        if auth.access_token.is_empty() {
            return Err(ApiError::InvalidResponse("empty access token".to_string()).into());
        }

        debug!(token_type = %auth.token_type, "Authenticated");
        Ok(SessionData::new(auth.token_type, auth.access_token, identifier))
    }

    async fn list_circles(&self, session: &SessionData) -> Result<Vec<CircleSummary>> {
        let url = format!("{}/v3/circles/", self.base_url);
        let response: CirclesResponse = self.get(session, &url).await?;
        Ok(response.circles.into_iter().map(CircleApi::into_summary).collect())
    }

    async fn fetch_members(&self, session: &SessionData, circle_id: &str) -> Result<Vec<Member>> {
        let url = format!("{}/v3/circles/{}", self.base_url, circle_id);
        let response: CircleDetailResponse = self.get(session, &url).await?;
        Ok(response.members.into_iter().map(MemberApi::into_member).collect())
    }
}
