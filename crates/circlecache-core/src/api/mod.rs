//! Session gateway to the location-sharing provider.
//!
//! `SessionGateway` is the narrow interface the tracker consumes;
//! `ApiClient` implements it against the Life360 REST API.
//!
//! The API uses bearer token authentication obtained by exchanging a
//! phone number (or email) and password at the OAuth token endpoint.

pub mod client;
pub mod error;
pub mod gateway;
mod wire;

pub use client::ApiClient;
pub use error::ApiError;
pub use gateway::SessionGateway;
