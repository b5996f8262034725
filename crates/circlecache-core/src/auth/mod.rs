//! Authentication types for the location-sharing provider.
//!
//! This module provides:
//! - `SessionData`: the bearer token obtained from a credential exchange
//! - `LoginKind`: whether the identifier is a phone number or an email
//!
//! Sessions live in memory only and are never renewed.

pub mod session;

pub use session::{LoginKind, SessionData, DEFAULT_COUNTRY_CODE};
