use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::contains_ignore_case;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

impl From<(f64, f64)> for LatLng {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

/// Wi-Fi state as reported by the member's device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WifiState {
    On,
    Off,
    #[default]
    Unknown,
}

impl WifiState {
    /// Parse the provider's wire value ("1" / "0", or a number)
    pub fn from_wire(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("1") | Some("true") => WifiState::On,
            Some("0") | Some("false") => WifiState::Off,
            _ => WifiState::Unknown,
        }
    }
}

impl fmt::Display for WifiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WifiState::On => write!(f, "on"),
            WifiState::Off => write!(f, "off"),
            WifiState::Unknown => write!(f, "unknown"),
        }
    }
}

/// One person's latest known location and device status within a circle.
///
/// There is no stable identifier beyond `name`; two members may share a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub disconnected: bool,
    pub lat_lng: LatLng,
    /// When the provider last refreshed this location, in `ctime` layout
    pub since: String,
    pub address: String,
    pub battery: f64,
    pub charging: bool,
    pub wifi: WifiState,
    pub speed: f64,
    pub driving: bool,
}

impl Member {
    /// Case-insensitive substring match against the member's name.
    /// `query_lower` must already be lowercased.
    pub fn name_matches(&self, query_lower: &str) -> bool {
        contains_ignore_case(&self.name, query_lower)
    }

    pub fn location_tag(&self) -> LocationTag {
        LocationTag {
            name: self.name.clone(),
            address: self.address.clone(),
            since: self.since.clone(),
        }
    }

    /// Battery percentage for display, e.g. "85%" or "85% (charging)"
    pub fn battery_display(&self) -> String {
        if self.charging {
            format!("{:.0}% (charging)", self.battery)
        } else {
            format!("{:.0}%", self.battery)
        }
    }
}

/// A captured `(name, address, since)` triple used to detect later movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationTag {
    pub name: String,
    pub address: String,
    pub since: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Movement {
    pub name: String,
    /// True when the location timestamp changed, which does not imply a new position
    pub moved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberDistance {
    pub from: String,
    pub to: String,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointDistance {
    pub name: String,
    pub distance: f64,
}

#[cfg(test)]
pub(crate) fn test_member(name: &str, lat: f64, lng: f64) -> Member {
    Member {
        name: name.to_string(),
        phone: "5551234567".to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        disconnected: false,
        lat_lng: LatLng::new(lat, lng),
        since: "Mon Oct 19 12:00:00 2026".to_string(),
        address: "1 Main St".to_string(),
        battery: 80.0,
        charging: false,
        wifi: WifiState::On,
        speed: 0.0,
        driving: false,
    }
}
