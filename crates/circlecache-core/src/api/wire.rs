//! Provider response shapes and their conversion into domain models.
//!
//! The provider mixes JSON strings and numbers for the same field across
//! accounts ("battery": "85" vs 85), so scalar fields go through `Loose`.

use serde::Deserialize;

use crate::models::{CircleSummary, LatLng, Member, WifiState};
use crate::utils::format_ctime;

/// A scalar that may arrive as a bool, number, or string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Loose {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Loose {
    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Loose::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Loose::Int(i) => Some(*i as f64),
            Loose::Float(f) => Some(*f),
            Loose::Text(s) => s.trim().parse().ok(),
        }
    }

    pub(crate) fn as_i64(&self) -> Option<i64> {
        match self {
            Loose::Int(i) => Some(*i),
            Loose::Float(f) => Some(*f as i64),
            Loose::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
            }
            Loose::Bool(_) => None,
        }
    }

    pub(crate) fn as_bool(&self) -> bool {
        match self {
            Loose::Bool(b) => *b,
            Loose::Int(i) => *i != 0,
            Loose::Float(f) => *f != 0.0,
            Loose::Text(s) => matches!(s.trim(), "1" | "true" | "yes"),
        }
    }

    pub(crate) fn as_text(&self) -> String {
        match self {
            Loose::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            Loose::Int(i) => i.to_string(),
            Loose::Float(f) => f.to_string(),
            Loose::Text(s) => s.clone(),
        }
    }
}

fn loose_f64(value: &Option<Loose>) -> f64 {
    value.as_ref().and_then(Loose::as_f64).unwrap_or(0.0)
}

fn loose_bool(value: &Option<Loose>) -> bool {
    value.as_ref().map(Loose::as_bool).unwrap_or(false)
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub token_type: String,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CirclesResponse {
    #[serde(default)]
    pub circles: Vec<CircleApi>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CircleApi {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "memberCount")]
    pub member_count: Option<Loose>,
}

impl CircleApi {
    pub(crate) fn into_summary(self) -> CircleSummary {
        let member_count = self
            .member_count
            .as_ref()
            .and_then(Loose::as_i64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0);
        CircleSummary {
            id: self.id,
            name: self.name.unwrap_or_default(),
            member_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CircleDetailResponse {
    #[serde(default)]
    pub members: Vec<MemberApi>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemberApi {
    #[serde(rename = "firstName")]
    first_name: Option<String>,
    #[serde(rename = "lastName")]
    last_name: Option<String>,
    #[serde(default)]
    communications: Vec<CommunicationApi>,
    issues: Option<IssuesApi>,
    location: Option<LocationApi>,
}

#[derive(Debug, Deserialize)]
struct CommunicationApi {
    channel: Option<String>,
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IssuesApi {
    disconnected: Option<Loose>,
}

#[derive(Debug, Default, Deserialize)]
struct LocationApi {
    latitude: Option<Loose>,
    longitude: Option<Loose>,
    since: Option<Loose>,
    address1: Option<String>,
    battery: Option<Loose>,
    charge: Option<Loose>,
    #[serde(rename = "wifiState")]
    wifi_state: Option<Loose>,
    speed: Option<Loose>,
    #[serde(rename = "isDriving")]
    is_driving: Option<Loose>,
}

impl MemberApi {
    /// Contact value for a channel, falling back to list position when the
    /// provider omits channel names (voice first, email second).
    fn communication(&self, channel: &str, position: usize) -> String {
        self.communications
            .iter()
            .find(|c| c.channel.as_deref().is_some_and(|ch| ch.eq_ignore_ascii_case(channel)))
            .or_else(|| {
                self.communications
                    .get(position)
                    .filter(|c| c.channel.is_none())
            })
            .and_then(|c| c.value.clone())
            .unwrap_or_default()
    }

    pub(crate) fn into_member(self) -> Member {
        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string();
        let phone = self.communication("Voice", 0);
        let email = self.communication("Email", 1);
        let disconnected = self
            .issues
            .as_ref()
            .map(|i| loose_bool(&i.disconnected))
            .unwrap_or(false);
        let location = self.location.unwrap_or_default();

        let since = location
            .since
            .as_ref()
            .and_then(Loose::as_i64)
            .map(format_ctime)
            .unwrap_or_default();
        let wifi_text = location.wifi_state.as_ref().map(Loose::as_text);

        Member {
            name,
            phone,
            email,
            disconnected,
            lat_lng: LatLng::new(loose_f64(&location.latitude), loose_f64(&location.longitude)),
            since,
            address: location.address1.unwrap_or_default(),
            battery: loose_f64(&location.battery),
            charging: loose_bool(&location.charge),
            wifi: WifiState::from_wire(wifi_text.as_deref()),
            speed: loose_f64(&location.speed),
            driving: loose_bool(&location.is_driving),
        }
    }
}
