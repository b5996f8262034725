use serde::{Deserialize, Serialize};

use super::Member;

/// A circle as listed by the provider, before any member data is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircleSummary {
    pub id: String,
    pub name: String,
    pub member_count: u32,
}

/// A named group of people sharing locations, with the latest member list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circle {
    pub id: String,
    pub name: String,
    pub member_count: u32,
    pub members: Vec<Member>,
}

impl Circle {
    pub fn summary(&self) -> CircleSummary {
        CircleSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            member_count: self.member_count,
        }
    }
}

impl From<CircleSummary> for Circle {
    fn from(summary: CircleSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            member_count: summary.member_count,
            members: Vec::new(),
        }
    }
}
