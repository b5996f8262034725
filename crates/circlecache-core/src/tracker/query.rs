//! Read-only queries over the current snapshot.
//!
//! Every query loads one snapshot up front and works on that view, so a
//! concurrent refresh never mixes old and new data within a single answer.
//!
//! Operations needing exactly one member per query take the first match in
//! circle-then-member order. No match is `TrackerError::MemberNotFound`.

use tracing::debug;

use crate::cache::Snapshot;
use crate::distance::fan_out;
use crate::error::{Result, TrackerError};
use crate::models::{LatLng, LocationTag, Member, MemberDistance, Movement, PointDistance};

use super::Tracker;

/// First member whose name contains `query`, case-insensitively.
fn first_match<'a>(snapshot: &'a Snapshot, query: &str) -> Result<&'a Member> {
    let needle = query.to_lowercase();
    let mut matches = snapshot.members().filter(|m| m.name_matches(&needle));
    let first = matches
        .next()
        .ok_or_else(|| TrackerError::MemberNotFound(query.to_string()))?;
    if matches.next().is_some() {
        debug!(query, chosen = %first.name, "Ambiguous name, using first match");
    }
    Ok(first)
}

/// Index pairs (i, j) with i < j, i ascending outer, j ascending inner
fn unordered_pairs(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect()
}

impl Tracker {
    /// Every member name across every circle, in circle-then-member order.
    /// Names are not deduplicated.
    pub fn list_all_members(&self) -> Vec<String> {
        self.snapshot().members().map(|m| m.name.clone()).collect()
    }

    /// Members whose name contains any of `queries` (case-insensitive).
    ///
    /// Results follow snapshot order. A record matched by several queries
    /// appears once; distinct records with equal fields also collapse.
    pub fn find_members_by_name<S: AsRef<str>>(&self, queries: &[S]) -> Vec<Member> {
        let needles: Vec<String> = queries.iter().map(|q| q.as_ref().to_lowercase()).collect();
        let snapshot = self.snapshot();

        let mut found: Vec<Member> = Vec::new();
        for member in snapshot.members() {
            if needles.iter().any(|n| member.name_matches(n)) && !found.contains(member) {
                found.push(member.clone());
            }
        }
        found
    }

    /// First member whose email equals `email`, ignoring case
    pub fn find_member_by_email(&self, email: &str) -> Option<Member> {
        let email = email.trim();
        self.snapshot()
            .members()
            .find(|m| !m.email.is_empty() && m.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    /// `(name, address, since)` for every member matching `queries`
    pub fn current_location<S: AsRef<str>>(&self, queries: &[S]) -> Vec<LocationTag> {
        self.find_members_by_name(queries)
            .iter()
            .map(Member::location_tag)
            .collect()
    }

    /// Compare captured tags against the current snapshot.
    ///
    /// `moved` is true when the location timestamp changed. Fails if a tagged
    /// name no longer matches anyone.
    pub fn has_member_moved(&self, tags: &[LocationTag]) -> Result<Vec<Movement>> {
        let snapshot = self.snapshot();
        tags.iter()
            .map(|tag| {
                let member = first_match(&snapshot, &tag.name)?;
                Ok(Movement {
                    name: tag.name.clone(),
                    moved: member.since != tag.since,
                })
            })
            .collect()
    }

    /// Distance for every unordered pair of the named members.
    ///
    /// Pairs come back as (0,1), (0,2), ..., (1,2), ... over `queries`.
    pub async fn distance_between_users<S: AsRef<str>>(
        &self,
        queries: &[S],
    ) -> Result<Vec<MemberDistance>> {
        let snapshot = self.snapshot();
        let members = queries
            .iter()
            .map(|q| first_match(&snapshot, q.as_ref()))
            .collect::<Result<Vec<&Member>>>()?;

        let index_pairs = unordered_pairs(members.len());
        let coordinates: Vec<(LatLng, LatLng)> = index_pairs
            .iter()
            .map(|&(i, j)| (members[i].lat_lng, members[j].lat_lng))
            .collect();

        let distances = fan_out(self.inner.oracle.as_ref(), &coordinates).await;

        Ok(index_pairs
            .into_iter()
            .zip(distances)
            .map(|((i, j), distance)| MemberDistance {
                from: members[i].name.clone(),
                to: members[j].name.clone(),
                distance,
            })
            .collect())
    }

    /// Distance from each named member to `point`, in query order.
    pub async fn distance_from_lat_lng<S: AsRef<str>>(
        &self,
        queries: &[S],
        point: LatLng,
    ) -> Result<Vec<PointDistance>> {
        let snapshot = self.snapshot();
        let members = queries
            .iter()
            .map(|q| first_match(&snapshot, q.as_ref()))
            .collect::<Result<Vec<&Member>>>()?;

        let coordinates: Vec<(LatLng, LatLng)> =
            members.iter().map(|m| (m.lat_lng, point)).collect();
        let distances = fan_out(self.inner.oracle.as_ref(), &coordinates).await;

        Ok(members
            .iter()
            .zip(distances)
            .map(|(m, distance)| PointDistance {
                name: m.name.clone(),
                distance,
            })
            .collect())
    }
}
