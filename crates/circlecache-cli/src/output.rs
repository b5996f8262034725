//! Plain-text and JSON rendering of query results.

use anyhow::Result;
use serde::Serialize;

use circlecache_core::utils::{format_phone, truncate_string};
use circlecache_core::{CircleSummary, Member, MemberDistance, Movement, PointDistance};

/// Widest address shown in member listings
const MAX_ADDRESS_WIDTH: usize = 40;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_circles(circles: &[CircleSummary]) {
    for circle in circles {
        println!("{} ({} members) [{}]", circle.name, circle.member_count, circle.id);
    }
}

pub fn member_line(member: &Member) -> String {
    let mut flags = Vec::new();
    if member.driving {
        flags.push(format!("driving {:.0}", member.speed));
    }
    if member.disconnected {
        flags.push("disconnected".to_string());
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };

    format!(
        "{:<24} {:<15} {:<width$} battery {:<15} wifi {:<7} since {}{}",
        member.name,
        format_phone(&member.phone),
        truncate_string(&member.address, MAX_ADDRESS_WIDTH),
        member.battery_display(),
        member.wifi.to_string(),
        member.since,
        flags,
        width = MAX_ADDRESS_WIDTH,
    )
}

pub fn print_members(members: &[Member]) {
    if members.is_empty() {
        println!("No matching members");
    }
    for member in members {
        println!("{}", member_line(member));
    }
}

pub fn print_member_distances(distances: &[MemberDistance]) {
    for d in distances {
        println!("{} <-> {}: {}", d.from, d.to, d.distance);
    }
}

pub fn print_point_distances(distances: &[PointDistance]) {
    for d in distances {
        println!("{}: {}", d.name, d.distance);
    }
}

pub fn print_movements(movements: &[Movement]) {
    for m in movements.iter().filter(|m| m.moved) {
        println!("{} has a new location update", m.name);
    }
}
