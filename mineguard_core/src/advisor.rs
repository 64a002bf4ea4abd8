//! Action/Route Advisor - static evacuation policy.
//!
//! Nothing here depends on hazard physics: the action text depends only on
//! the tier and the hazard's name, and the route only on the sector.

use crate::hazard::{HazardType, Sector};
use crate::zones::ZoneLevel;
use serde::{Deserialize, Serialize};

/// Action for a worker outside every danger ring.
pub const MONITOR_ACTION: &str = "Monitor situation";

/// Minutes quoted for every evacuation route.
pub const ROUTE_ESTIMATED_MINUTES: u32 = 2;

/// Instruction for a worker in `tier` (`None` = unaffected).
pub fn recommended_action(tier: Option<ZoneLevel>, hazard_type: &HazardType) -> String {
    match tier {
        Some(ZoneLevel::Critical) => format!(
            "IMMEDIATE EVACUATION - {hazard_type} detected in critical zone. Leave now!"
        ),
        Some(ZoneLevel::High) => format!("EVACUATE AREA - {hazard_type} spreading. Move to safe zone."),
        Some(ZoneLevel::Medium) => {
            format!("ALERT - {hazard_type} detected nearby. Prepare for evacuation.")
        }
        None => MONITOR_ACTION.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoutePriority {
    #[default]
    #[serde(rename = "CRITICAL")]
    Critical,
}

/// Where to go when a hazard breaks out in a sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvacuationRoute {
    pub direction: String,
    pub priority: RoutePriority,
    pub estimated_time_minutes: u32,
}

/// Fixed route for each known sector, a generic instruction otherwise.
pub fn evacuation_route(sector: &Sector) -> EvacuationRoute {
    let direction = match sector {
        Sector::A => "Move to Sector C via Tunnel 2",
        Sector::B => "Move to Sector A via Tunnel 1",
        Sector::C => "Exit mine immediately via Main Entrance",
        Sector::Other(_) => "Exit to safe zone away from hazard",
    };

    EvacuationRoute {
        direction: direction.to_string(),
        priority: RoutePriority::Critical,
        estimated_time_minutes: ROUTE_ESTIMATED_MINUTES,
    }
}
