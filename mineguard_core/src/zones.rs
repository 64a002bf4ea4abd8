//! Zone Calculator - concentric danger rings around a hazard origin.
//!
//! A hazard's danger area grows linearly with time:
//!
//! ```text
//! R = elapsed_seconds × spread_rate(type)
//!
//!   critical  0.33·R   evacuate within 1 min
//!   high      0.67·R   evacuate within 3 min
//!   medium    1.00·R   evacuate within 5 min
//! ```
//!
//! All associations (fractions, colors, evacuation minutes) are static
//! tables; only `R` is computed.

use crate::hazard::{HazardType, Severity};
use serde::{Deserialize, Serialize};

/// Spread rate used for any hazard type without its own entry.
pub const DEFAULT_SPREAD_RATE: f64 = 0.002;

/// Radial growth of a hazard's danger area, in coordinate units per second.
pub fn spread_rate(hazard_type: &HazardType) -> f64 {
    match hazard_type {
        HazardType::GasLeak => 0.002,
        HazardType::Fire => 0.003,
        HazardType::RockFall => 0.001,
        HazardType::PoorVentilation => 0.0015,
        HazardType::EquipmentFailure => 0.0008,
        HazardType::SosEmergency => 0.004,
        HazardType::HighCo2Levels | HazardType::Other(_) => DEFAULT_SPREAD_RATE,
    }
}

/// Negative, NaN and infinite elapsed times are caller bugs; treat them as 0.
pub fn clamp_elapsed(elapsed_seconds: f64) -> f64 {
    if elapsed_seconds.is_finite() && elapsed_seconds > 0.0 {
        elapsed_seconds
    } else {
        0.0
    }
}

/// Danger tier, innermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneLevel {
    Critical,
    High,
    Medium,
}

impl ZoneLevel {
    /// Tiers in classification order.
    pub const ALL: [ZoneLevel; 3] = [ZoneLevel::Critical, ZoneLevel::High, ZoneLevel::Medium];

    pub fn name(&self) -> &'static str {
        match self {
            ZoneLevel::Critical => "critical",
            ZoneLevel::High => "high",
            ZoneLevel::Medium => "medium",
        }
    }

    /// Share of the maximum radius this ring covers.
    pub fn radius_fraction(&self) -> f64 {
        match self {
            ZoneLevel::Critical => 0.33,
            ZoneLevel::High => 0.67,
            ZoneLevel::Medium => 1.0,
        }
    }

    pub fn evacuation_time_minutes(&self) -> u32 {
        match self {
            ZoneLevel::Critical => 1,
            ZoneLevel::High => 3,
            ZoneLevel::Medium => 5,
        }
    }

    /// Display color (hex) for map overlays.
    pub fn color(&self) -> &'static str {
        match self {
            ZoneLevel::Critical => "#ef4444",
            ZoneLevel::High => "#f97316",
            ZoneLevel::Medium => "#eab308",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ZoneLevel::Critical => Severity::Critical,
            ZoneLevel::High => Severity::High,
            ZoneLevel::Medium => Severity::Medium,
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for ZoneLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One danger ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DangerZone {
    pub level: ZoneLevel,
    pub radius: f64,
    pub color: String,
    pub severity: Severity,
    pub evacuation_time_minutes: u32,
}

impl DangerZone {
    fn ring(level: ZoneLevel, max_radius: f64) -> Self {
        Self {
            level,
            radius: max_radius * level.radius_fraction(),
            color: level.color().to_string(),
            severity: level.severity(),
            evacuation_time_minutes: level.evacuation_time_minutes(),
        }
    }

    pub fn contains(&self, distance: f64) -> bool {
        distance <= self.radius
    }
}

/// The three rings of a hazard at one instant, always ordered
/// critical, high, medium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DangerZones([DangerZone; 3]);

impl DangerZones {
    pub fn get(&self, level: ZoneLevel) -> &DangerZone {
        &self.0[level.index()]
    }

    pub fn radius(&self, level: ZoneLevel) -> f64 {
        self.get(level).radius
    }

    /// Radius of the outermost (medium) ring.
    pub fn max_radius(&self) -> f64 {
        self.radius(ZoneLevel::Medium)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DangerZone> {
        self.0.iter()
    }

    /// First ring (innermost first) that reaches `distance`.
    pub fn tier_for(&self, distance: f64) -> Option<ZoneLevel> {
        self.iter().find(|zone| zone.contains(distance)).map(|zone| zone.level)
    }
}

impl<'a> IntoIterator for &'a DangerZones {
    type Item = &'a DangerZone;
    type IntoIter = std::slice::Iter<'a, DangerZone>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Computes the danger rings for a hazard of `hazard_type` after
/// `elapsed_seconds`.
///
/// Never fails: unknown types use [`DEFAULT_SPREAD_RATE`], invalid elapsed
/// times are clamped via [`clamp_elapsed`].
pub fn compute_zones(hazard_type: &HazardType, elapsed_seconds: f64) -> DangerZones {
    let max_radius = clamp_elapsed(elapsed_seconds) * spread_rate(hazard_type);
    DangerZones(ZoneLevel::ALL.map(|level| DangerZone::ring(level, max_radius)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn any_hazard_type() -> impl Strategy<Value = HazardType> {
        prop_oneof![
            proptest::sample::select(HazardType::KNOWN.to_vec()),
            "[A-Za-z ]{1,16}".prop_map(HazardType::from),
        ]
    }

    #[test]
    fn test_fire_after_100_seconds() {
        let zones = compute_zones(&HazardType::Fire, 100.0);

        assert_relative_eq!(zones.radius(ZoneLevel::Critical), 0.099, epsilon = 1e-12);
        assert_relative_eq!(zones.radius(ZoneLevel::High), 0.201, epsilon = 1e-12);
        assert_relative_eq!(zones.radius(ZoneLevel::Medium), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_elapsed_gives_zero_radii() {
        let zones = compute_zones(&HazardType::GasLeak, 0.0);
        assert!(zones.iter().all(|zone| zone.radius == 0.0));
    }

    #[test]
    fn test_fixed_order_and_tables() {
        let zones = compute_zones(&HazardType::RockFall, 10.0);
        let levels: Vec<ZoneLevel> = zones.iter().map(|z| z.level).collect();
        assert_eq!(levels, ZoneLevel::ALL.to_vec());

        let minutes: Vec<u32> = zones.iter().map(|z| z.evacuation_time_minutes).collect();
        assert_eq!(minutes, vec![1, 3, 5]);
        assert_eq!(zones.get(ZoneLevel::Critical).color, "#ef4444");
        assert_eq!(zones.get(ZoneLevel::High).severity, Severity::High);
    }

    #[test]
    fn test_negative_and_nan_elapsed_are_clamped() {
        assert_eq!(compute_zones(&HazardType::Fire, -30.0), compute_zones(&HazardType::Fire, 0.0));
        assert_eq!(compute_zones(&HazardType::Fire, f64::NAN).max_radius(), 0.0);
        assert_eq!(compute_zones(&HazardType::Fire, f64::INFINITY).max_radius(), 0.0);
    }

    #[test]
    fn test_unknown_types_use_gas_leak_rate() {
        let flood = compute_zones(&HazardType::from("Flooding"), 50.0);
        let gas = compute_zones(&HazardType::GasLeak, 50.0);
        assert_eq!(flood, gas);
        assert_eq!(spread_rate(&HazardType::HighCo2Levels), DEFAULT_SPREAD_RATE);
    }

    #[test]
    fn test_tier_for_picks_innermost() {
        let zones = compute_zones(&HazardType::Fire, 100.0);
        assert_eq!(zones.tier_for(0.0), Some(ZoneLevel::Critical));
        assert_eq!(zones.tier_for(0.15), Some(ZoneLevel::High));
        assert_eq!(zones.tier_for(0.25), Some(ZoneLevel::Medium));
        assert_eq!(zones.tier_for(0.31), None);
    }

    #[test]
    fn test_zones_serialize_as_list() {
        let json = serde_json::to_value(compute_zones(&HazardType::Fire, 10.0)).unwrap();
        let list = json.as_array().unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0]["level"], "critical");
        assert_eq!(list[2]["severity"], "medium");
    }

    proptest! {
        #[test]
        fn prop_radii_are_nested(hazard_type in any_hazard_type(), elapsed in 0.0f64..1.0e6) {
            let zones = compute_zones(&hazard_type, elapsed);
            prop_assert!(zones.radius(ZoneLevel::Critical) <= zones.radius(ZoneLevel::High));
            prop_assert!(zones.radius(ZoneLevel::High) <= zones.radius(ZoneLevel::Medium));
        }

        #[test]
        fn prop_doubling_time_doubles_radii(hazard_type in any_hazard_type(), elapsed in 0.0f64..1.0e6) {
            let once = compute_zones(&hazard_type, elapsed);
            let twice = compute_zones(&hazard_type, elapsed * 2.0);
            for level in ZoneLevel::ALL {
                prop_assert_eq!(twice.radius(level), once.radius(level) * 2.0);
            }
        }

        #[test]
        fn prop_compute_zones_is_pure(hazard_type in any_hazard_type(), elapsed in -1.0e3f64..1.0e6) {
            prop_assert_eq!(compute_zones(&hazard_type, elapsed), compute_zones(&hazard_type, elapsed));
        }
    }
}
