//! Space object records and the element sets handed to the propagator

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::analysis::RiskLevel;

const EARTH_RADIUS_KM: f64 = 6371.0;
const MU_EARTH_KM3_S2: f64 = 398600.4418;
// Perigee below this altitude is treated as terminal reentry.
const REENTRY_PERIGEE_KM: f64 = 80.0;
const SECONDS_PER_DAY: f64 = 86_400.0;
const TLE_LINE_LEN: usize = 69;

/// Root structure of the space_objects.json file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpaceObjectDatabase {
    #[serde(default)]
    pub generated_at: String,
    pub objects: HashMap<String, SpaceObject>,
}

/// A single catalogued object (payload, debris, rocket body, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceObject {
    pub norad_cat_id: u32,
    #[serde(default)]
    pub cospar_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub decay_date: Option<String>,
    #[serde(default)]
    pub tle: Option<TleData>,
}

/// Two-Line Element set data for orbit propagation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TleData {
    #[serde(default)]
    pub epoch: String,
    pub line1: String,
    pub line2: String,
}

/// Whether an object is the protected asset or a piece of the debris field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectRole {
    Satellite,
    Debris,
}

impl ObjectRole {
    /// Role implied by a catalog object type string
    pub fn from_object_type(object_type: Option<&str>) -> Self {
        match object_type {
            Some(t) if t.eq_ignore_ascii_case("DEBRIS") => Self::Debris,
            _ => Self::Satellite,
        }
    }
}

/// Orbital elements of one object, as consumed by the position provider.
///
/// The TLE lines are opaque here; only the propagator interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub object_id: String,
    pub name: Option<String>,
    pub role: ObjectRole,
    pub line1: String,
    pub line2: String,
}

impl OrbitalElements {
    pub fn new(
        object_id: impl Into<String>,
        role: ObjectRole,
        line1: impl Into<String>,
        line2: impl Into<String>,
    ) -> Self {
        Self {
            object_id: object_id.into(),
            name: None,
            role,
            line1: line1.into(),
            line2: line2.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display name (falls back to the object id)
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("NORAD {}", self.object_id))
    }
}

/// Rendering hints passed to the scene builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayStyle {
    pub color: [u8; 3],
    pub marker_scale: u32,
    pub show_path: bool,
    pub show_label: bool,
}

const DEFAULT_COLOR: [u8; 3] = [250, 250, 255];
const DEFAULT_MARKER_SCALE: u32 = 20;

impl DisplayStyle {
    /// Defaults by role: only the satellite draws its path
    pub fn for_role(role: ObjectRole) -> Self {
        Self {
            color: DEFAULT_COLOR,
            marker_scale: DEFAULT_MARKER_SCALE,
            show_path: role == ObjectRole::Satellite,
            show_label: false,
        }
    }

    /// Debris styling tagged by severity
    pub fn for_debris(risk: RiskLevel) -> Self {
        let base = Self::for_role(ObjectRole::Debris);
        let (color, marker_scale) = match risk {
            RiskLevel::Critical => ([108, 52, 131], 16),
            RiskLevel::High => ([169, 50, 38], 12),
            RiskLevel::Medium => ([19, 141, 117], 8),
            RiskLevel::Low => ([19, 141, 117], 6),
            RiskLevel::Undefined => (DEFAULT_COLOR, DEFAULT_MARKER_SCALE),
        };
        Self {
            color,
            marker_scale,
            ..base
        }
    }
}

impl SpaceObject {
    /// Get display name (falls back to NORAD ID if no name)
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("NORAD {}", self.norad_cat_id))
    }

    pub fn role(&self) -> ObjectRole {
        ObjectRole::from_object_type(self.object_type.as_deref())
    }

    /// Check if this object has a TLE for propagation
    pub fn has_valid_tle(&self) -> bool {
        self.tle.is_some()
    }

    /// Check if this object has decayed
    pub fn is_decayed(&self) -> bool {
        self.decay_date.is_some()
    }

    /// Estimate perigee/apogee from TLE (km above Earth's surface)
    pub fn perigee_apogee_km(&self) -> Option<(f64, f64)> {
        let tle = self.tle.as_ref()?;
        if !tle_lines_well_formed(&tle.line1, &tle.line2) {
            return None;
        }
        let satkit_tle = satkit::TLE::load_2line(&tle.line1, &tle.line2).ok()?;
        tle_perigee_apogee_km(satkit_tle.mean_motion, satkit_tle.eccen)
    }

    /// Check if the object is likely in a terminal reentry trajectory.
    pub fn is_reentry_imminent(&self) -> bool {
        self.decay_date.is_none()
            && self
                .perigee_apogee_km()
                .is_some_and(|(perigee_km, _)| perigee_km < REENTRY_PERIGEE_KM)
    }

    /// Element set for the propagator, if the object carries a TLE
    pub fn elements(&self) -> Option<OrbitalElements> {
        let tle = self.tle.as_ref()?;
        Some(OrbitalElements {
            object_id: self.norad_cat_id.to_string(),
            name: self.name.clone(),
            role: self.role(),
            line1: tle.line1.clone(),
            line2: tle.line2.clone(),
        })
    }
}

/// Column layout check done before handing lines to the TLE parser, which
/// slices fixed columns.
pub fn tle_lines_well_formed(line1: &str, line2: &str) -> bool {
    let line1 = line1.trim_end();
    let line2 = line2.trim_end();
    line1.is_ascii()
        && line2.is_ascii()
        && line1.len() >= TLE_LINE_LEN
        && line2.len() >= TLE_LINE_LEN
        && line1.starts_with("1 ")
        && line2.starts_with("2 ")
}

/// Perigee/apogee altitude from mean motion (rev/day) and eccentricity
fn tle_perigee_apogee_km(mean_motion: f64, eccen: f64) -> Option<(f64, f64)> {
    if !mean_motion.is_finite() || !eccen.is_finite() {
        return None;
    }
    if mean_motion <= 0.0 || !(0.0..1.0).contains(&eccen) {
        return None;
    }

    let n_rad_s = mean_motion * (2.0 * std::f64::consts::PI) / SECONDS_PER_DAY;
    let a_km = (MU_EARTH_KM3_S2 / (n_rad_s * n_rad_s)).cbrt();
    if !a_km.is_finite() {
        return None;
    }

    let perigee_km = a_km * (1.0 - eccen) - EARTH_RADIUS_KM;
    let apogee_km = a_km * (1.0 + eccen) - EARTH_RADIUS_KM;
    Some((perigee_km, apogee_km))
}
