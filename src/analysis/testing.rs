//! Analytic position provider for deterministic tests

use std::collections::{HashMap, HashSet};

use nalgebra::Vector3;
use satkit::{Duration, Instant};

use crate::data::{ObjectRole, OrbitalElements};
use crate::error::PropagationError;
use crate::propagation::{OrbitTrack, PositionProvider, PositionSample};

const MU_EARTH_KM3_S2: f64 = 398600.4418;

pub fn epoch() -> Instant {
    Instant::from_datetime(2026, 1, 29, 12, 0, 0.0).unwrap()
}

pub const ISS_LINE1: &str =
    "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
pub const ISS_LINE2: &str =
    "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

/// ISS elements with B* raised to 0.09; SGP4 stops producing valid states
/// within a few days of epoch
pub const HIGH_DRAG_ISS_LINE1: &str =
    "1 25544U 98067A   08264.51782528 -.00002182  00000-0  90000-1 0  2927";

/// Noon UTC `days` after the ISS element epoch day
pub fn after_iss_epoch(days: f64) -> Instant {
    Instant::from_datetime(2008, 9, 20, 12, 0, 0.0).unwrap() + Duration::from_seconds(days * 86_400.0)
}

/// Circular orbit rotated about the x axis by its inclination
#[derive(Debug, Clone, Copy)]
pub struct CircularOrbit {
    pub radius_km: f64,
    pub angular_rate_rad_s: f64,
    pub phase_rad: f64,
    pub inclination_rad: f64,
}

impl CircularOrbit {
    pub fn equatorial(radius_km: f64, phase_rad: f64) -> Self {
        Self {
            radius_km,
            angular_rate_rad_s: (MU_EARTH_KM3_S2 / radius_km.powi(3)).sqrt(),
            phase_rad,
            inclination_rad: 0.0,
        }
    }

    fn position_km(&self, seconds: f64) -> Vector3<f64> {
        let theta = self.phase_rad + self.angular_rate_rad_s * seconds;
        let (x, y) = (self.radius_km * theta.cos(), self.radius_km * theta.sin());
        let (sin_i, cos_i) = self.inclination_rad.sin_cos();
        Vector3::new(x, y * cos_i, y * sin_i)
    }
}

#[derive(Default)]
pub struct CircularOrbitProvider {
    epoch: Option<Instant>,
    orbits: HashMap<String, CircularOrbit>,
    failing: HashSet<String>,
    decay_after_seconds: HashMap<String, f64>,
    panicking: HashSet<String>,
}

impl CircularOrbitProvider {
    pub fn new() -> Self {
        Self {
            epoch: Some(epoch()),
            ..Self::default()
        }
    }

    pub fn with_orbit(mut self, id: &str, orbit: CircularOrbit) -> Self {
        self.orbits.insert(id.to_string(), orbit);
        self
    }

    /// Element set that can never be parsed
    pub fn with_failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    /// Propagation fails from this many seconds after the epoch onward
    pub fn with_decay(mut self, id: &str, seconds: f64) -> Self {
        self.decay_after_seconds.insert(id.to_string(), seconds);
        self
    }

    pub fn with_panicking(mut self, id: &str) -> Self {
        self.panicking.insert(id.to_string());
        self
    }

    pub fn elements(&self, id: &str) -> OrbitalElements {
        let role = if id == "sat" {
            ObjectRole::Satellite
        } else {
            ObjectRole::Debris
        };
        OrbitalElements::new(id, role, "", "")
    }
}

pub struct CircularTrack {
    object_id: String,
    epoch: Instant,
    orbit: CircularOrbit,
    decay_after_seconds: Option<f64>,
    panics: bool,
}

impl PositionProvider for CircularOrbitProvider {
    type Track = CircularTrack;

    fn track(&self, elements: &OrbitalElements) -> Result<CircularTrack, PropagationError> {
        let id = &elements.object_id;
        let malformed = || PropagationError::MalformedElements {
            object_id: id.clone(),
            message: "no such test orbit".to_string(),
        };
        if self.failing.contains(id) {
            return Err(malformed());
        }
        let orbit = *self.orbits.get(id).ok_or_else(malformed)?;

        Ok(CircularTrack {
            object_id: id.clone(),
            epoch: self.epoch.unwrap_or_else(epoch),
            orbit,
            decay_after_seconds: self.decay_after_seconds.get(id).copied(),
            panics: self.panicking.contains(id),
        })
    }
}

impl OrbitTrack for CircularTrack {
    fn position_at(&mut self, time: &Instant) -> Result<PositionSample, PropagationError> {
        if self.panics {
            panic!("test track {} panicked", self.object_id);
        }

        let seconds = (*time - self.epoch).as_seconds();
        if self.decay_after_seconds.is_some_and(|limit| seconds >= limit) {
            return Err(PropagationError::Numerical {
                object_id: self.object_id.clone(),
                epoch: time.to_string(),
                message: "decayed".to_string(),
            });
        }

        Ok(PositionSample {
            position_km: self.orbit.position_km(seconds),
            time: *time,
        })
    }
}
