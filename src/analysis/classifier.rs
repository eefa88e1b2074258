//! Risk classification of closest-approach distances
//!
//! The probability is a linear proxy: 1.0 at hard contact, falling to 0.0
//! at the edge of the risk zone. It is not a calibrated conjunction
//! probability, and the severity thresholds are kept as operational
//! constants.

use serde::{Deserialize, Serialize};

use crate::config::RiskParameters;
use crate::error::ConfigError;

/// Discrete severity label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
    Undefined,
}

impl RiskLevel {
    /// Bucket a probability. Checked in order, first match wins.
    pub fn from_probability(probability: f64) -> Self {
        if (0.8..=1.0).contains(&probability) {
            Self::Critical
        } else if (0.6..0.8).contains(&probability) {
            Self::High
        } else if (0.3..0.6).contains(&probability) {
            Self::Medium
        } else if (0.0..0.3).contains(&probability) {
            Self::Low
        } else {
            Self::Undefined
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Undefined => "Undefined",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a miss distance to a probability and severity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskClassifier {
    collision_radius_km: f64,
    risk_factor_km: f64,
}

impl RiskClassifier {
    pub fn new(params: &RiskParameters) -> Result<Self, ConfigError> {
        params.validate()?;
        let collision_radius_km = params.collision_radius_km();
        Ok(Self {
            collision_radius_km,
            risk_factor_km: params.risk_boundary_km() - collision_radius_km,
        })
    }

    /// Sum of both objects' radii
    pub fn collision_radius_km(&self) -> f64 {
        self.collision_radius_km
    }

    /// Width of the risk zone beyond the collision radius
    pub fn risk_factor_km(&self) -> f64 {
        self.risk_factor_km
    }

    pub fn probability(&self, distance_km: f64) -> f64 {
        // f64::max would swallow NaN into 0 and report a certain collision
        if distance_km.is_nan() {
            return f64::NAN;
        }

        if distance_km >= self.collision_radius_km + self.risk_factor_km {
            return 0.0;
        }

        let adjusted = (distance_km - self.collision_radius_km).max(0.0);
        if adjusted <= self.risk_factor_km {
            (self.risk_factor_km - adjusted) / self.risk_factor_km
        } else {
            0.0
        }
    }

    pub fn severity(&self, probability: f64) -> RiskLevel {
        RiskLevel::from_probability(probability)
    }

    /// Probability and severity together
    pub fn classify(&self, distance_km: f64) -> (f64, RiskLevel) {
        let probability = self.probability(distance_km);
        (probability, self.severity(probability))
    }
}

impl Default for RiskClassifier {
    fn default() -> Self {
        let params = RiskParameters::default();
        let collision_radius_km = params.collision_radius_km();
        Self {
            collision_radius_km,
            risk_factor_km: params.risk_boundary_km() - collision_radius_km,
        }
    }
}
