//! Assessment configuration
//!
//! Defaults match the operational settings: a 24 hour window scanned at one
//! minute, refined at one second, top 50 kept. Values can be loaded from a
//! TOML file and overridden from the command line.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::ScanPlan;
use crate::error::ConfigError;

/// Number of ranked results retained, bounded by visualization cost
pub const TOP_K: usize = 50;

/// Physical and margin distances feeding the risk classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParameters {
    /// Tracking uncertainty allowance (km)
    pub margin_of_error_km: f64,
    /// Separation beyond which risk is negligible (km)
    pub threshold_distance_km: f64,
    /// Protected satellite radius (km)
    pub satellite_radius_km: f64,
    /// Debris radius, worst case for a fragment field (km)
    pub debris_radius_km: f64,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            margin_of_error_km: 3.0,
            threshold_distance_km: 10.0,
            satellite_radius_km: 0.12,
            debris_radius_km: 0.10,
        }
    }
}

impl RiskParameters {
    pub fn collision_radius_km(&self) -> f64 {
        self.satellite_radius_km + self.debris_radius_km
    }

    pub fn risk_boundary_km(&self) -> f64 {
        self.margin_of_error_km + self.threshold_distance_km
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("margin_of_error_km", self.margin_of_error_km),
            ("threshold_distance_km", self.threshold_distance_km),
            ("satellite_radius_km", self.satellite_radius_km),
            ("debris_radius_km", self.debris_radius_km),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDistance { name, value });
            }
        }

        if self.risk_boundary_km() <= self.collision_radius_km() {
            return Err(ConfigError::RiskBoundaryTooSmall {
                risk_boundary_km: self.risk_boundary_km(),
                collision_radius_km: self.collision_radius_km(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    /// Scan window length in hours
    pub window_hours: f64,
    /// Coarse pass step over the full catalog (seconds)
    pub coarse_step_seconds: f64,
    /// Fine pass step over the top-k survivors (seconds)
    pub fine_step_seconds: f64,
    /// Scan worker threads, never auto-detected
    pub worker_limit: usize,
    pub risk: RiskParameters,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            window_hours: 24.0,
            coarse_step_seconds: 60.0,
            fine_step_seconds: 1.0,
            worker_limit: 4,
            risk: RiskParameters::default(),
        }
    }
}

impl AssessmentConfig {
    /// Load from a TOML file; missing keys keep their defaults
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        log::info!("Loaded assessment config from {:?}", path);
        Ok(config)
    }

    pub fn window_seconds(&self) -> f64 {
        self.window_hours * 3600.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_limit == 0 {
            return Err(ConfigError::InvalidWorkerLimit);
        }
        for step in [self.coarse_step_seconds, self.fine_step_seconds] {
            if !step.is_finite() || step <= 0.0 {
                return Err(ConfigError::InvalidTimeStep(step));
            }
        }
        let window = self.window_seconds();
        if !window.is_finite() || window <= 0.0 {
            return Err(ConfigError::EmptyWindow(window));
        }
        self.risk.validate()
    }

    /// Coarse scan plan starting at `start`
    pub fn coarse_plan(&self, start: satkit::Instant) -> Result<ScanPlan, ConfigError> {
        ScanPlan::new(start, self.window_seconds(), self.coarse_step_seconds)
    }

    /// Fine scan plan over the same window
    pub fn fine_plan(&self, start: satkit::Instant) -> Result<ScanPlan, ConfigError> {
        ScanPlan::new(start, self.window_seconds(), self.fine_step_seconds)
    }
}
