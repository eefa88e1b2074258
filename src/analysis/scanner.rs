//! Closest-approach search for one satellite/debris pair

use satkit::{Duration, Instant};

use crate::data::OrbitalElements;
use crate::error::{ConfigError, PropagationError};
use crate::propagation::{OrbitTrack, PositionProvider};

/// Time window and sampling step for a scan.
///
/// Only constructible with a positive window and step, so a scan always
/// terminates.
#[derive(Debug, Clone, Copy)]
pub struct ScanPlan {
    start: Instant,
    duration_seconds: f64,
    step_seconds: f64,
}

impl ScanPlan {
    pub fn new(
        start: Instant,
        duration_seconds: f64,
        step_seconds: f64,
    ) -> Result<Self, ConfigError> {
        if !step_seconds.is_finite() || step_seconds <= 0.0 {
            return Err(ConfigError::InvalidTimeStep(step_seconds));
        }
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return Err(ConfigError::EmptyWindow(duration_seconds));
        }
        Ok(Self {
            start,
            duration_seconds,
            step_seconds,
        })
    }

    /// Same window, different step
    pub fn with_step(&self, step_seconds: f64) -> Result<Self, ConfigError> {
        Self::new(self.start, self.duration_seconds, step_seconds)
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn step_seconds(&self) -> f64 {
        self.step_seconds
    }

    /// Number of samples: the start plus every step strictly before the end
    pub fn sample_count(&self) -> u64 {
        (self.duration_seconds / self.step_seconds).ceil() as u64
    }

    /// Offsets from the window start, in seconds.
    ///
    /// Computed as `index * step` rather than by accumulation, so a finer
    /// step whose grid contains a coarser one samples the exact same
    /// instants.
    pub fn offsets(&self) -> impl Iterator<Item = f64> + '_ {
        (0u64..)
            .map(move |index| index as f64 * self.step_seconds)
            .take_while(move |offset| *offset < self.duration_seconds)
    }

    pub fn instants(&self) -> impl Iterator<Item = Instant> + '_ {
        self.offsets()
            .map(move |offset| self.start + Duration::from_seconds(offset))
    }
}

/// Minimum separation found by a scan
#[derive(Debug, Clone)]
pub struct ClosestApproach {
    pub debris_id: String,
    /// None only when no sample was taken
    pub time: Option<Instant>,
    pub distance_km: f64,
    pub samples: u64,
}

/// Step through the window and keep the smallest separation.
///
/// Any propagation failure for either object ends the scan; the caller
/// decides what that means for the batch.
pub fn scan<P: PositionProvider>(
    provider: &P,
    satellite: &OrbitalElements,
    debris: &OrbitalElements,
    plan: &ScanPlan,
) -> Result<ClosestApproach, PropagationError> {
    let mut satellite_track = provider.track(satellite)?;
    let mut debris_track = provider.track(debris)?;

    let mut best_distance = f64::INFINITY;
    let mut best_time = None;
    let mut samples = 0u64;

    for time in plan.instants() {
        let r_satellite = satellite_track.position_at(&time)?;
        let r_debris = debris_track.position_at(&time)?;
        samples += 1;

        let distance = r_satellite.distance_km(&r_debris);
        if distance < best_distance {
            best_distance = distance;
            best_time = Some(time);
        }
    }

    log::trace!(
        "Scanned {} over {} samples: {:.3} km",
        debris.object_id,
        samples,
        best_distance
    );

    Ok(ClosestApproach {
        debris_id: debris.object_id.clone(),
        time: best_time,
        distance_km: best_distance,
        samples,
    })
}
