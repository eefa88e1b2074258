//! SGP4 position provider using satkit

use chrono::{DateTime, Datelike, Timelike, Utc};
use nalgebra::Vector3;
use satkit::sgp4::{sgp4, SGP4Error};
use satkit::Instant;

use crate::data::{tle_lines_well_formed, OrbitalElements};
use crate::error::PropagationError;

/// Position of one object at one instant
#[derive(Debug, Clone, Copy)]
pub struct PositionSample {
    /// Position in the TEME frame, kilometers
    pub position_km: Vector3<f64>,
    pub time: Instant,
}

impl PositionSample {
    pub fn distance_km(&self, other: &PositionSample) -> f64 {
        (self.position_km - other.position_km).norm()
    }
}

/// A single object's element set, ready to be sampled repeatedly
pub trait OrbitTrack {
    fn position_at(&mut self, time: &Instant) -> Result<PositionSample, PropagationError>;
}

/// Source of object positions.
///
/// Implementations must be deterministic for a given (elements, time) pair
/// and hold no mutable state, so one provider can serve every scan task.
pub trait PositionProvider: Send + Sync {
    type Track: OrbitTrack;

    /// Parse the element set once for a scan
    fn track(&self, elements: &OrbitalElements) -> Result<Self::Track, PropagationError>;

    fn position_at(
        &self,
        elements: &OrbitalElements,
        time: &Instant,
    ) -> Result<PositionSample, PropagationError> {
        self.track(elements)?.position_at(time)
    }
}

/// Stateless SGP4 provider
#[derive(Debug, Clone, Copy, Default)]
pub struct Sgp4Provider;

impl Sgp4Provider {
    pub fn new() -> Self {
        Self
    }
}

/// Parsed TLE for one object
pub struct Sgp4Track {
    object_id: String,
    tle: satkit::TLE,
}

impl PositionProvider for Sgp4Provider {
    type Track = Sgp4Track;

    fn track(&self, elements: &OrbitalElements) -> Result<Sgp4Track, PropagationError> {
        Ok(Sgp4Track {
            object_id: elements.object_id.clone(),
            tle: parse_tle(elements)?,
        })
    }
}

impl OrbitTrack for Sgp4Track {
    fn position_at(&mut self, time: &Instant) -> Result<PositionSample, PropagationError> {
        let failure = |message: &str| PropagationError::Numerical {
            object_id: self.object_id.clone(),
            epoch: time.to_string(),
            message: message.to_string(),
        };

        let result = match sgp4(&mut self.tle, &[*time]) {
            Ok(result) => result,
            Err(e) => return Err(failure(&e.to_string())),
        };

        // Failed samples come back as Ok with a zeroed column
        match result.errcode.first() {
            Some(SGP4Error::SGP4Success) => {}
            Some(code) => return Err(failure(&format!("SGP4 error {:?}: {}", code, code))),
            None => return Err(failure("SGP4 returned no sample")),
        }

        // pos is in TEME, meters
        let pos = result.pos.column(0);
        let position_km = Vector3::new(pos[0], pos[1], pos[2]) / 1000.0;
        if !position_km.iter().all(|c| c.is_finite()) {
            return Err(failure("non-finite position"));
        }

        Ok(PositionSample {
            position_km,
            time: *time,
        })
    }
}

/// Parse an element set into a satkit TLE
fn parse_tle(elements: &OrbitalElements) -> Result<satkit::TLE, PropagationError> {
    let malformed = |message: String| PropagationError::MalformedElements {
        object_id: elements.object_id.clone(),
        message,
    };

    if !tle_lines_well_formed(&elements.line1, &elements.line2) {
        return Err(malformed("lines do not follow the two-line layout".to_string()));
    }

    match satkit::TLE::load_2line(&elements.line1, &elements.line2) {
        Ok(tle) => Ok(tle),
        Err(e) => {
            log::trace!("Failed to parse TLE for {}: {}", elements.object_id, e);
            Err(malformed(e.to_string()))
        }
    }
}

/// Convert a UTC timestamp into a satkit instant
pub fn instant_from_utc(time: &DateTime<Utc>) -> Option<Instant> {
    let seconds = time.second() as f64 + time.nanosecond() as f64 * 1e-9;
    Instant::from_datetime(
        time.year(),
        time.month() as i32,
        time.day() as i32,
        time.hour() as i32,
        time.minute() as i32,
        seconds,
    )
    .ok()
}

/// Current UTC time as a satkit instant
pub fn now() -> Option<Instant> {
    instant_from_utc(&Utc::now())
}
