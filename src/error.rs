//! Error types shared by the assessment engine

use thiserror::Error;

/// Failure to propagate one object's element set.
///
/// Scoped to a single scan task: the coordinator records it against the
/// debris object and carries on with the rest of the batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropagationError {
    /// The two-line element set could not be parsed
    #[error("malformed element set for {object_id}: {message}")]
    MalformedElements { object_id: String, message: String },

    /// SGP4 reported a failure (decayed orbit, eccentricity out of range, ...)
    #[error("propagation of {object_id} failed at {epoch}: {message}")]
    Numerical {
        object_id: String,
        epoch: String,
        message: String,
    },
}

impl PropagationError {
    /// Identifier of the object that failed to propagate
    pub fn object_id(&self) -> &str {
        match self {
            Self::MalformedElements { object_id, .. } | Self::Numerical { object_id, .. } => {
                object_id
            }
        }
    }
}

/// Invalid assessment parameters, rejected before any task is dispatched
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("worker limit must be at least 1")]
    InvalidWorkerLimit,

    #[error("time step must be a positive number of seconds, got {0}")]
    InvalidTimeStep(f64),

    #[error("scan window must have a positive duration, got {0} s")]
    EmptyWindow(f64),

    #[error("{name} must be a finite, non-negative distance, got {value} km")]
    InvalidDistance { name: &'static str, value: f64 },

    #[error("risk boundary {risk_boundary_km} km must exceed collision radius {collision_radius_km} km")]
    RiskBoundaryTooSmall {
        risk_boundary_km: f64,
        collision_radius_km: f64,
    },

    #[error("could not build worker pool: {0}")]
    WorkerPool(String),
}

/// Errors surfaced to the caller of an assessment
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// Unknown object id, or an object with no element set to propagate
    #[error("object {0} not found in catalog")]
    NotFound(String),

    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// The satellite itself could not be propagated
    #[error("satellite could not be propagated: {0}")]
    Propagation(#[from] PropagationError),

    #[error("scene serialization failed: {0}")]
    Scene(String),
}
