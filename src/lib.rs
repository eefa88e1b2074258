//! orbitrisk - collision risk assessment for a satellite against a debris
//! catalog
//!
//! Every debris object is propagated with SGP4 alongside the satellite over
//! a time window. Objects are ranked by closest approach, and each approach
//! gets a probability and a severity label.

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod propagation;
pub mod scene;

pub use analysis::{
    assemble, AssessmentCoordinator, AssessmentReport, ClosestApproachResult, RiskClassifier,
    RiskLevel, ScanPlan,
};
pub use config::AssessmentConfig;
pub use error::{AssessmentError, ConfigError, PropagationError};
