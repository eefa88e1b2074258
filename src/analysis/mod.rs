//! Collision risk assessment
//!
//! ## Pipeline
//!
//! - [`scan`] steps one satellite/debris pair through a time window and keeps
//!   the minimum separation
//! - [`RiskClassifier`] turns that distance into a probability and severity
//! - [`AssessmentCoordinator`] runs one scan per debris object on a bounded
//!   worker pool and ranks the survivors
//! - [`assemble`] pairs the ranking with display metadata and a scene
//!
//! # Example
//!
//! ```ignore
//! use orbitrisk::analysis::*;
//!
//! let coordinator = AssessmentCoordinator::new(Sgp4Provider::new(), &config)?;
//! let plan = config.coarse_plan(start)?;
//! let report = coordinator.assess_catalog(&catalog, "25544", &plan, Some(1.0))?;
//! ```

mod assembler;
mod classifier;
mod coordinator;
mod report;
mod scanner;

#[cfg(test)]
pub(crate) mod testing;

pub use assembler::{assemble, AssembledAssessment, RankedDebris};
pub use classifier::{RiskClassifier, RiskLevel};
pub use coordinator::AssessmentCoordinator;
pub use report::{rank, AssessmentReport, ClosestApproachResult, ScanFailure};
pub use scanner::{scan, ClosestApproach, ScanPlan};
