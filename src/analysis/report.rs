//! Per-debris results and the ranked assessment report

use satkit::{Duration, Instant};
use serde::{Serialize, Serializer};

use super::classifier::{RiskClassifier, RiskLevel};
use super::scanner::ClosestApproach;
use crate::config::TOP_K;

/// Closest approach of one debris object, classified
#[derive(Debug, Clone, Serialize)]
pub struct ClosestApproachResult {
    pub debris_id: String,
    #[serde(serialize_with = "serialize_optional_instant")]
    pub closest_approach_time: Option<Instant>,
    pub closest_approach_distance: f64,
    pub probability: f64,
    pub risk_level: RiskLevel,
}

impl ClosestApproachResult {
    pub fn classify(approach: ClosestApproach, classifier: &RiskClassifier) -> Self {
        let (probability, risk_level) = classifier.classify(approach.distance_km);
        Self {
            debris_id: approach.debris_id,
            closest_approach_time: approach.time,
            closest_approach_distance: approach.distance_km,
            probability,
            risk_level,
        }
    }
}

/// A debris object left out of the ranking because its scan failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanFailure {
    pub debris_id: String,
    pub reason: String,
}

/// Ranked outcome of one assessment.
///
/// `results` is sorted ascending by distance (ties keep input order) and
/// holds at most [`TOP_K`] entries.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    pub satellite_id: String,
    #[serde(serialize_with = "serialize_instant")]
    pub window_start: Instant,
    pub window_seconds: f64,
    pub step_seconds: f64,
    /// Debris objects dispatched, failed ones included
    pub debris_scanned: usize,
    pub results: Vec<ClosestApproachResult>,
    pub failures: Vec<ScanFailure>,
}

impl AssessmentReport {
    pub fn window_end(&self) -> Instant {
        self.window_start + Duration::from_seconds(self.window_seconds)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Count of ranked results per severity, most severe first
    pub fn severity_counts(&self) -> Vec<(RiskLevel, usize)> {
        [
            RiskLevel::Critical,
            RiskLevel::High,
            RiskLevel::Medium,
            RiskLevel::Low,
            RiskLevel::Undefined,
        ]
        .into_iter()
        .map(|level| {
            let count = self
                .results
                .iter()
                .filter(|r| r.risk_level == level)
                .count();
            (level, count)
        })
        .collect()
    }
}

/// Sort ascending by distance and keep the first [`TOP_K`].
///
/// The sort is stable, so equal distances keep their incoming order.
pub fn rank(results: &mut Vec<ClosestApproachResult>) {
    results.sort_by(|a, b| {
        a.closest_approach_distance
            .total_cmp(&b.closest_approach_distance)
    });
    results.truncate(TOP_K);
}

pub(crate) fn serialize_instant<S: Serializer>(
    time: &Instant,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_string())
}

pub(crate) fn serialize_optional_instant<S: Serializer>(
    time: &Option<Instant>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match time {
        Some(time) => serializer.serialize_some(&time.to_string()),
        None => serializer.serialize_none(),
    }
}
