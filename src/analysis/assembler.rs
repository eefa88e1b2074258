//! Caller-facing assembly of a ranked report and its scene
//!
//! No risk computation happens here. Entries keep the report's ranking
//! order end to end, including the order handed to the scene builder.

use satkit::Instant;
use serde::Serialize;

use super::classifier::RiskLevel;
use super::report::{serialize_instant, AssessmentReport, ClosestApproachResult, ScanFailure};
use crate::data::{DisplayStyle, ElementLookup, OrbitalElements};
use crate::error::AssessmentError;
use crate::scene::{SceneBuilder, SceneWindow};

/// One ranked debris object with its display metadata
#[derive(Debug, Clone, Serialize)]
pub struct RankedDebris {
    /// 1-based position in the ranking
    pub rank: usize,
    pub name: String,
    #[serde(flatten)]
    pub result: ClosestApproachResult,
    pub style: DisplayStyle,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssembledAssessment {
    pub generated_at: String,
    pub satellite_id: String,
    pub satellite_name: String,
    #[serde(serialize_with = "serialize_instant")]
    pub window_start: Instant,
    #[serde(serialize_with = "serialize_instant")]
    pub window_end: Instant,
    pub step_seconds: f64,
    pub debris_scanned: usize,
    pub ranked: Vec<RankedDebris>,
    pub failures: Vec<ScanFailure>,
    /// Serialized scene document, written separately
    #[serde(skip)]
    pub scene: String,
}

/// Merge a report with display metadata and build its scene
pub fn assemble<L, S>(
    report: AssessmentReport,
    satellite: &OrbitalElements,
    lookup: &L,
    scene_builder: &S,
) -> Result<AssembledAssessment, AssessmentError>
where
    L: ElementLookup + ?Sized,
    S: SceneBuilder + ?Sized,
{
    let window_end = report.window_end();

    let mut ranked = Vec::with_capacity(report.results.len());
    let mut scene_debris: Vec<(OrbitalElements, RiskLevel)> =
        Vec::with_capacity(report.results.len());

    for (index, result) in report.results.into_iter().enumerate() {
        let elements = lookup.get_elements(&result.debris_id)?;
        let risk_level = result.risk_level;
        ranked.push(RankedDebris {
            rank: index + 1,
            name: elements.display_name(),
            style: DisplayStyle::for_debris(risk_level),
            result,
        });
        scene_debris.push((elements, risk_level));
    }

    let window = SceneWindow {
        start: report.window_start,
        end: window_end,
    };
    let scene = scene_builder.build_scene(satellite, &scene_debris, &window)?;

    Ok(AssembledAssessment {
        generated_at: chrono::Utc::now().to_rfc3339(),
        satellite_id: report.satellite_id,
        satellite_name: satellite.display_name(),
        window_start: report.window_start,
        window_end,
        step_seconds: report.step_seconds,
        debris_scanned: report.debris_scanned,
        ranked,
        failures: report.failures,
        scene,
    })
}
