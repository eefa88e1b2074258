//! Scene serialization for the map client
//!
//! The assessment only needs "build a scene from ranked results"; the
//! document format belongs to the client. [`JsonSceneBuilder`] emits a
//! small JSON document with one entry per object and its styling.

use satkit::Instant;
use serde::Serialize;

use crate::analysis::RiskLevel;
use crate::data::{DisplayStyle, ObjectRole, OrbitalElements};
use crate::error::AssessmentError;

/// Simulation time span covered by the scene
#[derive(Debug, Clone, Copy)]
pub struct SceneWindow {
    pub start: Instant,
    pub end: Instant,
}

pub trait SceneBuilder {
    /// Build a scene holding the satellite and the ranked debris with
    /// their severity labels
    fn build_scene(
        &self,
        satellite: &OrbitalElements,
        debris: &[(OrbitalElements, RiskLevel)],
        window: &SceneWindow,
    ) -> Result<String, AssessmentError>;
}

#[derive(Serialize)]
struct SceneDocument<'a> {
    name: &'a str,
    start_utc: String,
    end_utc: String,
    objects: Vec<SceneEntry<'a>>,
}

#[derive(Serialize)]
struct SceneEntry<'a> {
    id: &'a str,
    name: String,
    role: ObjectRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    risk_level: Option<RiskLevel>,
    style: DisplayStyle,
    tle: [&'a str; 2],
}

impl<'a> SceneEntry<'a> {
    fn new(elements: &'a OrbitalElements, risk_level: Option<RiskLevel>) -> Self {
        let style = match risk_level {
            Some(level) => DisplayStyle::for_debris(level),
            None => DisplayStyle::for_role(elements.role),
        };
        Self {
            id: &elements.object_id,
            name: elements.display_name(),
            role: elements.role,
            risk_level,
            style,
            tle: [elements.line1.as_str(), elements.line2.as_str()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsonSceneBuilder {
    name: String,
}

impl Default for JsonSceneBuilder {
    fn default() -> Self {
        Self::new("collision-risk")
    }
}

impl JsonSceneBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SceneBuilder for JsonSceneBuilder {
    fn build_scene(
        &self,
        satellite: &OrbitalElements,
        debris: &[(OrbitalElements, RiskLevel)],
        window: &SceneWindow,
    ) -> Result<String, AssessmentError> {
        let mut objects = Vec::with_capacity(debris.len() + 1);
        objects.push(SceneEntry::new(satellite, None));
        objects.extend(
            debris
                .iter()
                .map(|(elements, level)| SceneEntry::new(elements, Some(*level))),
        );

        let document = SceneDocument {
            name: &self.name,
            start_utc: window.start.to_string(),
            end_utc: window.end.to_string(),
            objects,
        };

        serde_json::to_string_pretty(&document)
            .map_err(|e| AssessmentError::Scene(e.to_string()))
    }
}
