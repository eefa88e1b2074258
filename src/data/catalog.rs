//! In-memory catalog and the element lookup used by the assessment engine

use super::{ObjectRole, OrbitalElements, SpaceObject, SpaceObjectDatabase};
use crate::error::AssessmentError;

/// Resolves object ids to element sets.
///
/// Implemented by whatever owns the catalog (a file-backed
/// [`ObjectCatalog`] here, a database pool elsewhere).
pub trait ElementLookup {
    /// Element set for an object; `NotFound` if unknown or without a TLE
    fn get_elements(&self, object_id: &str) -> Result<OrbitalElements, AssessmentError>;

    /// Ids of every debris object eligible for assessment
    fn list_debris(&self) -> Vec<String>;
}

/// Filter criteria for selecting objects out of the catalog
#[derive(Debug, Clone)]
pub struct ObjectFilter {
    pub object_types: Vec<String>,
    pub has_tle_only: bool,
    pub exclude_decayed: bool,
    pub exclude_reentering: bool,
}

impl Default for ObjectFilter {
    fn default() -> Self {
        Self {
            object_types: Vec::new(),
            has_tle_only: false,
            exclude_decayed: false,
            exclude_reentering: false,
        }
    }
}

impl ObjectFilter {
    /// Debris with a usable element set that is still in orbit
    pub fn debris_candidates() -> Self {
        Self {
            object_types: vec!["DEBRIS".to_string()],
            has_tle_only: true,
            exclude_decayed: true,
            exclude_reentering: true,
        }
    }

    /// Check if an object matches this filter
    pub fn matches(&self, obj: &SpaceObject) -> bool {
        if !self.object_types.is_empty() {
            let obj_type = obj.object_type.as_deref().unwrap_or("");
            if !self
                .object_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(obj_type))
            {
                return false;
            }
        }

        if self.has_tle_only && !obj.has_valid_tle() {
            return false;
        }

        if self.exclude_decayed && obj.is_decayed() {
            return false;
        }

        if self.exclude_reentering && obj.is_reentry_imminent() {
            return false;
        }

        true
    }
}

/// File-backed catalog owned by the caller for the lifetime of a request
pub struct ObjectCatalog {
    database: SpaceObjectDatabase,
    /// NORAD IDs in ascending order, so listing order is reproducible
    sorted_ids: Vec<u32>,
    debris_filter: ObjectFilter,
}

impl ObjectCatalog {
    pub fn new(database: SpaceObjectDatabase) -> Self {
        let mut sorted_ids: Vec<u32> = database
            .objects
            .keys()
            .filter_map(|key| key.parse::<u32>().ok())
            .collect();
        sorted_ids.sort_unstable();

        log::info!("Catalog ready with {} objects", sorted_ids.len());

        Self {
            database,
            sorted_ids,
            debris_filter: ObjectFilter::debris_candidates(),
        }
    }

    pub fn with_debris_filter(mut self, filter: ObjectFilter) -> Self {
        self.debris_filter = filter;
        self
    }

    pub fn database(&self) -> &SpaceObjectDatabase {
        &self.database
    }

    pub fn len(&self) -> usize {
        self.sorted_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted_ids.is_empty()
    }

    /// Ids of objects matching a filter, in ascending NORAD order
    pub fn collect_ids(&self, filter: &ObjectFilter) -> Vec<String> {
        self.sorted_ids
            .iter()
            .map(|id| id.to_string())
            .filter(|key| {
                self.database
                    .objects
                    .get(key)
                    .is_some_and(|obj| filter.matches(obj))
            })
            .collect()
    }
}

impl ElementLookup for ObjectCatalog {
    fn get_elements(&self, object_id: &str) -> Result<OrbitalElements, AssessmentError> {
        self.database
            .objects
            .get(object_id.trim())
            .and_then(SpaceObject::elements)
            .ok_or_else(|| AssessmentError::NotFound(object_id.to_string()))
    }

    fn list_debris(&self) -> Vec<String> {
        self.collect_ids(&self.debris_filter)
    }
}

/// Role override for an object chosen as the protected satellite
pub fn as_satellite(mut elements: OrbitalElements) -> OrbitalElements {
    elements.role = ObjectRole::Satellite;
    elements
}
