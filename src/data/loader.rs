//! Catalog loading from JSON files

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use serde::{Deserialize, Deserializer};

use super::{SpaceObject, SpaceObjectDatabase, TleData};

/// Open a file, transparently decompressing `.gz`
fn open_reader(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("Failed to open catalog: {:?}", path))?;
    let reader = BufReader::new(file);

    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

/// Load the space objects database (`space_objects.json` layout)
pub fn load_space_objects(path: impl AsRef<Path>) -> Result<SpaceObjectDatabase> {
    let path = path.as_ref();
    log::info!("Loading space objects from {:?}", path);

    let reader = open_reader(path)?;
    let db: SpaceObjectDatabase =
        serde_json::from_reader(reader).with_context(|| "Failed to parse space objects JSON")?;

    log::info!(
        "Loaded {} space objects (generated at {})",
        db.objects.len(),
        db.generated_at
    );

    Ok(db)
}

/// One record of a Space-Track GP query
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct GpRecord {
    #[serde(deserialize_with = "de_norad_id")]
    norad_cat_id: u32,
    #[serde(default)]
    object_name: Option<String>,
    #[serde(default)]
    object_id: Option<String>,
    #[serde(default)]
    object_type: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    decay_date: Option<String>,
    #[serde(default)]
    epoch: Option<String>,
    #[serde(default)]
    tle_line1: Option<String>,
    #[serde(default)]
    tle_line2: Option<String>,
}

/// Space-Track serves numeric fields as strings
fn de_norad_id<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NoradId {
        Number(u32),
        Text(String),
    }

    match NoradId::deserialize(deserializer)? {
        NoradId::Number(n) => Ok(n),
        NoradId::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl From<GpRecord> for SpaceObject {
    fn from(record: GpRecord) -> Self {
        let tle = match (record.tle_line1, record.tle_line2) {
            (Some(line1), Some(line2)) => Some(TleData {
                epoch: record.epoch.unwrap_or_default(),
                line1,
                line2,
            }),
            _ => None,
        };

        Self {
            norad_cat_id: record.norad_cat_id,
            cospar_id: record.object_id,
            name: record.object_name,
            object_type: record.object_type,
            country: record.country_code,
            decay_date: record.decay_date.filter(|d| !d.trim().is_empty()),
            tle,
        }
    }
}

/// Load a Space-Track GP JSON array into a database
pub fn load_gp_records(path: impl AsRef<Path>) -> Result<SpaceObjectDatabase> {
    let path = path.as_ref();
    log::info!("Loading GP records from {:?}", path);

    let reader = open_reader(path)?;
    let records: Vec<GpRecord> =
        serde_json::from_reader(reader).with_context(|| "Failed to parse GP JSON")?;

    let mut objects = HashMap::with_capacity(records.len());
    for record in records {
        let object = SpaceObject::from(record);
        // Later records carry newer element sets
        objects.insert(object.norad_cat_id.to_string(), object);
    }

    log::info!("Loaded {} objects from GP records", objects.len());

    Ok(SpaceObjectDatabase {
        generated_at: chrono::Utc::now().to_rfc3339(),
        objects,
    })
}

/// Statistics about the loaded database
#[derive(Debug, Default)]
pub struct DatabaseStats {
    pub total_objects: usize,
    pub objects_with_tle: usize,
    pub decayed_objects: usize,
    pub payloads: usize,
    pub rocket_bodies: usize,
    pub debris: usize,
}

impl DatabaseStats {
    pub fn from_database(db: &SpaceObjectDatabase) -> Self {
        let mut stats = Self {
            total_objects: db.objects.len(),
            ..Self::default()
        };

        for obj in db.objects.values() {
            if obj.has_valid_tle() {
                stats.objects_with_tle += 1;
            }
            if obj.is_decayed() {
                stats.decayed_objects += 1;
            }

            match obj.object_type.as_deref() {
                Some("PAYLOAD") => stats.payloads += 1,
                Some("ROCKET BODY") => stats.rocket_bodies += 1,
                Some("DEBRIS") => stats.debris += 1,
                _ => {}
            }
        }

        stats
    }
}
