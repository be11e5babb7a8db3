use super::Loaded;
use crate::error::{DataMappingError, LoadError};
use crate::geo::{Polygon, Ring};
use crate::map::{Level, LevelTable};
use geojson::{Feature, GeoJson, JsonObject, Value};
use std::fs;
use std::path::Path;
use tracing::info;

/// An administrative boundary, classified by level
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    /// Polygons in (lon, lat), exterior ring first
    pub geometry: Vec<Polygon>,
    pub level: Level,
    /// Draw order hint, higher draws later
    pub order_index: i64,
    pub name: String,
}

/// Read and classify a GeoJSON feature collection from disk
pub fn load_boundaries(path: &Path, levels: &LevelTable) -> Result<Loaded<BoundaryFeature>, LoadError> {
    let mut bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = parse_boundaries_from(&mut bytes, levels, path)?;
    info!(
        path = %path.display(),
        features = loaded.records.len(),
        rejected = loaded.rejected.len(),
        "loaded boundaries"
    );
    Ok(loaded)
}

/// Classify an in-memory GeoJSON document. The buffer is parsed in place.
pub fn parse_boundaries(bytes: &mut [u8], levels: &LevelTable) -> Result<Loaded<BoundaryFeature>, LoadError> {
    parse_boundaries_from(bytes, levels, Path::new("<memory>"))
}

fn parse_boundaries_from(
    bytes: &mut [u8],
    levels: &LevelTable,
    source: &Path,
) -> Result<Loaded<BoundaryFeature>, LoadError> {
    let value: serde_json::Value = simd_json::serde::from_slice(bytes)?;
    let features = match GeoJson::from_json_value(value)? {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => return Err(LoadError::NotACollection),
    };

    let mut loaded = Loaded::default();
    for (index, feature) in features.into_iter().enumerate() {
        match classify(index, feature, levels) {
            Ok(boundary) => loaded.records.push(boundary),
            Err(e) => loaded.reject(source, e),
        }
    }
    Ok(loaded)
}

fn classify(index: usize, feature: Feature, levels: &LevelTable) -> Result<BoundaryFeature, DataMappingError> {
    let props = feature.properties.as_ref();

    let code = integer_property(props, "level");
    let level = code
        .and_then(|c| levels.get(c))
        .ok_or(DataMappingError::UnknownLevel { index, code })?;

    let order_index = integer_property(props, "orderIndex").unwrap_or(0);

    let name = props
        .and_then(|p| p.get("name"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let geometry = feature
        .geometry
        .ok_or(DataMappingError::MissingGeometry { index })?;
    let geometry = match geometry.value {
        Value::Polygon(rings) => vec![convert_polygon(&rings)],
        Value::MultiPolygon(polygons) => polygons.iter().map(|rings| convert_polygon(rings)).collect(),
        other => {
            return Err(DataMappingError::UnsupportedGeometry {
                index,
                kind: geometry_kind(&other),
            })
        }
    };

    Ok(BoundaryFeature {
        geometry,
        level,
        order_index,
        name,
    })
}

/// Integer property that may be encoded as a number or a numeric string
fn integer_property(props: Option<&JsonObject>, key: &str) -> Option<i64> {
    let value = props?.get(key)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn convert_polygon(rings: &[Vec<Vec<f64>>]) -> Polygon {
    rings
        .iter()
        .map(|ring| -> Ring {
            ring.iter()
                .filter(|c| c.len() >= 2)
                .map(|c| (c[0], c[1]))
                .collect()
        })
        .collect()
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}
