use std::path::PathBuf;
use thiserror::Error;

/// A dataset could not be read at all. The layer it feeds stays absent.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON")]
    Json(#[from] simd_json::Error),
    #[error("malformed GeoJSON")]
    GeoJson(#[from] geojson::Error),
    #[error("expected a feature collection, found a bare geometry")]
    NotACollection,
    #[error("malformed table")]
    Table(#[from] csv::Error),
}

/// A single record could not be mapped onto the scene. Isolated per record:
/// the rest of the batch still loads.
#[derive(Debug, Error)]
pub enum DataMappingError {
    #[error("feature {index}: unknown level code {code:?}")]
    UnknownLevel { index: usize, code: Option<i64> },
    #[error("feature {index}: no geometry")]
    MissingGeometry { index: usize },
    #[error("feature {index}: unsupported geometry type {kind}")]
    UnsupportedGeometry { index: usize, kind: &'static str },
    #[error("row {row}: missing field `{field}`")]
    MissingField { row: usize, field: &'static str },
    #[error("row {row}: malformed value")]
    MalformedRow {
        row: usize,
        #[source]
        source: csv::Error,
    },
    #[error("city {name:?}: unknown color group {group:?}")]
    UnknownColorGroup { name: String, group: Option<String> },
}

/// Rendering cannot proceed the normal way for some input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderPrecondition {
    #[error("no finite radius basis values to build a scale from")]
    EmptyDomain,
    #[error("city {name:?}: radius basis {value} is not finite")]
    NonFiniteRadius { name: String, value: f64 },
}
