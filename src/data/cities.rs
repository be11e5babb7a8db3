use super::Loaded;
use crate::error::{DataMappingError, LoadError};
use serde::Deserialize;
use std::f64::consts::PI;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// A named city with its population in thousands
#[derive(Debug, Clone, PartialEq)]
pub struct CityPoint {
    pub name: String,
    pub population: f64,
    pub color_group: Option<String>,
    pub lon: f64,
    pub lat: f64,
    /// sqrt(population / PI): marker area, not radius, tracks population
    pub radius_basis: f64,
}

impl CityPoint {
    pub fn new(name: impl Into<String>, population: f64, color_group: Option<String>, lon: f64, lat: f64) -> Self {
        Self {
            name: name.into(),
            population,
            color_group,
            lon,
            lat,
            radius_basis: radius_basis(population),
        }
    }
}

/// Expects a non-negative population; negative input yields NaN
#[inline(always)]
pub fn radius_basis(population: f64) -> f64 {
    (population / PI).sqrt()
}

#[derive(Debug, Deserialize)]
struct CityRow {
    city: Option<String>,
    size: Option<f64>,
    color_group: Option<String>,
    lon: Option<f64>,
    lat: Option<f64>,
}

impl CityRow {
    fn into_point(self, row: usize) -> Result<CityPoint, DataMappingError> {
        let missing = |field| DataMappingError::MissingField { row, field };
        let name = self.city.filter(|s| !s.is_empty()).ok_or(missing("city"))?;
        let size = self.size.ok_or(missing("size"))?;
        let lon = self.lon.ok_or(missing("lon"))?;
        let lat = self.lat.ok_or(missing("lat"))?;
        let group = self.color_group.filter(|s| !s.is_empty());
        Ok(CityPoint::new(name, size, group, lon, lat))
    }
}

/// Field delimiter by file extension: comma for `.csv`, tab otherwise
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
        _ => b'\t',
    }
}

/// Read the city table from disk
pub fn load_cities(path: &Path) -> Result<Loaded<CityPoint>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = read_cities_from(file, delimiter_for(path), path)?;
    info!(
        path = %path.display(),
        cities = loaded.records.len(),
        rejected = loaded.rejected.len(),
        "loaded cities"
    );
    Ok(loaded)
}

/// Parse a delimited city table with a header row.
/// Rows missing name, size or coordinates are skipped and reported.
pub fn read_cities<R: Read>(reader: R, delimiter: u8) -> Result<Loaded<CityPoint>, LoadError> {
    read_cities_from(reader, delimiter, Path::new("<memory>"))
}

fn read_cities_from<R: Read>(reader: R, delimiter: u8, source: &Path) -> Result<Loaded<CityPoint>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    rdr.headers()?;

    let mut loaded = Loaded::default();
    for (i, result) in rdr.deserialize::<CityRow>().enumerate() {
        let row = i + 1;
        let parsed = match result {
            Ok(r) => r.into_point(row),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(source) => Err(DataMappingError::MalformedRow { row, source }),
        };
        match parsed {
            Ok(point) => loaded.records.push(point),
            Err(e) => loaded.reject(source, e),
        }
    }
    Ok(loaded)
}
