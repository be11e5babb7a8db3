pub mod boundaries;
pub mod cities;

pub use boundaries::{load_boundaries, parse_boundaries, BoundaryFeature};
pub use cities::{load_cities, read_cities, CityPoint};

use crate::error::{DataMappingError, LoadError};
use crate::map::LevelTable;
use crossbeam_channel::Receiver;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Records that loaded, plus the per-record errors that were skipped
#[derive(Debug)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub rejected: Vec<DataMappingError>,
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> Loaded<T> {
    fn reject(&mut self, source: &Path, error: DataMappingError) {
        warn!(source = %source.display(), %error, "skipping record");
        self.rejected.push(error);
    }
}

/// One dataset's load result, sent as soon as that load finishes
#[derive(Debug)]
pub enum LayerLoad {
    Boundaries(Result<Loaded<BoundaryFeature>, LoadError>),
    Cities(Result<Loaded<CityPoint>, LoadError>),
}

/// Start both loads on the rayon pool. Each result is sent on its own as it
/// completes, so a slow dataset never holds back the other. Results for a
/// dropped receiver are discarded.
pub fn spawn_loads(boundaries: PathBuf, cities: PathBuf, levels: LevelTable) -> Receiver<LayerLoad> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let boundaries_tx = tx.clone();
    rayon::spawn(move || {
        let _ = boundaries_tx.send(LayerLoad::Boundaries(load_boundaries(&boundaries, &levels)));
    });
    rayon::spawn(move || {
        let _ = tx.send(LayerLoad::Cities(load_cities(&cities)));
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Both results, whatever order they arrive in
    fn collect(rx: Receiver<LayerLoad>) -> (Result<Loaded<BoundaryFeature>, LoadError>, Result<Loaded<CityPoint>, LoadError>) {
        let (mut boundaries, mut cities) = (None, None);
        for _ in 0..2 {
            match rx.recv().unwrap() {
                LayerLoad::Boundaries(result) => boundaries = Some(result),
                LayerLoad::Cities(result) => cities = Some(result),
            }
        }
        (boundaries.unwrap(), cities.unwrap())
    }

    #[test]
    fn test_missing_boundaries_leave_cities_loading() {
        let dir = tempfile::tempdir().unwrap();
        let cities = dir.path().join("cities.txt");
        std::fs::write(&cities, "city\tsize\tcolor_group\tlon\tlat\nOmsk\t1178\tsiberia\t73.4\t55.0\n")
            .unwrap();

        let rx = spawn_loads(dir.path().join("absent.json"), cities, LevelTable::default());
        let (boundaries, cities) = collect(rx);
        assert!(matches!(boundaries, Err(LoadError::Io { .. })));
        let cities = cities.unwrap();
        assert_eq!(cities.records.len(), 1);
        assert_eq!(cities.records[0].name, "Omsk");
    }

    #[test]
    fn test_missing_cities_leave_boundaries_loading() {
        let dir = tempfile::tempdir().unwrap();
        let boundaries = dir.path().join("regions.json");
        std::fs::write(
            &boundaries,
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"level":3,"orderIndex":4,"name":"Ural"},
                 "geometry":{"type":"Polygon","coordinates":[[[55,55],[70,55],[70,65],[55,65],[55,55]]]}},
                {"type":"Feature","properties":{"level":9,"name":"Nowhere"},
                 "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}
            ]}"#,
        )
        .unwrap();

        let rx = spawn_loads(boundaries, dir.path().join("absent.txt"), LevelTable::default());
        let (boundaries, cities) = collect(rx);
        assert!(matches!(cities, Err(LoadError::Io { .. })));
        let boundaries = boundaries.unwrap();
        assert_eq!(boundaries.records.len(), 1);
        assert_eq!(boundaries.records[0].level, crate::map::Level::District);
        assert_eq!(boundaries.records[0].order_index, 4);
        assert_eq!(boundaries.records[0].name, "Ural");
        assert_eq!(boundaries.rejected.len(), 1);
    }
}
