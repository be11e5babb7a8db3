//! Runtime configuration, loaded from an optional TOML file.
//! Every field has a default so a partial file is enough.

use crate::interaction::OverlayConfig;
use crate::map::{LevelTable, Palette, ProjectionConfig, SceneStyle, ZoomConfig};
use anyhow::{Context, Result};
use glam::DVec2;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub canvas: CanvasConfig,
    pub projection: ProjectionConfig,
    pub palette: Palette,
    pub levels: LevelTable,
    pub style: SceneStyle,
    pub zoom: ZoomConfig,
    pub overlay: OverlayConfig,
    pub legend: LegendConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub boundaries: PathBuf,
    /// Tab separated unless the extension is `.csv`
    pub cities: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            boundaries: PathBuf::from("data/regions-ru_q0_coast.json"),
            cities: PathBuf::from("data/cities.txt"),
        }
    }
}

/// Logical canvas the projection and overlays are laid out in
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 900.0,
            height: 500.0,
        }
    }
}

impl CanvasConfig {
    pub fn size(&self) -> DVec2 {
        DVec2::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub label: String,
    /// Colour group the legend marker is filled with
    pub group: String,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            label: "12 million people".to_string(),
            group: "europe".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub file: PathBuf,
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("citymap.log"),
            filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Level, Rgb};

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.canvas.size(), DVec2::new(900.0, 500.0));
        assert_eq!(config.levels.get(3), Some(Level::District));
        assert_eq!(config.palette.get("siberia"), Some(Rgb(0xfd, 0xc0, 0x86)));
        assert_eq!(config.overlay.delay_ms, 100);
        assert_eq!(config.zoom.max_scale, 10.0);
        assert_eq!(config.data.cities, PathBuf::from("data/cities.txt"));
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml(
            r##"
            [data]
            cities = "cities.csv"

            [palette]
            europe = "#ff0000"

            [[levels]]
            code = 7
            class = "region"

            [zoom]
            max_scale = 4.0

            [projection]
            translate = [100.0, 50.0]
            "##,
        )
        .unwrap();

        assert_eq!(config.data.cities, PathBuf::from("cities.csv"));
        assert_eq!(config.data.boundaries, DataConfig::default().boundaries);
        assert_eq!(config.palette.get("europe"), Some(Rgb(255, 0, 0)));
        assert_eq!(config.palette.get("siberia"), None);
        assert_eq!(config.levels.get(7), Some(Level::Region));
        assert_eq!(config.levels.get(2), None);
        assert_eq!(config.zoom.max_scale, 4.0);
        assert_eq!(config.zoom.min_scale, 1.0);
        assert_eq!(config.projection.translate, Some([100.0, 50.0]));
        assert_eq!(config.projection.scale, 650.0);
    }

    #[test]
    fn test_bad_colour_rejected() {
        assert!(Config::from_toml("[palette]\neurope = \"green\"").is_err());
    }

    #[test]
    fn test_bad_zoom_extent_rejected() {
        for zoom in [
            "[zoom]\nmax_scale = 0.5\n",
            "[zoom]\nmin_scale = 0.0\n",
            "[zoom]\nmin_scale = -2.0\nmax_scale = 4.0\n",
            "[zoom]\nmax_scale = nan\n",
            "[zoom]\nmax_scale = inf\n",
            "[zoom]\nstep = 0.0\n",
        ] {
            assert!(Config::from_toml(zoom).is_err(), "{zoom:?} accepted");
        }

        let config = Config::from_toml("[zoom]\nmin_scale = 2.0\nmax_scale = 2.0\n").unwrap();
        assert_eq!(config.zoom.clamp(9.0), 2.0);
        assert_eq!(config.zoom.step, 1.5);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("citymap.toml");
        fs::write(&path, "[canvas]\nwidth = 400.0\n").unwrap();
        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.canvas.size(), DVec2::new(400.0, 500.0));

        assert!(Config::load_from_file(&dir.path().join("missing.toml")).is_err());
    }
}
