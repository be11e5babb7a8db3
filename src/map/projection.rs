use crate::geo::{wrap_lon, wrap_radians, Polygon};
use glam::DVec2;
use serde::Deserialize;
use std::fmt::Write;

/// Maps geographic coordinates (lon, lat in degrees) to planar logical units
pub trait Projection: Send + Sync {
    fn project(&self, lon: f64, lat: f64) -> DVec2;
}

/// Albers-style configuration for a conic equal-area projection
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Rotation [lambda, phi] in degrees applied before projecting
    pub rotate: [f64; 2],
    /// Point [lon, lat] (in the rotated frame) placed at `translate`
    pub center: [f64; 2],
    /// Standard parallels in degrees
    pub parallels: [f64; 2],
    pub scale: f64,
    /// Defaults to the middle of the canvas
    pub translate: Option<[f64; 2]>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            rotate: [-105.0, 0.0],
            center: [-10.0, 65.0],
            parallels: [52.0, 64.0],
            scale: 650.0,
            translate: None,
        }
    }
}

/// Raw conic equal-area forward transform on radians.
/// Degenerates to cylindrical equal-area when the parallels are symmetric
/// around the equator.
#[derive(Debug, Clone, Copy)]
enum Raw {
    Conic { n: f64, c: f64, r0: f64 },
    Cylindrical { cos_phi0: f64 },
}

impl Raw {
    fn new(phi0: f64, phi1: f64) -> Self {
        let sy0 = phi0.sin();
        let n = (sy0 + phi1.sin()) / 2.0;
        if n.abs() < 1e-6 {
            return Raw::Cylindrical { cos_phi0: phi0.cos() };
        }
        let c = 1.0 + sy0 * (2.0 * n - sy0);
        Raw::Conic { n, c, r0: c.sqrt() / n }
    }

    #[inline(always)]
    fn forward(self, lambda: f64, phi: f64) -> DVec2 {
        match self {
            Raw::Conic { n, c, r0 } => {
                let r = (c - 2.0 * n * phi.sin()).max(0.0).sqrt() / n;
                let a = lambda * n;
                DVec2::new(r * a.sin(), r0 - r * a.cos())
            }
            Raw::Cylindrical { cos_phi0 } => DVec2::new(lambda * cos_phi0, phi.sin() / cos_phi0),
        }
    }
}

/// Conic equal-area projection with rotation, recentring, scale and translate
#[derive(Debug, Clone)]
pub struct ConicEqualArea {
    raw: Raw,
    delta_lambda: f64,
    cos_delta_phi: f64,
    sin_delta_phi: f64,
    k: f64,
    offset: DVec2,
}

impl ConicEqualArea {
    /// Build from configuration, translating to the middle of `canvas`
    /// unless an explicit translate is configured.
    pub fn new(config: &ProjectionConfig, canvas: DVec2) -> Self {
        let raw = Raw::new(config.parallels[0].to_radians(), config.parallels[1].to_radians());
        let translate = config
            .translate
            .map(DVec2::from)
            .unwrap_or(canvas / 2.0);
        let k = config.scale;

        // The center is projected without rotation
        let center = raw.forward(
            wrap_lon(config.center[0]).to_radians(),
            config.center[1].to_radians(),
        );
        let offset = DVec2::new(translate.x - k * center.x, translate.y + k * center.y);

        let delta_phi = config.rotate[1].to_radians();
        Self {
            raw,
            delta_lambda: config.rotate[0].to_radians(),
            cos_delta_phi: delta_phi.cos(),
            sin_delta_phi: delta_phi.sin(),
            k,
            offset,
        }
    }

    #[inline(always)]
    fn rotate(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let lambda = wrap_radians(lambda + self.delta_lambda);
        if self.sin_delta_phi == 0.0 {
            return (lambda, phi);
        }
        let cos_phi = phi.cos();
        let x = lambda.cos() * cos_phi;
        let y = lambda.sin() * cos_phi;
        let z = phi.sin();
        let k = z * self.cos_delta_phi + x * self.sin_delta_phi;
        (
            y.atan2(x * self.cos_delta_phi - z * self.sin_delta_phi),
            k.clamp(-1.0, 1.0).asin(),
        )
    }
}

impl Projection for ConicEqualArea {
    fn project(&self, lon: f64, lat: f64) -> DVec2 {
        let (lambda, phi) = self.rotate(lon.to_radians(), lat.to_radians());
        let p = self.raw.forward(lambda, phi);
        DVec2::new(self.offset.x + self.k * p.x, self.offset.y - self.k * p.y)
    }
}

/// Boundary geometry after projection: every ring of every polygon
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectedPath {
    pub rings: Vec<Vec<DVec2>>,
}

impl ProjectedPath {
    /// SVG path data, one closed subpath per ring
    pub fn to_svg(&self) -> String {
        let mut d = String::new();
        for ring in &self.rings {
            for (i, p) in ring.iter().enumerate() {
                let cmd = if i == 0 { 'M' } else { 'L' };
                let _ = write!(d, "{cmd}{:.3},{:.3}", p.x, p.y);
            }
            if !ring.is_empty() {
                d.push('Z');
            }
        }
        d
    }

    /// Even-odd containment over all rings
    pub fn contains(&self, p: DVec2) -> bool {
        self.rings
            .iter()
            .filter(|ring| crate::geo::ring_contains(ring, p))
            .count()
            % 2
            == 1
    }
}

/// Path generator: projects boundary polygons ring by ring
pub struct GeoPath<'a> {
    projection: &'a dyn Projection,
}

impl<'a> GeoPath<'a> {
    pub fn new(projection: &'a dyn Projection) -> Self {
        Self { projection }
    }

    pub fn project(&self, polygons: &[Polygon]) -> ProjectedPath {
        let rings = polygons
            .iter()
            .flatten()
            .filter(|ring| ring.len() >= 2)
            .map(|ring| {
                ring.iter()
                    .map(|&(lon, lat)| self.projection.project(lon, lat))
                    .collect()
            })
            .collect();
        ProjectedPath { rings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_projection() -> ConicEqualArea {
        ConicEqualArea::new(&ProjectionConfig::default(), DVec2::new(900.0, 500.0))
    }

    #[test]
    fn test_center_maps_to_translate() {
        let projection = default_projection();
        // center [-10, 65] is in the frame rotated by -105 degrees
        let p = projection.project(95.0, 65.0);
        assert!((p.x - 450.0).abs() < 1e-9, "{p:?}");
        assert!((p.y - 250.0).abs() < 1e-9, "{p:?}");
    }

    #[test]
    fn test_orientation() {
        let projection = default_projection();
        let moscow = projection.project(37.6, 55.8);
        let novosibirsk = projection.project(82.9, 55.0);
        let norilsk = projection.project(88.2, 69.3);
        assert!(moscow.x < novosibirsk.x);
        // screen y grows southward
        assert!(norilsk.y < novosibirsk.y);
        assert!(moscow.x > 0.0 && moscow.x < 900.0);
    }

    #[test]
    fn test_explicit_translate() {
        let config = ProjectionConfig {
            translate: Some([0.0, 0.0]),
            ..ProjectionConfig::default()
        };
        let projection = ConicEqualArea::new(&config, DVec2::new(900.0, 500.0));
        let p = projection.project(95.0, 65.0);
        assert!(p.length() < 1e-9);
    }

    #[test]
    fn test_symmetric_parallels_fall_back_to_cylindrical() {
        let config = ProjectionConfig {
            rotate: [0.0, 0.0],
            center: [0.0, 0.0],
            parallels: [-30.0, 30.0],
            scale: 100.0,
            translate: Some([0.0, 0.0]),
        };
        let projection = ConicEqualArea::new(&config, DVec2::ZERO);
        let p = projection.project(0.0, 90.0);
        let expected = -100.0 / 30f64.to_radians().cos();
        assert!(p.y.is_finite());
        assert!((p.y - expected).abs() < 1e-9);
    }

    #[test]
    fn test_path_svg() {
        let path = ProjectedPath {
            rings: vec![vec![DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.5), DVec2::new(0.0, 1.0)]],
        };
        assert_eq!(path.to_svg(), "M0.000,0.000L1.000,0.500L0.000,1.000Z");
        assert!(path.contains(DVec2::new(0.3, 0.5)));
        assert!(!path.contains(DVec2::new(0.9, 0.9)));
    }

    #[test]
    fn test_geo_path_skips_degenerate_rings() {
        let projection = default_projection();
        let polygons = vec![vec![
            vec![(30.0, 50.0), (40.0, 50.0), (40.0, 60.0), (30.0, 50.0)],
            vec![(35.0, 55.0)],
        ]];
        let path = GeoPath::new(&projection).project(&polygons);
        assert_eq!(path.rings.len(), 1);
        assert_eq!(path.rings[0].len(), 4);
    }
}
