use crate::data::{BoundaryFeature, CityPoint};
use crate::error::{DataMappingError, RenderPrecondition};
use crate::map::projection::{GeoPath, ProjectedPath, Projection};
use crate::map::scale::{build_scale, ScaleMapping};
use crate::map::spatial::{FeatureGrid, PointGrid};
use crate::map::style::{Level, Palette, Rgb, SceneStyle};
use crate::map::transform::ViewTransform;
use glam::DVec2;
use rayon::prelude::*;
use tracing::{debug, warn};

/// Grid cell size for hit testing, in scene units
const GRID_CELL: f64 = 16.0;

/// One projected boundary
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPath {
    pub level: Level,
    pub order_index: i64,
    /// Feature name, shown when hovering the boundary
    pub title: String,
    pub path: ProjectedPath,
    /// SVG path data
    pub d: String,
    pub stroke_width: f64,
}

impl BoundaryPath {
    pub fn class(&self) -> &'static str {
        self.level.class_name()
    }
}

/// Text placed just beyond a marker's edge
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    /// Offset from the anchor along x
    pub x: f64,
    pub font_size: f64,
}

/// A city marker group: circle plus label, positioned at the projected city
#[derive(Debug, Clone, PartialEq)]
pub struct PointGroup {
    pub name: String,
    pub population: f64,
    pub anchor: DVec2,
    /// Scale output at zoom factor 1
    pub base_radius: f64,
    pub radius: f64,
    /// `None` when the colour group is not in the palette
    pub fill: Option<Rgb>,
    pub label: Label,
}

/// Counter-scale marker radii so they keep their screen size under zoom
pub fn compute_rescale(transform: &ViewTransform, base_radii: &[f64]) -> Vec<f64> {
    base_radii.iter().map(|r| r / transform.k).collect()
}

/// Bound visual primitives for both layers.
/// Each layer is replaced wholesale on rebinding.
#[derive(Debug, Clone)]
pub struct Scene {
    style: SceneStyle,
    boundaries: Vec<BoundaryPath>,
    points: Vec<PointGroup>,
    scale: Option<ScaleMapping>,
    k: f64,
    boundary_grid: FeatureGrid,
    point_grid: PointGrid,
}

impl Scene {
    pub fn new(style: SceneStyle) -> Self {
        Self {
            style,
            boundaries: Vec::new(),
            points: Vec::new(),
            scale: None,
            k: 1.0,
            boundary_grid: FeatureGrid::default(),
            point_grid: PointGrid::default(),
        }
    }

    /// Boundaries in draw order
    pub fn boundaries(&self) -> &[BoundaryPath] {
        &self.boundaries
    }

    /// Point groups in input order (later groups draw on top)
    pub fn points(&self) -> &[PointGroup] {
        &self.points
    }

    pub fn scale(&self) -> Option<&ScaleMapping> {
        self.scale.as_ref()
    }

    /// Zoom factor the presentation attributes currently reflect
    pub fn zoom_factor(&self) -> f64 {
        self.k
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty() && self.points.is_empty()
    }

    /// Bind boundary features: one path per feature, ordered by ascending
    /// `order_index`, ties kept in input order.
    pub fn bind_boundaries(&mut self, features: &[BoundaryFeature], projection: &dyn Projection) {
        let stroke_width = self.style.stroke_width / self.k;
        let mut boundaries: Vec<BoundaryPath> = features
            .par_iter()
            .map(|feature| {
                let path = GeoPath::new(projection).project(&feature.geometry);
                BoundaryPath {
                    level: feature.level,
                    order_index: feature.order_index,
                    title: feature.name.clone(),
                    d: path.to_svg(),
                    path,
                    stroke_width,
                }
            })
            .collect();
        boundaries.sort_by_key(|b| b.order_index);

        self.boundary_grid = FeatureGrid::build(
            boundaries.iter().map(|b| crate::geo::bounds(&b.path.rings)),
            GRID_CELL,
        );
        self.boundaries = boundaries;
        debug!(count = self.boundaries.len(), "bound boundaries");
    }

    /// Bind city points: one group per city at its projected position.
    /// Unknown colour groups bind without fill; cities with a non-finite
    /// radius basis are left out.
    pub fn bind_points(
        &mut self,
        points: &[CityPoint],
        projection: &dyn Projection,
        palette: &Palette,
    ) -> Result<(), RenderPrecondition> {
        self.points.clear();
        self.point_grid = PointGrid::default();
        self.scale = None;
        if points.is_empty() {
            return Ok(());
        }

        let scale = build_scale(points, self.style.radius_range)?;
        let mut groups = Vec::with_capacity(points.len());
        for city in points {
            if !city.radius_basis.is_finite() {
                let error = RenderPrecondition::NonFiniteRadius {
                    name: city.name.clone(),
                    value: city.radius_basis,
                };
                warn!(%error, "skipping city");
                continue;
            }

            let fill = city.color_group.as_deref().and_then(|g| palette.get(g));
            if fill.is_none() {
                let error = DataMappingError::UnknownColorGroup {
                    name: city.name.clone(),
                    group: city.color_group.clone(),
                };
                warn!(%error, "binding city without fill");
            }

            let base_radius = scale.apply(city.radius_basis);
            groups.push(PointGroup {
                name: city.name.clone(),
                population: city.population,
                anchor: projection.project(city.lon, city.lat),
                base_radius,
                radius: base_radius,
                fill,
                label: Label {
                    text: city.name.clone(),
                    x: base_radius + self.style.label_gap,
                    font_size: self.style.font_size,
                },
            });
        }

        self.point_grid = PointGrid::build(groups.iter().map(|g| g.anchor), GRID_CELL);
        self.points = groups;
        self.scale = Some(scale);
        self.rescale_points();
        debug!(count = self.points.len(), "bound points");
        Ok(())
    }

    /// Rederive every zoom-dependent attribute from its base value
    pub fn apply_zoom(&mut self, k: f64) {
        self.k = k;
        let stroke_width = self.style.stroke_width / k;
        for boundary in &mut self.boundaries {
            boundary.stroke_width = stroke_width;
        }
        self.rescale_points();
    }

    fn rescale_points(&mut self) {
        let transform = ViewTransform::new(DVec2::ZERO, self.k);
        let base: Vec<f64> = self.points.iter().map(|p| p.base_radius).collect();
        let radii = compute_rescale(&transform, &base);
        let font_size = self.style.font_size / self.k;
        for (point, radius) in self.points.iter_mut().zip(radii) {
            point.radius = radius;
            point.label.x = radius + self.style.label_gap;
            point.label.font_size = font_size;
        }
    }

    /// Topmost point whose marker contains `p` (scene coordinates), with
    /// `slack` extra screen units of tolerance
    pub fn point_at(&self, p: DVec2, slack: f64) -> Option<usize> {
        let reach = (self.style.radius_range[1] + slack) / self.k;
        self.point_grid
            .query_radius(p, reach)
            .into_iter()
            .filter(|&i| {
                let point = &self.points[i];
                point.anchor.distance(p) <= point.radius + slack / self.k
            })
            .max()
    }

    /// Topmost boundary containing `p` (scene coordinates)
    pub fn boundary_at(&self, p: DVec2) -> Option<&BoundaryPath> {
        self.boundary_grid
            .query_point(p)
            .iter()
            .rev()
            .map(|&i| &self.boundaries[i])
            .find(|b| b.path.contains(p))
    }
}
