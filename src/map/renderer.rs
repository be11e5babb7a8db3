use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_circle, draw_line, draw_thick_line};
use crate::map::scene::Scene;
use crate::map::style::{Level, Rgb};
use crate::map::transform::ViewTransform;
use glam::{DVec2, IVec2};
use std::collections::BTreeMap;

/// Uniform fit of the logical canvas into a Braille pixel area, centred
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasFit {
    /// Braille pixels per logical unit
    pub scale: f64,
    pub offset: DVec2,
}

impl CanvasFit {
    pub fn new(canvas: DVec2, pixels: DVec2) -> Self {
        let scale = (pixels.x / canvas.x).min(pixels.y / canvas.y).max(f64::EPSILON);
        let offset = (pixels - canvas * scale) / 2.0;
        Self { scale, offset }
    }

    /// Logical screen coordinates to Braille pixels
    #[inline(always)]
    pub fn to_pixels(&self, p: DVec2) -> DVec2 {
        p * self.scale + self.offset
    }

    /// Braille pixels back to logical screen coordinates
    #[inline(always)]
    pub fn from_pixels(&self, px: DVec2) -> DVec2 {
        (px - self.offset) / self.scale
    }

    /// Terminal cell (relative to the map area) to logical screen
    /// coordinates, taking the centre of the cell
    pub fn from_cell(&self, col: u16, row: u16) -> DVec2 {
        self.from_pixels(DVec2::new(col as f64 * 2.0 + 1.0, row as f64 * 4.0 + 2.0))
    }

    /// Logical screen coordinates to a terminal cell (relative to the map area)
    pub fn to_cell(&self, p: DVec2) -> (i32, i32) {
        let px = self.to_pixels(p);
        ((px.x / 2.0).floor() as i32, (px.y / 4.0).floor() as i32)
    }
}

/// A label in cell coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct CellLabel {
    pub col: u16,
    pub row: u16,
    pub text: String,
}

/// Rasterised scene: one canvas per boundary level, one per marker fill
pub struct MapLayers {
    pub country: BrailleCanvas,
    pub district: BrailleCanvas,
    pub region: BrailleCanvas,
    pub markers: Vec<(Option<Rgb>, BrailleCanvas)>,
    pub labels: Vec<CellLabel>,
}

impl MapLayers {
    fn new(width: usize, height: usize) -> Self {
        Self {
            country: BrailleCanvas::new(width, height),
            district: BrailleCanvas::new(width, height),
            region: BrailleCanvas::new(width, height),
            markers: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn level(&self, level: Level) -> &BrailleCanvas {
        match level {
            Level::Country => &self.country,
            Level::District => &self.district,
            Level::Region => &self.region,
        }
    }

    fn level_mut(&mut self, level: Level) -> &mut BrailleCanvas {
        match level {
            Level::Country => &mut self.country,
            Level::District => &mut self.district,
            Level::Region => &mut self.region,
        }
    }
}

/// Rasterise a bound scene under a view transform into `width` x `height`
/// terminal cells
pub fn render(scene: &Scene, view: &ViewTransform, fit: &CanvasFit, width: usize, height: usize) -> MapLayers {
    let mut layers = MapLayers::new(width, height);
    let bounds = IVec2::new(width as i32 * 2, height as i32 * 4);
    let to_px = |p: DVec2| -> IVec2 {
        let px = fit.to_pixels(view.apply(p));
        IVec2::new(px.x.round() as i32, px.y.round() as i32)
    };

    for boundary in scene.boundaries() {
        // stroke width is counter-scaled, so k * width is constant on screen
        let stroke = (boundary.stroke_width * view.k * fit.scale).round() as i32;
        let canvas = layers.level_mut(boundary.level);
        for ring in &boundary.path.rings {
            let mut prev: Option<IVec2> = None;
            for &p in ring {
                let px = to_px(p);
                if let Some(last) = prev {
                    if segment_might_be_visible(last, px, bounds) {
                        if stroke > 1 {
                            draw_thick_line(canvas, last, px, stroke);
                        } else {
                            draw_line(canvas, last, px);
                        }
                    }
                }
                prev = Some(px);
            }
        }
    }

    let mut markers: BTreeMap<Option<Rgb>, BrailleCanvas> = BTreeMap::new();
    for point in scene.points() {
        let center = to_px(point.anchor);
        let radius_px = point.radius * view.k * fit.scale;
        let reach = radius_px.ceil() as i32;
        if center.x < -reach || center.y < -reach || center.x > bounds.x + reach || center.y > bounds.y + reach {
            continue;
        }
        let canvas = markers
            .entry(point.fill)
            .or_insert_with(|| BrailleCanvas::new(width, height));
        draw_circle(canvas, center, radius_px.round().max(1.0) as i32);

        let label_px = center.x as f64 + point.label.x * view.k * fit.scale;
        let (col, row) = ((label_px / 2.0).ceil() as i32, center.y.div_euclid(4));
        if (0..width as i32).contains(&col) && (0..height as i32).contains(&row) {
            layers.labels.push(CellLabel {
                col: col as u16,
                row: row as u16,
                text: point.label.text.clone(),
            });
        }
    }
    layers.markers = markers.into_iter().collect();
    layers
}

/// Rough bounding box check before drawing a segment
fn segment_might_be_visible(a: IVec2, b: IVec2, bounds: IVec2) -> bool {
    let min = a.min(b);
    let max = a.max(b);
    max.x >= 0 && min.x < bounds.x && max.y >= 0 && min.y < bounds.y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BoundaryFeature, CityPoint};
    use crate::map::projection::Projection;
    use crate::map::style::{Palette, SceneStyle};

    struct Flat;

    impl Projection for Flat {
        fn project(&self, lon: f64, lat: f64) -> DVec2 {
            DVec2::new(lon, lat)
        }
    }

    fn scene() -> Scene {
        let mut scene = Scene::new(SceneStyle::default());
        let square = vec![vec![vec![(100.0, 100.0), (300.0, 100.0), (300.0, 300.0), (100.0, 300.0), (100.0, 100.0)]]];
        scene.bind_boundaries(
            &[BoundaryFeature {
                geometry: square,
                level: Level::District,
                order_index: 0,
                name: "d".into(),
            }],
            &Flat,
        );
        scene
            .bind_points(
                &[
                    CityPoint::new("Omsk", 1178.0, Some("siberia".into()), 200.0, 200.0),
                    CityPoint::new("Kazan", 1250.0, Some("europe".into()), 600.0, 200.0),
                    CityPoint::new("Nowhere", 1000.0, None, 5000.0, 200.0),
                ],
                &Flat,
                &Palette::default(),
            )
            .unwrap();
        scene
    }

    #[test]
    fn test_canvas_fit() {
        let fit = CanvasFit::new(DVec2::new(900.0, 500.0), DVec2::new(180.0, 200.0));
        assert!((fit.scale - 0.2).abs() < 1e-12);
        assert!((fit.offset - DVec2::new(0.0, 50.0)).length() < 1e-9);
        let p = DVec2::new(450.0, 250.0);
        assert!((fit.from_pixels(fit.to_pixels(p)) - p).length() < 1e-9);
        assert_eq!(fit.to_cell(p), (45, 25));
    }

    #[test]
    fn test_layers_by_level_and_fill() {
        let scene = scene();
        let fit = CanvasFit::new(DVec2::new(900.0, 500.0), DVec2::new(180.0, 100.0));
        let layers = render(&scene, &ViewTransform::IDENTITY, &fit, 90, 25);

        assert!(!layers.level(Level::District).is_blank());
        assert!(layers.level(Level::Country).is_blank());
        assert!(layers.level(Level::Region).is_blank());

        // off-canvas city is culled
        let fills: Vec<_> = layers.markers.iter().map(|(fill, _)| *fill).collect();
        assert_eq!(fills.len(), 2);
        assert!(fills.iter().all(Option::is_some));
        let names: Vec<_> = layers.labels.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(names, ["Omsk", "Kazan"]);
    }

    #[test]
    fn test_marker_screen_size_constant_under_zoom() {
        let mut scene = scene();
        let fit = CanvasFit::new(DVec2::new(900.0, 500.0), DVec2::new(900.0, 500.0));
        let base = render(&scene, &ViewTransform::IDENTITY, &fit, 450, 125);

        let k = 2.0;
        let view = ViewTransform::IDENTITY.scaled_to_at(k, DVec2::new(200.0, 200.0));
        scene.apply_zoom(k);
        let zoomed = render(&scene, &view, &fit, 450, 125);

        let omsk = |layers: &MapLayers| {
            layers
                .markers
                .iter()
                .find(|(fill, _)| *fill == Palette::default().get("siberia"))
                .map(|(_, canvas)| canvas.clone())
        };
        assert_eq!(omsk(&base), omsk(&zoomed));
    }
}
