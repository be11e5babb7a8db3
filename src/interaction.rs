//! Pointer interaction: hover tooltips, click info panel, zoom and pan.
//!
//! Time is supplied by the caller as a monotonic `Duration` so every
//! transition can be driven deterministically.

use crate::map::{PointGroup, Scene, ViewTransform, ZoomConfig};
use glam::DVec2;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Which singleton overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Tooltip,
    Panel,
}

/// Horizontal edge of an overlay box that sits at `Anchor::x`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
}

/// Overlay position in logical screen units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub edge: Edge,
    pub x: f64,
    pub y: f64,
}

/// Presentation surface for the tooltip and the info panel
pub trait OverlaySink {
    fn show_tooltip(&mut self, text: &str, anchor: Anchor, opacity: f64);
    fn show_panel(&mut self, text: &str, anchor: Anchor, opacity: f64);
    fn hide(&mut self, overlay: Overlay);
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub delay_ms: u64,
    pub duration_ms: u64,
    /// Tooltip top edge sits this far above the pointer
    pub tooltip_offset_y: f64,
    /// Panel distance from the left edge when shown on the left
    pub panel_left: f64,
    /// Panel distance from the right edge when shown on the right
    pub panel_right: f64,
    pub panel_top: f64,
    /// Text shown in the info panel under the city name
    pub blurb: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            delay_ms: 100,
            duration_ms: 300,
            tooltip_offset_y: 35.0,
            panel_left: 15.0,
            panel_right: 105.0,
            panel_top: 15.0,
            blurb: "Million-plus cities are the cities of the Russian Federation whose population \
                    within city limits exceeds one million people."
                .to_string(),
        }
    }
}

/// Interaction state of a single point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointState {
    Idle,
    Hovered,
    Selected,
}

/// An explicit zoom/pan outcome applied to the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomEvent {
    pub transform: ViewTransform,
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    from: f64,
    to: f64,
    start: Duration,
    duration: Duration,
}

impl Fade {
    fn end(&self) -> Duration {
        self.start + self.duration
    }

    fn value_at(&self, now: Duration) -> f64 {
        if now <= self.start {
            return self.from;
        }
        if now >= self.end() || self.duration.is_zero() {
            return self.to;
        }
        let t = (now - self.start).as_secs_f64() / self.duration.as_secs_f64();
        self.from + (self.to - self.from) * cubic_in_out(t)
    }
}

fn cubic_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// A fade waiting for its delay to elapse. Its starting opacity is taken
/// when it begins.
#[derive(Debug, Clone, Copy)]
struct PendingFade {
    to: f64,
    start: Duration,
    duration: Duration,
}

/// One singleton overlay element and its fade timeline.
/// Scheduling a fade replaces any pending one; a running fade keeps going
/// until the new one begins.
#[derive(Debug, Clone, Default)]
struct OverlayState {
    text: String,
    anchor: Option<Anchor>,
    opacity: f64,
    active: Option<Fade>,
    pending: Option<PendingFade>,
}

impl OverlayState {
    fn schedule(&mut self, to: f64, now: Duration, delay: Duration, duration: Duration) {
        self.advance(now);
        self.pending = Some(PendingFade {
            to,
            start: now + delay,
            duration,
        });
    }

    fn opacity_at(&self, t: Duration) -> f64 {
        self.active.map_or(self.opacity, |f| f.value_at(t))
    }

    fn advance(&mut self, now: Duration) {
        if let Some(pending) = self.pending.filter(|p| now >= p.start) {
            let from = self.opacity_at(pending.start);
            self.active = Some(Fade {
                from,
                to: pending.to,
                start: pending.start,
                duration: pending.duration,
            });
            self.pending = None;
        }
        self.opacity = self.opacity_at(now);
        if self.active.is_some_and(|f| now >= f.end()) {
            self.active = None;
        }
    }
}

/// Hover, click and zoom state machine over the bound points
pub struct InteractionController {
    config: OverlayConfig,
    zoom: ZoomConfig,
    /// Logical canvas size
    viewport: DVec2,
    transform: ViewTransform,
    hovered: Option<usize>,
    selected: Option<usize>,
    tooltip: OverlayState,
    panel: OverlayState,
}

impl InteractionController {
    pub fn new(config: OverlayConfig, zoom: ZoomConfig, viewport: DVec2) -> Self {
        Self {
            config,
            zoom,
            viewport,
            transform: ViewTransform::IDENTITY,
            hovered: None,
            selected: None,
            tooltip: OverlayState::default(),
            panel: OverlayState::default(),
        }
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn state_of(&self, index: usize) -> PointState {
        if self.selected == Some(index) {
            PointState::Selected
        } else if self.hovered == Some(index) {
            PointState::Hovered
        } else {
            PointState::Idle
        }
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn tooltip_opacity(&self) -> f64 {
        self.tooltip.opacity
    }

    pub fn panel_opacity(&self) -> f64 {
        self.panel.opacity
    }

    pub fn tooltip_text(&self) -> &str {
        &self.tooltip.text
    }

    pub fn panel_text(&self) -> &str {
        &self.panel.text
    }

    fn delay(&self) -> Duration {
        Duration::from_millis(self.config.delay_ms)
    }

    fn duration(&self) -> Duration {
        Duration::from_millis(self.config.duration_ms)
    }

    fn on_left_half(&self, pointer: DVec2) -> bool {
        pointer.x < self.viewport.x / 2.0
    }

    /// Pointer entered a point's marker. `pointer` is in logical screen units.
    pub fn pointer_enter(&mut self, index: usize, point: &PointGroup, pointer: DVec2, now: Duration) {
        debug!(city = %point.name, "hover");
        self.hovered = Some(index);
        let edge = if self.on_left_half(pointer) { Edge::Left } else { Edge::Right };
        self.tooltip.text = format!("{} thousand people", point.population);
        self.tooltip.anchor = Some(Anchor {
            edge,
            x: pointer.x,
            y: pointer.y - self.config.tooltip_offset_y,
        });
        let (delay, duration) = (self.delay(), self.duration());
        self.tooltip.schedule(1.0, now, delay, duration);
    }

    /// Pointer left a point's marker. Ignored unless that point is hovered.
    pub fn pointer_leave(&mut self, index: usize, now: Duration) {
        if self.hovered != Some(index) {
            return;
        }
        self.hovered = None;
        let (delay, duration) = (self.delay(), self.duration());
        self.tooltip.schedule(0.0, now, delay, duration);
    }

    /// Select a point and show its info panel on the side away from the click
    pub fn click_point(&mut self, index: usize, point: &PointGroup, pointer: DVec2, now: Duration) {
        debug!(city = %point.name, "select");
        self.selected = Some(index);
        self.panel.text = format!("{}\n{}", point.name, self.config.blurb);
        self.panel.anchor = Some(if self.on_left_half(pointer) {
            Anchor {
                edge: Edge::Right,
                x: self.viewport.x - self.config.panel_right,
                y: self.config.panel_top,
            }
        } else {
            Anchor {
                edge: Edge::Left,
                x: self.config.panel_left,
                y: self.config.panel_top,
            }
        });
        let (delay, duration) = (self.delay(), self.duration());
        self.panel.schedule(1.0, now, delay, duration);
    }

    /// Click on the map away from any point: dismiss the panel
    pub fn click_background(&mut self, now: Duration) {
        if self.selected.take().is_some() {
            debug!("deselect");
        }
        let (delay, duration) = (self.delay(), self.duration());
        self.panel.schedule(0.0, now, delay, duration);
    }

    /// Apply a new view transform and counter-scale the scene
    pub fn zoom(&mut self, event: ZoomEvent, scene: &mut Scene) {
        self.transform = event.transform;
        scene.apply_zoom(event.transform.k);
    }

    /// Zoom by `factor` around `pointer` (logical screen units), within the
    /// configured scale extent
    pub fn zoom_at(&mut self, pointer: DVec2, factor: f64, scene: &mut Scene) {
        let k = self.zoom.clamp(self.transform.k * factor);
        let transform = self.transform.scaled_to_at(k, pointer);
        self.zoom(ZoomEvent { transform }, scene);
    }

    pub fn zoom_in_at(&mut self, pointer: DVec2, scene: &mut Scene) {
        self.zoom_at(pointer, self.zoom.step, scene);
    }

    pub fn zoom_out_at(&mut self, pointer: DVec2, scene: &mut Scene) {
        self.zoom_at(pointer, 1.0 / self.zoom.step, scene);
    }

    /// Pan by a delta in logical screen units
    pub fn pan(&mut self, delta: DVec2, scene: &mut Scene) {
        let transform = self.transform.translated(delta);
        self.zoom(ZoomEvent { transform }, scene);
    }

    pub fn reset_view(&mut self, scene: &mut Scene) {
        self.zoom(
            ZoomEvent {
                transform: ViewTransform::IDENTITY,
            },
            scene,
        );
    }

    /// Forget hover and selection, e.g. after the points were rebound
    pub fn clear_points(&mut self, now: Duration) {
        if let Some(index) = self.hovered {
            self.pointer_leave(index, now);
        }
        self.click_background(now);
    }

    /// Advance fades to `now` and push both overlays to the sink
    pub fn tick(&mut self, now: Duration, sink: &mut dyn OverlaySink) {
        self.tooltip.advance(now);
        self.panel.advance(now);

        match self.tooltip.anchor {
            Some(anchor) if self.tooltip.opacity > 0.0 => {
                sink.show_tooltip(&self.tooltip.text, anchor, self.tooltip.opacity)
            }
            _ => sink.hide(Overlay::Tooltip),
        }
        match self.panel.anchor {
            Some(anchor) if self.panel.opacity > 0.0 => sink.show_panel(&self.panel.text, anchor, self.panel.opacity),
            _ => sink.hide(Overlay::Panel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CityPoint;
    use crate::map::{Palette, Projection, SceneStyle};

    struct Flat;

    impl Projection for Flat {
        fn project(&self, lon: f64, lat: f64) -> DVec2 {
            DVec2::new(lon, lat)
        }
    }

    /// Remembers the last thing shown on each overlay
    #[derive(Default)]
    struct Recorder {
        tooltip: Option<(String, Anchor, f64)>,
        panel: Option<(String, Anchor, f64)>,
        tooltip_shown: usize,
    }

    impl OverlaySink for Recorder {
        fn show_tooltip(&mut self, text: &str, anchor: Anchor, opacity: f64) {
            self.tooltip_shown += 1;
            self.tooltip = Some((text.to_string(), anchor, opacity));
        }

        fn show_panel(&mut self, text: &str, anchor: Anchor, opacity: f64) {
            self.panel = Some((text.to_string(), anchor, opacity));
        }

        fn hide(&mut self, overlay: Overlay) {
            match overlay {
                Overlay::Tooltip => self.tooltip = None,
                Overlay::Panel => self.panel = None,
            }
        }
    }

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    fn fixture() -> (InteractionController, Scene) {
        let controller =
            InteractionController::new(OverlayConfig::default(), ZoomConfig::default(), DVec2::new(900.0, 500.0));
        let mut scene = Scene::new(SceneStyle::default());
        scene
            .bind_points(
                &[
                    CityPoint::new("Yekaterinburg", 1493.0, Some("siberia".into()), 200.0, 300.0),
                    CityPoint::new("Moscow", 12_500.0, Some("europe".into()), 700.0, 300.0),
                ],
                &Flat,
                &Palette::default(),
            )
            .unwrap();
        (controller, scene)
    }

    #[test]
    fn test_hover_fades_in_after_delay() {
        let (mut c, scene) = fixture();
        let mut sink = Recorder::default();
        c.pointer_enter(0, &scene.points()[0], DVec2::new(200.0, 300.0), ms(0));
        assert_eq!(c.state_of(0), PointState::Hovered);

        c.tick(ms(100), &mut sink);
        assert_eq!(c.tooltip_opacity(), 0.0);
        assert!(sink.tooltip.is_none());

        c.tick(ms(250), &mut sink);
        let mid = c.tooltip_opacity();
        assert!(mid > 0.0 && mid < 1.0, "{mid}");

        c.tick(ms(400), &mut sink);
        assert_eq!(c.tooltip_opacity(), 1.0);
        assert_eq!(c.tooltip_text(), "1493 thousand people");
        let (text, anchor, opacity) = sink.tooltip.clone().unwrap();
        assert_eq!(text, "1493 thousand people");
        assert_eq!(anchor, Anchor { edge: Edge::Left, x: 200.0, y: 265.0 });
        assert_eq!(opacity, 1.0);
    }

    #[test]
    fn test_tooltip_flips_on_right_half() {
        let (mut c, scene) = fixture();
        let mut sink = Recorder::default();
        c.pointer_enter(1, &scene.points()[1], DVec2::new(700.0, 300.0), ms(0));
        c.tick(ms(1000), &mut sink);
        let (text, anchor, _) = sink.tooltip.unwrap();
        assert_eq!(text, "12500 thousand people");
        assert_eq!(anchor.edge, Edge::Right);
        assert_eq!(anchor.x, 700.0);
    }

    #[test]
    fn test_leave_before_delay_never_shows() {
        let (mut c, scene) = fixture();
        let mut sink = Recorder::default();
        c.pointer_enter(0, &scene.points()[0], DVec2::new(200.0, 300.0), ms(0));
        c.tick(ms(40), &mut sink);
        c.pointer_leave(0, ms(50));
        assert_eq!(c.state_of(0), PointState::Idle);

        for t in (50..=1000).step_by(10) {
            c.tick(ms(t), &mut sink);
            assert_eq!(c.tooltip_opacity(), 0.0, "at {t}ms");
        }
        assert_eq!(sink.tooltip_shown, 0);
    }

    #[test]
    fn test_hover_during_fade_out_ends_visible() {
        let (mut c, scene) = fixture();
        let mut sink = Recorder::default();
        c.pointer_enter(0, &scene.points()[0], DVec2::new(200.0, 300.0), ms(0));
        c.tick(ms(500), &mut sink);
        c.pointer_leave(0, ms(500));
        c.tick(ms(700), &mut sink);
        let fading = c.tooltip_opacity();
        assert!(fading < 1.0 && fading > 0.0, "{fading}");

        c.pointer_enter(0, &scene.points()[0], DVec2::new(200.0, 300.0), ms(700));
        // the fade-out keeps running through the new delay
        c.tick(ms(750), &mut sink);
        assert!(c.tooltip_opacity() < fading);

        c.tick(ms(1200), &mut sink);
        assert_eq!(c.tooltip_opacity(), 1.0);
        assert!(sink.tooltip.is_some());
    }

    #[test]
    fn test_stale_leave_is_ignored() {
        let (mut c, scene) = fixture();
        c.pointer_enter(1, &scene.points()[1], DVec2::new(700.0, 300.0), ms(0));
        c.pointer_leave(0, ms(10));
        assert_eq!(c.state_of(1), PointState::Hovered);
    }

    #[test]
    fn test_click_switches_panel_directly() {
        let (mut c, scene) = fixture();
        let mut sink = Recorder::default();
        c.click_point(0, &scene.points()[0], DVec2::new(200.0, 300.0), ms(0));
        c.tick(ms(500), &mut sink);
        let (text, anchor, _) = sink.panel.clone().unwrap();
        assert!(text.starts_with("Yekaterinburg\n"));
        assert_eq!(anchor, Anchor { edge: Edge::Right, x: 795.0, y: 15.0 });

        c.click_point(1, &scene.points()[1], DVec2::new(700.0, 300.0), ms(600));
        assert_eq!(c.state_of(0), PointState::Idle);
        assert_eq!(c.state_of(1), PointState::Selected);
        assert_eq!(c.selected(), Some(1));
        assert!(c.panel_text().starts_with("Moscow\n"));
        c.tick(ms(650), &mut sink);
        let (text, anchor, opacity) = sink.panel.clone().unwrap();
        assert!(text.starts_with("Moscow\n"));
        assert_eq!(anchor.edge, Edge::Left);
        assert_eq!(anchor.x, 15.0);
        assert_eq!(opacity, 1.0);
    }

    #[test]
    fn test_background_click_dismisses_panel() {
        let (mut c, scene) = fixture();
        let mut sink = Recorder::default();
        c.pointer_enter(0, &scene.points()[0], DVec2::new(200.0, 300.0), ms(0));
        c.click_point(0, &scene.points()[0], DVec2::new(200.0, 300.0), ms(0));
        assert_eq!(c.state_of(0), PointState::Selected);
        c.tick(ms(500), &mut sink);
        assert!(sink.panel.is_some());

        c.click_background(ms(500));
        assert_eq!(c.state_of(0), PointState::Hovered);
        c.tick(ms(550), &mut sink);
        assert!(sink.panel.is_some());
        c.tick(ms(1000), &mut sink);
        assert_eq!(c.panel_opacity(), 0.0);
        assert!(sink.panel.is_none());
    }

    #[test]
    fn test_zoom_round_trip_restores_scene() {
        let (mut c, mut scene) = fixture();
        let original: Vec<f64> = scene.points().iter().map(|p| p.radius).collect();
        let pointer = DVec2::new(300.0, 200.0);

        c.zoom_at(pointer, 4.0, &mut scene);
        assert_eq!(c.transform().k, 4.0);
        assert_eq!(scene.points()[1].radius, 10.0 / 4.0);

        c.zoom_at(pointer, 1.0 / 4.0, &mut scene);
        let t = c.transform();
        assert!((t.k - 1.0).abs() < 1e-12);
        assert!(t.translate.length() < 1e-9);
        for (p, r) in scene.points().iter().zip(original) {
            assert!((p.radius - r).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zoom_clamped_to_extent() {
        let (mut c, mut scene) = fixture();
        for _ in 0..10 {
            c.zoom_in_at(DVec2::new(450.0, 250.0), &mut scene);
        }
        assert_eq!(c.transform().k, 10.0);
        assert_eq!(scene.zoom_factor(), 10.0);
        c.zoom_out_at(DVec2::new(450.0, 250.0), &mut scene);
        c.zoom_at(DVec2::new(450.0, 250.0), 0.01, &mut scene);
        assert_eq!(c.transform().k, 1.0);
    }

    #[test]
    fn test_pan_keeps_zoom() {
        let (mut c, mut scene) = fixture();
        c.zoom_at(DVec2::new(450.0, 250.0), 2.0, &mut scene);
        c.pan(DVec2::new(-30.0, 12.0), &mut scene);
        assert_eq!(c.transform().k, 2.0);
        assert_eq!(scene.zoom_factor(), 2.0);
        c.reset_view(&mut scene);
        assert_eq!(c.transform(), ViewTransform::IDENTITY);
    }
}
