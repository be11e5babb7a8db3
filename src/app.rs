use crate::ui::OverlayViews;
use citymap::config::Config;
use citymap::data::{self, BoundaryFeature, CityPoint, LayerLoad, Loaded};
use citymap::error::LoadError;
use citymap::interaction::InteractionController;
use citymap::map::{CanvasFit, ConicEqualArea, Scene};
use crossbeam_channel::{Receiver, TryRecvError};
use glam::DVec2;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Application state
pub struct App {
    pub config: Config,
    projection: ConicEqualArea,
    pub scene: Scene,
    pub controller: InteractionController,
    /// What the overlays currently look like, refreshed every tick
    pub overlays: OverlayViews,
    /// Map area inside the border, in cells
    map_width: u16,
    map_height: u16,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Set once the pointer moved while the button was down
    dragged: bool,
    /// Name of the topmost boundary under the pointer
    pub hovered_title: Option<String>,
    /// Results of the loads in flight, `None` once both arrived
    loads: Option<Receiver<LayerLoad>>,
    /// Last load problem per layer, shown in the status bar
    boundary_notice: Option<String>,
    city_notice: Option<String>,
    started: Instant,
}

impl App {
    pub fn new(config: Config, width: u16, height: u16) -> Self {
        let canvas = config.canvas.size();
        let projection = ConicEqualArea::new(&config.projection, canvas);
        let scene = Scene::new(config.style.clone());
        let controller = InteractionController::new(config.overlay.clone(), config.zoom.clone(), canvas);
        let mut app = Self {
            config,
            projection,
            scene,
            controller,
            overlays: OverlayViews::default(),
            map_width: 0,
            map_height: 0,
            should_quit: false,
            last_mouse: None,
            dragged: false,
            hovered_title: None,
            loads: None,
            boundary_notice: None,
            city_notice: None,
            started: Instant::now(),
        };
        app.resize(width, height);
        app
    }

    fn now(&self) -> Duration {
        self.started.elapsed()
    }

    /// Update map size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        // 2 for border, 1 for status bar
        self.map_width = width.saturating_sub(2);
        self.map_height = height.saturating_sub(3);
    }

    /// Fit of the logical canvas into the current map area
    pub fn fit(&self) -> CanvasFit {
        CanvasFit::new(
            self.config.canvas.size(),
            DVec2::new(self.map_width as f64 * 2.0, self.map_height as f64 * 4.0),
        )
    }

    /// Start loading both datasets in the background. Each layer is rebound
    /// by `tick` as soon as its own data arrives.
    pub fn load_layers(&mut self) {
        let paths = &self.config.data;
        self.boundary_notice = None;
        self.city_notice = None;
        self.loads = Some(data::spawn_loads(
            paths.boundaries.clone(),
            paths.cities.clone(),
            self.config.levels.clone(),
        ));
    }

    /// Bind whatever load results have arrived, without blocking
    fn poll_loads(&mut self) {
        let Some(rx) = self.loads.take() else {
            return;
        };
        loop {
            match rx.try_recv() {
                Ok(LayerLoad::Boundaries(result)) => self.bind_boundaries(result),
                Ok(LayerLoad::Cities(result)) => self.bind_cities(result),
                Err(TryRecvError::Empty) => {
                    self.loads = Some(rx);
                    return;
                }
                Err(TryRecvError::Disconnected) => break,
            }
        }
        info!(
            boundaries = self.scene.boundaries().len(),
            points = self.scene.points().len(),
            "layers bound"
        );
    }

    fn bind_boundaries(&mut self, result: Result<Loaded<BoundaryFeature>, LoadError>) {
        self.boundary_notice = match result {
            Ok(loaded) => {
                self.scene.bind_boundaries(&loaded.records, &self.projection);
                self.hovered_title = None;
                (!loaded.rejected.is_empty()).then(|| format!("{} boundary features skipped", loaded.rejected.len()))
            }
            Err(e) => {
                error!(path = %self.config.data.boundaries.display(), error = %e, "boundary layer not loaded");
                Some(format!("boundaries: {e}"))
            }
        };
    }

    fn bind_cities(&mut self, result: Result<Loaded<CityPoint>, LoadError>) {
        self.city_notice = match result {
            Ok(loaded) => {
                let now = self.now();
                self.controller.clear_points(now);
                match self.scene.bind_points(&loaded.records, &self.projection, &self.config.palette) {
                    Err(e) => {
                        error!(error = %e, "point layer not bound");
                        Some(format!("cities: {e}"))
                    }
                    Ok(()) => {
                        (!loaded.rejected.is_empty()).then(|| format!("{} city rows skipped", loaded.rejected.len()))
                    }
                }
            }
            Err(e) => {
                error!(path = %self.config.data.cities.display(), error = %e, "point layer not loaded");
                Some(format!("cities: {e}"))
            }
        };
    }

    /// Load state and problems of both layers, for the status bar
    pub fn notice(&self) -> Option<String> {
        let mut parts: Vec<&str> = Vec::new();
        if self.loads.is_some() {
            parts.push("loading");
        }
        parts.extend(self.boundary_notice.as_deref());
        parts.extend(self.city_notice.as_deref());
        if parts.is_empty() && self.scene.is_empty() {
            parts.push("no data to draw");
        }
        (!parts.is_empty()).then(|| parts.join(" | "))
    }

    /// Terminal position to logical screen coordinates, `None` outside the map
    fn screen_point(&self, col: u16, row: u16) -> Option<DVec2> {
        let (col, row) = (col.checked_sub(1)?, row.checked_sub(1)?);
        if col >= self.map_width || row >= self.map_height {
            return None;
        }
        Some(self.fit().from_cell(col, row))
    }

    /// Hit slack of one cell, in logical screen units
    fn slack(&self) -> f64 {
        2.0 / self.fit().scale
    }

    /// Track hover state for points and boundaries
    pub fn pointer_moved(&mut self, col: u16, row: u16) {
        let now = self.now();
        let Some(pointer) = self.screen_point(col, row) else {
            if let Some(index) = self.controller.hovered() {
                self.controller.pointer_leave(index, now);
            }
            self.hovered_title = None;
            return;
        };
        let p = self.controller.transform().invert(pointer);
        let hit = self.scene.point_at(p, self.slack());
        let hovered = self.controller.hovered();
        if hit != hovered {
            if let Some(index) = hovered {
                self.controller.pointer_leave(index, now);
            }
            if let Some(index) = hit {
                self.controller.pointer_enter(index, &self.scene.points()[index], pointer, now);
            }
        }
        self.hovered_title = self
            .scene
            .boundary_at(p)
            .map(|b| b.title.clone())
            .filter(|t| !t.is_empty());
    }

    pub fn press(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Handle mouse drag: pan by the cell delta
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_col, last_row)) = self.last_mouse {
            let dx = col as i32 - last_col as i32;
            let dy = row as i32 - last_row as i32;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                self.pan_cells(dx, dy);
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// Button released: a release without drag is a click
    pub fn release(&mut self, col: u16, row: u16) {
        let was_click = self.last_mouse.is_some() && !self.dragged;
        self.last_mouse = None;
        self.dragged = false;
        if was_click {
            self.click(col, row);
        }
    }

    fn click(&mut self, col: u16, row: u16) {
        let now = self.now();
        let Some(pointer) = self.screen_point(col, row) else {
            return;
        };
        let p = self.controller.transform().invert(pointer);
        match self.scene.point_at(p, self.slack()) {
            Some(index) => self.controller.click_point(index, &self.scene.points()[index], pointer, now),
            None => self.controller.click_background(now),
        }
    }

    pub fn dismiss_panel(&mut self) {
        let now = self.now();
        self.controller.click_background(now);
    }

    /// Pan the map by whole cells
    pub fn pan_cells(&mut self, dx: i32, dy: i32) {
        let scale = self.fit().scale;
        let delta = DVec2::new(dx as f64 * 2.0, dy as f64 * 4.0) / scale;
        self.controller.pan(delta, &mut self.scene);
    }

    fn canvas_center(&self) -> DVec2 {
        self.config.canvas.size() / 2.0
    }

    pub fn zoom_in(&mut self) {
        let center = self.canvas_center();
        self.controller.zoom_in_at(center, &mut self.scene);
    }

    pub fn zoom_out(&mut self) {
        let center = self.canvas_center();
        self.controller.zoom_out_at(center, &mut self.scene);
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some(pointer) = self.screen_point(col, row) {
            self.controller.zoom_in_at(pointer, &mut self.scene);
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some(pointer) = self.screen_point(col, row) {
            self.controller.zoom_out_at(pointer, &mut self.scene);
        }
    }

    pub fn reset_view(&mut self) {
        self.controller.reset_view(&mut self.scene);
    }

    /// Bind arrived layers and advance overlay fades
    pub fn tick(&mut self) {
        self.poll_loads();
        let now = self.now();
        self.controller.tick(now, &mut self.overlays);
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Current zoom factor as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.2}x", self.controller.transform().k)
    }
}
