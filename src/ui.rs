use crate::app::App;
use citymap::braille::BrailleCanvas;
use citymap::interaction::{Anchor, Edge, Overlay, OverlaySink};
use citymap::map::{render as render_layers, CanvasFit, Level, MapLayers, Rgb};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

const PANEL_WIDTH: u16 = 36;
const PANEL_HEIGHT: u16 = 8;

/// Last state pushed for one overlay
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayView {
    pub text: String,
    pub anchor: Anchor,
    pub opacity: f64,
}

/// Terminal side of the overlays: remembers what the controller shows
#[derive(Debug, Default)]
pub struct OverlayViews {
    pub tooltip: Option<OverlayView>,
    pub panel: Option<OverlayView>,
}

impl OverlaySink for OverlayViews {
    fn show_tooltip(&mut self, text: &str, anchor: Anchor, opacity: f64) {
        self.tooltip = Some(OverlayView {
            text: text.to_string(),
            anchor,
            opacity,
        });
    }

    fn show_panel(&mut self, text: &str, anchor: Anchor, opacity: f64) {
        self.panel = Some(OverlayView {
            text: text.to_string(),
            anchor,
            opacity,
        });
    }

    fn hide(&mut self, overlay: Overlay) {
        match overlay {
            Overlay::Tooltip => self.tooltip = None,
            Overlay::Panel => self.panel = None,
        }
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Terminals have no alpha, so fades step through grey levels
fn faded(opacity: f64) -> Color {
    match opacity {
        o if o < 0.35 => Color::DarkGray,
        o if o < 0.75 => Color::Gray,
        _ => Color::White,
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Million-plus cities ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let fit = app.fit();
    let layers = render_layers(
        &app.scene,
        &app.controller.transform(),
        &fit,
        inner.width as usize,
        inner.height as usize,
    );
    frame.render_widget(MapWidget { layers }, inner);

    render_legend(frame, app, inner);
    if let Some(panel) = &app.overlays.panel {
        render_panel(frame, panel, &fit, inner);
    }
    if let Some(tooltip) = &app.overlays.tooltip {
        render_tooltip(frame, tooltip, &fit, inner);
    }
}

/// Braille map with text labels overlaid
struct MapWidget {
    layers: MapLayers,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        let (width, height) = canvas.size();
        for row in 0..height.min(area.height as usize) {
            for col in 0..width.min(area.width as usize) {
                if let Some(ch) = canvas.glyph(col, row) {
                    buf[(area.x + col as u16, area.y + row as u16)].set_char(ch).set_fg(color);
                }
            }
        }
    }

    fn level_color(level: Level) -> Color {
        match level {
            Level::Country => Color::White,
            Level::District => Color::Gray,
            Level::Region => Color::DarkGray,
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // finest boundaries at the back
        for level in Level::ALL.into_iter().rev() {
            Self::render_layer(self.layers.level(level), Self::level_color(level), area, buf);
        }

        for (fill, canvas) in &self.layers.markers {
            let fill = fill.map_or(Color::Reset, color);
            Self::render_layer(canvas, fill, area, buf);
        }

        let label_style = Style::default().fg(Color::White);
        for label in &self.layers.labels {
            let max_len = area.width.saturating_sub(label.col) as usize;
            let y = area.y + label.row;
            for (i, ch) in label.text.chars().take(max_len).enumerate() {
                buf[(area.x + label.col + i as u16, y)].set_char(ch).set_style(label_style);
            }
        }
    }
}

/// Place a box of `width` x `height` cells at an anchor, kept inside `area`
fn anchored_rect(anchor: &Anchor, fit: &CanvasFit, width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let (col, row) = fit.to_cell(glam::DVec2::new(anchor.x, anchor.y));
    let left = match anchor.edge {
        Edge::Left => col,
        Edge::Right => col - width as i32,
    };
    let max_x = (area.width - width) as i32;
    let max_y = (area.height - height) as i32;
    Rect {
        x: area.x + left.clamp(0, max_x) as u16,
        y: area.y + row.clamp(0, max_y) as u16,
        width,
        height,
    }
}

fn render_tooltip(frame: &mut Frame, tooltip: &OverlayView, fit: &CanvasFit, area: Rect) {
    let width = tooltip.text.chars().count() as u16 + 2;
    let rect = anchored_rect(&tooltip.anchor, fit, width, 1, area);
    let style = Style::default().fg(Color::Black).bg(faded(tooltip.opacity));
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(format!(" {} ", tooltip.text)).style(style), rect);
}

fn render_panel(frame: &mut Frame, panel: &OverlayView, fit: &CanvasFit, area: Rect) {
    let rect = anchored_rect(&panel.anchor, fit, PANEL_WIDTH, PANEL_HEIGHT, area);
    let fg = faded(panel.opacity);
    let mut lines = panel.text.lines();
    let mut text = vec![Line::from(Span::styled(
        lines.next().unwrap_or_default().to_string(),
        Style::default().fg(fg).add_modifier(Modifier::BOLD),
    ))];
    text.extend(lines.map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(fg)))));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(fg));
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }).block(block), rect);
}

fn render_legend(frame: &mut Frame, app: &App, area: Rect) {
    let legend = &app.config.legend;
    let width = legend.label.chars().count() as u16 + 6;
    if area.height < 3 || area.width < width {
        return;
    }
    let rect = Rect {
        x: area.x,
        y: area.y + area.height - 3,
        width,
        height: 3,
    };
    let marker = app.config.palette.get(&legend.group).map_or(Color::Reset, color);
    let line = Line::from(vec![
        Span::styled("● ", Style::default().fg(marker)),
        Span::styled(legend.label.as_str(), Style::default().fg(Color::Gray)),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(line).block(block), rect);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
    ];
    if let Some(title) = &app.hovered_title {
        spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(title.as_str(), Style::default().fg(Color::Cyan)));
    }
    if let Some(notice) = app.notice() {
        spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(notice, Style::default().fg(Color::Red)));
    }
    spans.push(Span::styled(
        " | hjkl:pan +/-:zoom 0:reset esc:close r:reload q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
