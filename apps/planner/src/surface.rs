use std::collections::{BTreeMap, HashMap};

use session::{LineHandle, LineStyle, MarkerHandle, RenderSurface, StatusMessage, StatusPanel};
use shared::domain::GeoPoint;
use tracing::{debug, info};

/// Rendering surface that only logs what a map would draw, keeping the
/// latest text of each status panel for printing.
#[derive(Debug, Default)]
pub struct LogSurface {
    next_handle: u64,
    lines: BTreeMap<LineHandle, LineStyle>,
    panels: HashMap<StatusPanel, StatusMessage>,
}

impl LogSurface {
    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    pub fn panel(&self, panel: StatusPanel) -> Option<&StatusMessage> {
        self.panels.get(&panel)
    }

    pub fn line_count(&self, style: LineStyle) -> usize {
        self.lines.values().filter(|s| **s == style).count()
    }
}

impl RenderSurface for LogSurface {
    fn place_marker(&mut self, at: GeoPoint, label: &str, draggable: bool) -> MarkerHandle {
        let handle = MarkerHandle(self.allocate());
        debug!(marker = handle.0, %at, label, draggable, "marker placed");
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        debug!(marker = handle.0, "marker removed");
    }

    fn draw_line(&mut self, from: GeoPoint, to: GeoPoint, style: LineStyle) -> LineHandle {
        let handle = LineHandle(self.allocate());
        self.lines.insert(handle, style);
        let stroke = style.stroke();
        info!(line = handle.0, %from, %to, color = stroke.color, "line drawn");
        handle
    }

    fn set_line_style(&mut self, handle: LineHandle, style: LineStyle) {
        if let Some(current) = self.lines.get_mut(&handle) {
            *current = style;
        }
        info!(line = handle.0, color = style.stroke().color, "line restyled");
    }

    fn remove_line(&mut self, handle: LineHandle) {
        self.lines.remove(&handle);
        debug!(line = handle.0, "line removed");
    }

    fn enable_line_click(&mut self, handle: LineHandle) {
        debug!(line = handle.0, "line clickable");
    }

    fn bind_popup(&mut self, handle: LineHandle, text: &str, open: bool) {
        debug!(line = handle.0, open, text, "popup bound");
    }

    fn show_panel(&mut self, panel: StatusPanel, message: &StatusMessage) {
        info!(?panel, title = %message.title, "status");
        self.panels.insert(panel, message.clone());
    }

    fn hide_panel(&mut self, panel: StatusPanel) {
        self.panels.remove(&panel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restyling_tracks_the_current_style() {
        let mut surface = LogSurface::default();
        let a = GeoPoint::new(30.10, 78.10);
        let b = GeoPoint::new(30.11, 78.10);
        let line = surface.draw_line(a, b, LineStyle::Primary);
        surface.draw_line(a, b, LineStyle::Primary);
        surface.set_line_style(line, LineStyle::FailedHighlight);

        assert_eq!(surface.line_count(LineStyle::Primary), 1);
        assert_eq!(surface.line_count(LineStyle::FailedHighlight), 1);
        surface.remove_line(line);
        assert_eq!(surface.line_count(LineStyle::FailedHighlight), 0);
    }

    #[test]
    fn hidden_panels_are_forgotten() {
        let mut surface = LogSurface::default();
        surface.show_panel(StatusPanel::Results, &StatusMessage::computing());
        assert!(surface.panel(StatusPanel::Results).is_some());
        surface.hide_panel(StatusPanel::Results);
        assert!(surface.panel(StatusPanel::Results).is_none());
    }

    #[test]
    fn handles_are_unique_across_markers_and_lines() {
        let mut surface = LogSurface::default();
        let at = GeoPoint::new(30.0, 78.0);
        let marker = surface.place_marker(at, "1", true);
        let line = surface.draw_line(at, at, LineStyle::Backup);
        assert_ne!(marker.0, line.0);
    }
}
