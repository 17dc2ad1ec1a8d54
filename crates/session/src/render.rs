//! Rendering surface contract and the registry that maps layout identity
//! to the handles the surface hands out.

use std::collections::{BTreeMap, HashMap};

use shared::domain::{EdgeId, GeoPoint, HouseId};

use crate::status::{StatusMessage, StatusPanel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineStyle {
    Primary,
    FailedHighlight,
    Backup,
    SubstationLink,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: &'static str,
    pub weight: u8,
    pub opacity: f32,
    pub dash: Option<&'static str>,
}

impl LineStyle {
    pub fn stroke(self) -> Stroke {
        match self {
            Self::Primary => Stroke {
                color: "blue",
                weight: 4,
                opacity: 0.8,
                dash: None,
            },
            Self::FailedHighlight => Stroke {
                color: "red",
                weight: 6,
                opacity: 0.8,
                dash: None,
            },
            Self::Backup => Stroke {
                color: "#9400D3",
                weight: 3,
                opacity: 0.8,
                dash: Some("10,5"),
            },
            Self::SubstationLink => Stroke {
                color: "green",
                weight: 5,
                opacity: 1.0,
                dash: Some("6,6"),
            },
        }
    }
}

/// Drawing primitives the controller needs from a map widget.
///
/// Map clicks, marker drags and line clicks travel the other way: the host
/// turns them into [`crate::UserAction`]s and hands them to the controller.
/// Lines only produce click actions after [`RenderSurface::enable_line_click`].
pub trait RenderSurface {
    fn place_marker(&mut self, at: GeoPoint, label: &str, draggable: bool) -> MarkerHandle;
    fn remove_marker(&mut self, handle: MarkerHandle);
    fn draw_line(&mut self, from: GeoPoint, to: GeoPoint, style: LineStyle) -> LineHandle;
    fn set_line_style(&mut self, handle: LineHandle, style: LineStyle);
    fn remove_line(&mut self, handle: LineHandle);
    fn enable_line_click(&mut self, handle: LineHandle);
    fn bind_popup(&mut self, handle: LineHandle, text: &str, open: bool);
    fn show_panel(&mut self, panel: StatusPanel, message: &StatusMessage);
    fn hide_panel(&mut self, panel: StatusPanel);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayState {
    Normal,
    HighlightedFailed,
    Backup,
}

/// Which layout a rendered line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderLane {
    Primary,
    Backup,
}

#[derive(Debug, Clone, Copy)]
struct RenderedLine {
    lane: RenderLane,
    edge: Option<EdgeId>,
    display: DisplayState,
}

#[derive(Debug, Default)]
pub struct RenderRegistry {
    lines: BTreeMap<LineHandle, RenderedLine>,
    tree_edges: HashMap<EdgeId, LineHandle>,
    failed: Option<LineHandle>,
    house_markers: HashMap<HouseId, MarkerHandle>,
    marker_houses: HashMap<MarkerHandle, HouseId>,
    substation_markers: Vec<MarkerHandle>,
}

impl RenderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_tree_edge(&mut self, edge: EdgeId, handle: LineHandle) {
        self.lines.insert(
            handle,
            RenderedLine {
                lane: RenderLane::Primary,
                edge: Some(edge),
                display: DisplayState::Normal,
            },
        );
        self.tree_edges.insert(edge, handle);
    }

    pub fn register_substation_link(&mut self, handle: LineHandle) {
        self.lines.insert(
            handle,
            RenderedLine {
                lane: RenderLane::Primary,
                edge: None,
                display: DisplayState::Normal,
            },
        );
    }

    pub fn register_backup_edge(&mut self, handle: LineHandle) {
        self.lines.insert(
            handle,
            RenderedLine {
                lane: RenderLane::Backup,
                edge: None,
                display: DisplayState::Backup,
            },
        );
    }

    pub fn edge_for_line(&self, handle: LineHandle) -> Option<EdgeId> {
        self.lines.get(&handle).and_then(|line| line.edge)
    }

    pub fn line_for_edge(&self, edge: EdgeId) -> Option<LineHandle> {
        self.tree_edges.get(&edge).copied()
    }

    pub fn display_state(&self, handle: LineHandle) -> Option<DisplayState> {
        self.lines.get(&handle).map(|line| line.display)
    }

    pub fn failed_line(&self) -> Option<LineHandle> {
        self.failed
    }

    /// Highlights `handle` as the failed edge and returns the line that held
    /// the highlight before, which is back to normal now.
    pub fn set_failed(&mut self, handle: LineHandle) -> Option<LineHandle> {
        let previous = self.clear_failed().filter(|previous| *previous != handle);
        if let Some(line) = self.lines.get_mut(&handle) {
            line.display = DisplayState::HighlightedFailed;
            self.failed = Some(handle);
        }
        previous
    }

    pub fn clear_failed(&mut self) -> Option<LineHandle> {
        let previous = self.failed.take()?;
        if let Some(line) = self.lines.get_mut(&previous) {
            line.display = DisplayState::Normal;
        }
        Some(previous)
    }

    pub fn highlighted_count(&self) -> usize {
        self.lines
            .values()
            .filter(|line| line.display == DisplayState::HighlightedFailed)
            .count()
    }

    pub fn line_count(&self, lane: RenderLane) -> usize {
        self.lines.values().filter(|line| line.lane == lane).count()
    }

    /// Forgets every line of `lane` and returns their handles for removal.
    pub fn drain_lane(&mut self, lane: RenderLane) -> Vec<LineHandle> {
        let handles: Vec<LineHandle> = self
            .lines
            .iter()
            .filter(|(_, line)| line.lane == lane)
            .map(|(handle, _)| *handle)
            .collect();
        for handle in &handles {
            if let Some(line) = self.lines.remove(handle) {
                if let Some(edge) = line.edge {
                    self.tree_edges.remove(&edge);
                }
            }
            if self.failed == Some(*handle) {
                self.failed = None;
            }
        }
        handles
    }

    pub fn register_house(&mut self, house: HouseId, marker: MarkerHandle) {
        self.house_markers.insert(house, marker);
        self.marker_houses.insert(marker, house);
    }

    pub fn house_for_marker(&self, marker: MarkerHandle) -> Option<HouseId> {
        self.marker_houses.get(&marker).copied()
    }

    pub fn marker_for_house(&self, house: HouseId) -> Option<MarkerHandle> {
        self.house_markers.get(&house).copied()
    }

    pub fn drain_house_markers(&mut self) -> Vec<MarkerHandle> {
        self.marker_houses.clear();
        let mut markers: Vec<MarkerHandle> = self.house_markers.drain().map(|(_, m)| m).collect();
        markers.sort();
        markers
    }

    pub fn register_substation(&mut self, marker: MarkerHandle) {
        self.substation_markers.push(marker);
    }

    pub fn substation_markers(&self) -> &[MarkerHandle] {
        &self.substation_markers
    }
}
