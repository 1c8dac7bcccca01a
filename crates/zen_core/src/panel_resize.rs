//! Drag-to-resize for the two-pane layout.

/// Lower bound (exclusive) for the editor pane width, in percent.
pub const MIN_PANEL_WIDTH_PERCENT: f32 = 25.0;
/// Upper bound (exclusive) for the editor pane width, in percent.
pub const MAX_PANEL_WIDTH_PERCENT: f32 = 75.0;
pub const DEFAULT_PANEL_WIDTH_PERCENT: f32 = 50.0;

/// Tracks a resize drag and the resulting editor pane width.
///
/// Moves are only honored between [`PanelResizer::begin_drag`] and
/// [`PanelResizer::end_drag`]. A move that would put the width outside the
/// open interval (25, 75) is ignored and the previous width is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelResizer {
    width_percent: f32,
    dragging: bool,
}

impl Default for PanelResizer {
    fn default() -> Self {
        Self::new(DEFAULT_PANEL_WIDTH_PERCENT)
    }
}

impl PanelResizer {
    pub fn new(width_percent: f32) -> Self {
        let width_percent = if is_allowed_width(width_percent) {
            width_percent
        } else {
            DEFAULT_PANEL_WIDTH_PERCENT
        };
        Self {
            width_percent,
            dragging: false,
        }
    }

    pub fn width_percent(&self) -> f32 {
        self.width_percent
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    /// Handle a pointer move at `cursor_x` within a viewport `viewport_width` wide.
    pub fn drag_to(&mut self, cursor_x: f32, viewport_width: f32) -> f32 {
        if !self.dragging || !(viewport_width > 0.0) {
            return self.width_percent;
        }
        let width_percent = cursor_x * 100.0 / viewport_width;
        if is_allowed_width(width_percent) {
            self.width_percent = width_percent;
        }
        self.width_percent
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }
}

fn is_allowed_width(width_percent: f32) -> bool {
    width_percent > MIN_PANEL_WIDTH_PERCENT && width_percent < MAX_PANEL_WIDTH_PERCENT
}
