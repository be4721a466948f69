use ratatui::layout::Rect;

use crate::pointer::{
    CursorStyle, Listener, PointerHub, PointerStyle, StyleOverride, Subscription,
};

pub const DEFAULT_PERCENT: u16 = 50;
pub const MIN_PERCENT: u16 = 25;
pub const MAX_PERCENT: u16 = 75;

/// Resources held for the duration of one divider drag.
#[derive(Debug)]
pub struct DragSession {
    _move: Subscription,
    _release: Subscription,
    _style: StyleOverride,
}

impl DragSession {
    fn begin(hub: &PointerHub) -> Self {
        Self {
            _move: hub.subscribe(Listener::DragMove),
            _release: hub.subscribe(Listener::DragRelease),
            _style: hub.override_style(PointerStyle {
                cursor: CursorStyle::ColumnResize,
                text_selection: false,
            }),
        }
    }
}

/// Width of the passage pane as a percentage of the test view.
#[derive(Debug)]
pub struct SplitController {
    percent: u16,
    drag: Option<DragSession>,
}

impl Default for SplitController {
    fn default() -> Self {
        Self {
            percent: DEFAULT_PERCENT,
            drag: None,
        }
    }
}

impl SplitController {
    pub fn percent(&self) -> u16 {
        self.percent
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Start a drag if `column` is on the divider of `container`.
    pub fn press(&mut self, hub: &PointerHub, column: u16, row: u16, container: Rect) -> bool {
        let (_, divider, _) = self.split(container);
        let on_divider = column >= divider.x
            && column < divider.x + divider.width
            && row >= divider.y
            && row < divider.y + divider.height;
        if on_divider {
            // Release a drag whose Up event was lost before acquiring again.
            self.drag = None;
            self.drag = Some(DragSession::begin(hub));
        }
        on_divider
    }

    pub fn drag_to(&mut self, column: u16, container: Rect) {
        if self.drag.is_none() || container.width == 0 {
            return;
        }
        let relative = column.saturating_sub(container.x) as u32;
        let percent = (relative * 100 / container.width as u32).min(u16::MAX as u32) as u16;
        self.percent = percent.clamp(MIN_PERCENT, MAX_PERCENT);
    }

    /// Finish the drag, whether by release or by losing the pointer.
    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn reset(&mut self) {
        self.end_drag();
        self.percent = DEFAULT_PERCENT;
    }

    /// Keyboard nudge, kept inside the same bounds as a drag.
    pub fn nudge(&mut self, delta: i16) {
        let next = (self.percent as i16 + delta).clamp(MIN_PERCENT as i16, MAX_PERCENT as i16);
        self.percent = next as u16;
    }

    /// `(left pane, divider column, right pane)`.
    pub fn split(&self, area: Rect) -> (Rect, Rect, Rect) {
        let left_width = (area.width as u32 * self.percent as u32 / 100) as u16;
        let left_width = left_width.min(area.width.saturating_sub(1));
        let left = Rect::new(area.x, area.y, left_width, area.height);
        let divider_width = if area.width > left_width { 1 } else { 0 };
        let divider = Rect::new(area.x + left_width, area.y, divider_width, area.height);
        let right_x = divider.x + divider.width;
        let right = Rect::new(
            right_x,
            area.y,
            area.width.saturating_sub(left_width + divider_width),
            area.height,
        );
        (left, divider, right)
    }
}
