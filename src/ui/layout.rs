use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::Block;

use crate::ui::split::SplitController;

pub struct AppLayout {
    pub header: Rect,
    pub main: Rect,
    pub footer: Rect,
}

impl AppLayout {
    pub fn new(area: Rect) -> Self {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(6),
                Constraint::Length(1),
            ])
            .split(area);

        Self {
            header: vertical[0],
            main: vertical[1],
            footer: vertical[2],
        }
    }
}

/// Rectangles of the test view. Rendering and pointer hit testing both go
/// through this, so a click always lands on what was drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TestLayout {
    pub header: Rect,
    pub body: Rect,
    pub passage: Rect,
    pub divider: Rect,
    pub questions: Rect,
    pub answers: Rect,
    pub footer: Rect,
}

impl TestLayout {
    pub const ANSWER_HEIGHT: u16 = 7;

    pub fn new(area: Rect, split: &SplitController) -> Self {
        let app = AppLayout::new(area);
        let (passage, divider, right) = split.split(app.main);
        let answer_height = Self::ANSWER_HEIGHT.min(right.height / 2);
        let right_parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(answer_height)])
            .split(right);

        Self {
            header: app.header,
            body: app.main,
            passage,
            divider,
            questions: right_parts[0],
            answers: right_parts[1],
            footer: app.footer,
        }
    }

    pub fn passage_text(&self) -> Rect {
        pane_inner(self.passage)
    }

    pub fn question_text(&self) -> Rect {
        pane_inner(self.questions)
    }
}

/// Content area of a bordered pane.
pub fn pane_inner(area: Rect) -> Rect {
    Block::bordered().inner(area)
}

pub fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height
}

pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    if width == 0 || hints.is_empty() {
        return Vec::new();
    }

    let prefix = " ";
    let separator = "  ";
    let mut out: Vec<String> = Vec::new();
    let mut current = prefix.to_string();
    let mut has_hint = false;

    for hint in hints {
        if hint.is_empty() {
            continue;
        }
        let candidate = if has_hint {
            format!("{current}{separator}{hint}")
        } else {
            format!("{current}{hint}")
        };
        if candidate.chars().count() <= width {
            current = candidate;
            has_hint = true;
        } else {
            if has_hint {
                out.push(current);
            }
            current = format!("{prefix}{hint}");
            has_hint = true;
        }
    }

    if has_hint {
        out.push(current);
    }
    out
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    const MIN_POPUP_WIDTH: u16 = 48;
    const MIN_POPUP_HEIGHT: u16 = 14;

    let requested_w = area.width.saturating_mul(percent_x.min(100)) / 100;
    let requested_h = area.height.saturating_mul(percent_y.min(100)) / 100;

    let target_w = requested_w.max(MIN_POPUP_WIDTH).min(area.width);
    let target_h = requested_h.max(MIN_POPUP_HEIGHT).min(area.height);

    let left = area
        .x
        .saturating_add((area.width.saturating_sub(target_w)) / 2);
    let top = area
        .y
        .saturating_add((area.height.saturating_sub(target_h)) / 2);

    Rect::new(left, top, target_w, target_h)
}
