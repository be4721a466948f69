//! Word wrapping that remembers char offsets, so a screen cell can be mapped
//! back to a position in the source text.

use ratatui::layout::Rect;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WrappedLine {
    /// First char of the line.
    pub start: usize,
    /// One past the last char shown on the line.
    pub end: usize,
}

#[derive(Clone, Debug)]
pub struct WrappedText {
    chars: Vec<char>,
    lines: Vec<WrappedLine>,
}

impl WrappedText {
    pub fn new(text: &str, width: u16) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let lines = wrap_lines(&chars, width as usize);
        Self { chars, lines }
    }

    pub fn lines(&self) -> &[WrappedLine] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn char_count(&self) -> usize {
        self.chars.len()
    }

    pub fn line_chars(&self, line: &WrappedLine) -> &[char] {
        &self.chars[line.start..line.end]
    }

    /// Char offset under a cell of `area`, with `scroll` lines hidden above it.
    /// Points past the end of a line snap to the line end; rows past the last
    /// line snap to the end of the text.
    pub fn offset_at(&self, area: Rect, scroll: u16, column: u16, row: u16) -> Option<usize> {
        if column < area.x
            || column >= area.x + area.width
            || row < area.y
            || row >= area.y + area.height
        {
            return None;
        }
        let index = (row - area.y) as usize + scroll as usize;
        let Some(line) = self.lines.get(index) else {
            return Some(self.chars.len());
        };
        let col = (column - area.x) as usize;
        Some((line.start + col).min(line.end))
    }

    /// Like `offset_at`, but clamps the point into `area` first. Used while a
    /// selection is being dragged past the pane edge.
    pub fn offset_clamped(&self, area: Rect, scroll: u16, column: u16, row: u16) -> Option<usize> {
        if area.width == 0 || area.height == 0 {
            return None;
        }
        let column = column.clamp(area.x, area.x + area.width - 1);
        let row = row.clamp(area.y, area.y + area.height - 1);
        self.offset_at(area, scroll, column, row)
    }
}

fn wrap_lines(chars: &[char], width: usize) -> Vec<WrappedLine> {
    if width == 0 {
        return Vec::new();
    }
    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut last_break: Option<usize> = None;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch == '\n' {
            lines.push(WrappedLine { start: line_start, end: i });
            line_start = i + 1;
            last_break = None;
            i += 1;
            continue;
        }
        if i - line_start >= width {
            let end = match last_break {
                Some(b) if b > line_start => b,
                _ => i,
            };
            lines.push(WrappedLine { start: line_start, end });
            line_start = end;
            last_break = None;
            i = end;
            continue;
        }
        if ch == ' ' {
            last_break = Some(i + 1);
        }
        i += 1;
    }
    lines.push(WrappedLine {
        start: line_start,
        end: chars.len(),
    });
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(text: &WrappedText) -> Vec<String> {
        text.lines()
            .iter()
            .map(|l| text.line_chars(l).iter().collect())
            .collect()
    }

    #[test]
    fn test_wraps_at_spaces() {
        let text = WrappedText::new("the quick brown fox", 10);
        assert_eq!(rendered(&text), vec!["the quick ", "brown fox"]);
    }

    #[test]
    fn test_long_word_is_hard_broken() {
        let text = WrappedText::new("abcdefghij", 4);
        assert_eq!(rendered(&text), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_newlines_start_new_lines() {
        let text = WrappedText::new("one\n\ntwo", 20);
        assert_eq!(rendered(&text), vec!["one", "", "two"]);
    }

    #[test]
    fn test_lines_cover_every_visible_char() {
        let source = "Honeybees are managed livestock in many cities.";
        let text = WrappedText::new(source, 12);
        let joined: String = rendered(&text).concat();
        assert_eq!(joined, source);
        for line in text.lines() {
            assert!(line.end - line.start <= 12);
        }
    }

    #[test]
    fn test_offset_at_maps_cells() {
        let text = WrappedText::new("the quick brown fox", 10);
        let area = Rect::new(5, 2, 10, 4);
        assert_eq!(text.offset_at(area, 0, 5, 2), Some(0));
        assert_eq!(text.offset_at(area, 0, 9, 2), Some(4));
        assert_eq!(text.offset_at(area, 0, 5, 3), Some(10));
        // Past the end of the second line snaps to its end.
        assert_eq!(text.offset_at(area, 0, 14, 3), Some(19));
        // Below the text snaps to the very end.
        assert_eq!(text.offset_at(area, 0, 6, 5), Some(19));
        assert_eq!(text.offset_at(area, 0, 4, 2), None);
    }

    #[test]
    fn test_offset_respects_scroll() {
        let text = WrappedText::new("the quick brown fox", 10);
        let area = Rect::new(0, 0, 10, 1);
        assert_eq!(text.offset_at(area, 1, 0, 0), Some(10));
    }

    #[test]
    fn test_offset_clamped_pulls_point_inside() {
        let text = WrappedText::new("the quick brown fox", 10);
        let area = Rect::new(5, 2, 10, 4);
        assert_eq!(text.offset_clamped(area, 0, 0, 0), Some(0));
    }

    #[test]
    fn test_zero_width_has_no_lines() {
        let text = WrappedText::new("abc", 0);
        assert_eq!(text.line_count(), 0);
    }
}
