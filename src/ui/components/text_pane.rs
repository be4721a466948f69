use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::ui::theme::Theme;
use crate::ui::wrap::WrappedText;

/// Bordered pane showing wrapped text with highlighted and selected spans.
///
/// Wrapping is done by [`WrappedText`] rather than by `Paragraph`, so the
/// cells drawn here are the same cells pointer hit testing maps back to text.
pub struct TextPane<'a> {
    title: String,
    text: &'a str,
    highlights: Vec<bool>,
    selection: Option<(usize, usize)>,
    scroll: u16,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> TextPane<'a> {
    pub fn new(title: &str, text: &'a str, theme: &'a Theme) -> Self {
        Self {
            title: title.to_string(),
            text,
            highlights: Vec::new(),
            selection: None,
            scroll: 0,
            focused: false,
            theme,
        }
    }

    /// Per-char highlight flags, as produced by `AnnotationSet::mask`.
    pub fn highlights(mut self, mask: Vec<bool>) -> Self {
        self.highlights = mask;
        self
    }

    /// Char range currently being selected with the pointer.
    pub fn selection(mut self, range: Option<(usize, usize)>) -> Self {
        self.selection = range;
        self
    }

    pub fn scroll(mut self, scroll: u16) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn style_at(&self, offset: usize) -> Style {
        let colors = &self.theme.colors;
        let selected = self
            .selection
            .is_some_and(|(start, end)| offset >= start && offset < end);
        if selected {
            Style::default().fg(colors.fg()).bg(colors.selection_bg())
        } else if self.highlights.get(offset).copied().unwrap_or(false) {
            Style::default()
                .fg(colors.highlight_fg())
                .bg(colors.highlight_bg())
        } else {
            Style::default().fg(colors.fg())
        }
    }
}

impl Widget for TextPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let border = if self.focused {
            colors.border_focused()
        } else {
            colors.border()
        };
        let block = Block::bordered()
            .title(Span::styled(
                format!(" {} ", self.title),
                Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD),
            ))
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let wrapped = WrappedText::new(self.text, inner.width);
        let lines: Vec<Line> = wrapped
            .lines()
            .iter()
            .skip(self.scroll as usize)
            .take(inner.height as usize)
            .map(|line| {
                let chars = wrapped.line_chars(line);
                let mut spans: Vec<Span> = Vec::new();
                let mut run = String::new();
                let mut run_style: Option<Style> = None;
                for (i, ch) in chars.iter().enumerate() {
                    let style = self.style_at(line.start + i);
                    if run_style.is_some_and(|s| s != style) {
                        spans.push(Span::styled(std::mem::take(&mut run), run_style.unwrap_or_default()));
                    }
                    run_style = Some(style);
                    run.push(*ch);
                }
                if !run.is_empty() {
                    spans.push(Span::styled(run, run_style.unwrap_or_default()));
                }
                Line::from(spans)
            })
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(pane: TextPane<'_>, area: Rect) -> Buffer {
        let mut buf = Buffer::empty(area);
        pane.render(area, &mut buf);
        buf
    }

    #[test]
    fn test_text_is_drawn_inside_border() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 12, 4);
        let buf = render(TextPane::new("P", "hello world", &theme), area);
        assert_eq!(buf[(1, 1)].symbol(), "h");
        assert_eq!(buf[(1, 2)].symbol(), "w");
    }

    #[test]
    fn test_highlight_changes_cell_background() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 20, 3);
        let mut mask = vec![false; 11];
        mask[6..11].fill(true);
        let buf = render(TextPane::new("P", "hello world", &theme).highlights(mask), area);
        let highlight = theme.colors.highlight_bg();
        assert_eq!(buf[(7, 1)].bg, highlight);
        assert_ne!(buf[(1, 1)].bg, highlight);
    }

    #[test]
    fn test_scroll_skips_lines() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 12, 3);
        let buf = render(TextPane::new("P", "hello world", &theme).scroll(1), area);
        assert_eq!(buf[(1, 1)].symbol(), "w");
    }
}
