use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Clear, Paragraph, Widget};

use crate::engine::annotation::Affordance;
use crate::ui::theme::Theme;

/// Small popup offering to add or remove a highlight at the pointer.
pub struct HighlightPopup<'a> {
    affordance: &'a Affordance,
    theme: &'a Theme,
}

impl<'a> HighlightPopup<'a> {
    pub fn new(affordance: &'a Affordance, theme: &'a Theme) -> Self {
        Self { affordance, theme }
    }

    /// Popup rectangle, clipped to `area`.
    pub fn area(&self, area: Rect) -> Rect {
        let (x, y, width, height) = self.affordance.bounds();
        Rect::new(x, y, width, height).intersection(area)
    }
}

impl Widget for HighlightPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = self.area(area);
        if popup.width < 3 || popup.height < 3 {
            return;
        }
        let colors = &self.theme.colors;
        Clear.render(popup, buf);
        Paragraph::new(self.affordance.label())
            .style(
                Style::default()
                    .fg(colors.highlight_fg())
                    .bg(colors.highlight_bg())
                    .add_modifier(Modifier::BOLD),
            )
            .block(Block::bordered().border_style(Style::default().fg(colors.border_focused())))
            .render(popup, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::annotation::ScreenPos;

    #[test]
    fn test_popup_sits_below_pointer() {
        let theme = Theme::default();
        let affordance = Affordance::Remove {
            annotation: 1,
            at: ScreenPos { column: 4, row: 2 },
        };
        let popup = HighlightPopup::new(&affordance, &theme);
        let rect = popup.area(Rect::new(0, 0, 80, 24));
        assert_eq!((rect.x, rect.y, rect.height), (4, 3, 3));

        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        popup.render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Remove highlight"));
    }

    #[test]
    fn test_popup_clipped_at_edge() {
        let theme = Theme::default();
        let affordance = Affordance::Remove {
            annotation: 1,
            at: ScreenPos { column: 70, row: 2 },
        };
        let rect = HighlightPopup::new(&affordance, &theme).area(Rect::new(0, 0, 80, 24));
        assert_eq!(rect.x + rect.width, 80);
    }
}
