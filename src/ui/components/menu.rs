use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::ui::theme::Theme;

pub struct MenuItem {
    pub key: String,
    pub label: String,
    pub description: String,
    /// Shown with a completion mark.
    pub done: bool,
}

pub struct Menu<'a> {
    pub title: String,
    pub subtitle: String,
    pub items: Vec<MenuItem>,
    pub selected: usize,
    pub theme: &'a Theme,
}

impl<'a> Menu<'a> {
    pub fn new(title: &str, subtitle: &str, items: Vec<MenuItem>, theme: &'a Theme) -> Self {
        Self {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            items,
            selected: 0,
            theme,
        }
    }

    pub fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.items.len();
    }

    pub fn prev(&mut self) {
        if self.items.is_empty() {
            return;
        }
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = self.items.len() - 1;
        }
    }

    /// Select by the digit shown next to an item. Returns whether it matched.
    pub fn select_key(&mut self, key: char) -> bool {
        match self.items.iter().position(|i| i.key.starts_with(key) && i.key.len() == 1) {
            Some(index) => {
                self.selected = index;
                true
            }
            None => false,
        }
    }
}

impl Widget for &Menu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let title_lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                &*self.title,
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                &*self.subtitle,
                Style::default().fg(colors.fg()),
            )),
        ];

        let title = Paragraph::new(title_lines).alignment(Alignment::Center);
        title.render(layout[0], buf);

        if self.items.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "  Nothing here yet.",
                Style::default().fg(colors.text_dim()),
            )))
            .render(layout[2], buf);
            return;
        }

        let menu_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                self.items
                    .iter()
                    .map(|_| Constraint::Length(3))
                    .collect::<Vec<_>>(),
            )
            .split(layout[2]);

        for (i, item) in self.items.iter().enumerate() {
            let is_selected = i == self.selected;
            let indicator = if is_selected { ">" } else { " " };

            let label_text = format!(" {indicator} [{key}] {label}", key = item.key, label = item.label);
            let desc_text = format!("     {}", item.description);

            let mut label_spans = vec![Span::styled(
                label_text,
                Style::default()
                    .fg(if is_selected {
                        colors.accent()
                    } else {
                        colors.fg()
                    })
                    .add_modifier(if is_selected {
                        Modifier::BOLD
                    } else {
                        Modifier::empty()
                    }),
            )];
            if item.done {
                label_spans.push(Span::styled(
                    "  \u{2713} completed",
                    Style::default().fg(colors.success()),
                ));
            }

            let lines = vec![
                Line::from(label_spans),
                Line::from(Span::styled(
                    desc_text,
                    Style::default().fg(colors.text_dim()),
                )),
            ];

            let p = Paragraph::new(lines);
            if i < menu_layout.len() {
                p.render(menu_layout[i], buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<MenuItem> {
        (0..n)
            .map(|i| MenuItem {
                key: (i + 1).to_string(),
                label: format!("Item {i}"),
                description: String::new(),
                done: i == 0,
            })
            .collect()
    }

    #[test]
    fn test_selection_wraps() {
        let theme = Theme::default();
        let mut menu = Menu::new("t", "s", items(3), &theme);
        menu.prev();
        assert_eq!(menu.selected, 2);
        menu.next();
        assert_eq!(menu.selected, 0);
    }

    #[test]
    fn test_empty_menu_does_not_panic() {
        let theme = Theme::default();
        let mut menu = Menu::new("t", "s", Vec::new(), &theme);
        menu.next();
        menu.prev();
        assert_eq!(menu.selected, 0);
    }

    #[test]
    fn test_select_by_key() {
        let theme = Theme::default();
        let mut menu = Menu::new("t", "s", items(3), &theme);
        assert!(menu.select_key('2'));
        assert_eq!(menu.selected, 1);
        assert!(!menu.select_key('9'));
    }

    #[test]
    fn test_render_shows_completion_mark() {
        let theme = Theme::default();
        let menu = Menu::new("Academic", "s", items(2), &theme);
        let area = Rect::new(0, 0, 40, 14);
        let mut buf = Buffer::empty(area);
        (&menu).render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Academic"));
        assert!(text.contains("completed"));
    }
}
