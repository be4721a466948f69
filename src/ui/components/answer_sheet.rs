use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::content::model::Test;
use crate::engine::grading::GradeReport;
use crate::session::answers::AnswerStore;
use crate::ui::components::progress_bar::ProgressBar;
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

/// Response entry for the selected question, plus a strip of every
/// question number. After grading the strip shows which were right.
pub struct AnswerSheet<'a> {
    test: &'a Test,
    answers: &'a AnswerStore,
    report: Option<&'a GradeReport>,
    selected: u32,
    editing: Option<&'a LineInput>,
    theme: &'a Theme,
}

impl<'a> AnswerSheet<'a> {
    pub fn new(
        test: &'a Test,
        answers: &'a AnswerStore,
        selected: u32,
        theme: &'a Theme,
    ) -> Self {
        Self {
            test,
            answers,
            report: None,
            selected,
            editing: None,
            theme,
        }
    }

    pub fn report(mut self, report: Option<&'a GradeReport>) -> Self {
        self.report = report;
        self
    }

    pub fn editing(mut self, input: Option<&'a LineInput>) -> Self {
        self.editing = input;
        self
    }

    fn response_line(&self) -> Line<'a> {
        let colors = &self.theme.colors;
        let label = Span::styled("  Answer: ", Style::default().fg(colors.text_dim()));

        if let Some(input) = self.editing {
            let (before, cursor, after) = input.render_parts();
            let cursor_style = Style::default().fg(colors.bg()).bg(colors.fg());
            let mut spans = vec![label, Span::styled(before.to_string(), Style::default().fg(colors.fg()))];
            match cursor {
                Some(ch) => spans.push(Span::styled(ch.to_string(), cursor_style)),
                None => spans.push(Span::styled(" ", cursor_style)),
            }
            spans.push(Span::styled(after.to_string(), Style::default().fg(colors.fg())));
            return Line::from(spans);
        }

        let value = match self.answers.get(self.selected) {
            Some(v) => Span::styled(
                v.to_string(),
                Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD),
            ),
            None => Span::styled("(none)", Style::default().fg(colors.text_dim())),
        };
        let mut spans = vec![label, value];
        if let Some(report) = self.report {
            let correct = report.is_correct(self.selected).unwrap_or(false);
            spans.push(if correct {
                Span::styled("  \u{2713}", Style::default().fg(colors.success()))
            } else {
                Span::styled("  \u{2717}", Style::default().fg(colors.error()))
            });
            let expected = self
                .test
                .item(self.selected)
                .and_then(|(_, item)| item.answer.clone())
                .unwrap_or_else(|| "-".to_string());
            spans.push(Span::styled(
                format!("  correct: {expected}"),
                Style::default().fg(colors.text_dim()),
            ));
        }
        Line::from(spans)
    }

    fn hint_line(&self) -> Line<'a> {
        let colors = &self.theme.colors;
        let Some((section, item)) = self.test.item(self.selected) else {
            return Line::default();
        };
        let choices = section.choices(item);
        let text = if self.report.is_some() {
            String::new()
        } else if choices.is_empty() {
            "  Type your answer: [Enter] edit".to_string()
        } else {
            format!("  {}   [ ] cycle", choices.join(" \u{00b7} "))
        };
        Line::from(Span::styled(text, Style::default().fg(colors.text_dim())))
    }

    fn number_strip(&self) -> Line<'a> {
        let colors = &self.theme.colors;
        let mut spans = vec![Span::raw(" ")];
        for number in self.test.question_numbers() {
            let mut style = match self.report.and_then(|r| r.is_correct(number)) {
                Some(true) => Style::default().fg(colors.success()),
                Some(false) => Style::default().fg(colors.error()),
                None if self.answers.get(number).is_some() => Style::default().fg(colors.accent()),
                None => Style::default().fg(colors.text_dim()),
            };
            if number == self.selected {
                style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
            }
            spans.push(Span::styled(format!("{number:>2}"), style));
            spans.push(Span::raw(" "));
        }
        Line::from(spans)
    }
}

impl Widget for AnswerSheet<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let kind = self
            .test
            .item(self.selected)
            .map(|(section, _)| section.kind.label())
            .unwrap_or_default();
        let border = if self.editing.is_some() {
            colors.border_focused()
        } else {
            colors.border()
        };
        let block = Block::bordered()
            .title(Span::styled(
                format!(" Question {} \u{00b7} {kind} ", self.selected),
                Style::default().fg(colors.accent()),
            ))
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 {
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(inner);

        Paragraph::new(self.response_line()).render(rows[0], buf);
        Paragraph::new(self.hint_line()).render(rows[1], buf);
        Paragraph::new(self.number_strip())
            .wrap(Wrap { trim: false })
            .render(rows[2], buf);
        ProgressBar::new(
            "Answered",
            self.answers.answered_count(),
            self.answers.question_count(),
            self.theme,
        )
        .render(rows[3], buf);
    }
}
