use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget};

use crate::engine::timer::format_clock;
use crate::session::result::SessionResult;
use crate::ui::components::progress_bar::ProgressBar;
use crate::ui::theme::Theme;

/// Result overlay shown after a test is submitted.
pub struct Dashboard<'a> {
    pub result: &'a SessionResult,
    pub theme: &'a Theme,
}

impl<'a> Dashboard<'a> {
    pub fn new(result: &'a SessionResult, theme: &'a Theme) -> Self {
        Self { result, theme }
    }
}

impl Widget for Dashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        Clear.render(area, buf);

        let block = Block::bordered()
            .title(" Test Submitted ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(inner);

        let title = Paragraph::new(Line::from(Span::styled(
            &*self.result.title,
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center);
        title.render(layout[0], buf);

        let score_color = if self.result.percent >= 70.0 {
            colors.success()
        } else if self.result.percent >= 50.0 {
            colors.warning()
        } else {
            colors.error()
        };
        let score_text = format!("{}/{}", self.result.correct, self.result.total);
        let percent_text = format!("  ({:.0}%)", self.result.percent);
        let score_line = Line::from(vec![
            Span::styled("  Score:    ", Style::default().fg(colors.fg())),
            Span::styled(
                &*score_text,
                Style::default().fg(score_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(&*percent_text, Style::default().fg(colors.text_dim())),
        ]);
        Paragraph::new(score_line).render(layout[1], buf);

        let band_line = Line::from(vec![
            Span::styled("  Band:     ", Style::default().fg(colors.fg())),
            Span::styled(
                self.result.band.to_string(),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        Paragraph::new(band_line).render(layout[2], buf);

        let mode = self.result.timer_mode.as_str();
        let mut time_spans = vec![
            Span::styled("  Time:     ", Style::default().fg(colors.fg())),
            Span::styled(
                format_clock(self.result.elapsed_secs),
                Style::default().fg(colors.fg()),
            ),
            Span::styled(format!("  ({mode})"), Style::default().fg(colors.text_dim())),
        ];
        if self.result.timed_out {
            time_spans.push(Span::styled(
                "  time ran out",
                Style::default().fg(colors.warning()),
            ));
        }
        Paragraph::new(Line::from(time_spans)).render(layout[3], buf);

        let bar_area = Rect {
            x: layout[4].x + 2,
            width: layout[4].width.saturating_sub(4),
            height: 1,
            ..layout[4]
        };
        ProgressBar::new(
            "Answered",
            self.result.answered,
            self.result.total,
            self.theme,
        )
        .render(bar_area, buf);

        let help = Paragraph::new(Line::from(vec![
            Span::styled("  [v] Review answers  ", Style::default().fg(colors.accent())),
            Span::styled("[r] Retry  ", Style::default().fg(colors.accent())),
            Span::styled("[q] Back to tests", Style::default().fg(colors.accent())),
        ]));
        help.render(layout[6], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::timer::TimerMode;
    use chrono::Utc;

    fn result(timed_out: bool) -> SessionResult {
        SessionResult {
            category: "academic".into(),
            test_id: "urban-beekeeping".into(),
            title: "The Rooftop Hive".into(),
            correct: 6,
            total: 10,
            percent: 60.0,
            band: 6,
            answered: 8,
            elapsed_secs: 125,
            timer_mode: TimerMode::Stopwatch,
            timed_out,
            started_at: Utc::now(),
        }
    }

    fn rendered(result: &SessionResult) -> String {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 60, 16);
        let mut buf = Buffer::empty(area);
        Dashboard::new(result, &theme).render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_shows_score_and_band() {
        let text = rendered(&result(false));
        assert!(text.contains("The Rooftop Hive"));
        assert!(text.contains("6/10"));
        assert!(text.contains("Band:     6"));
        assert!(text.contains("02:05"));
        assert!(!text.contains("time ran out"));
    }

    #[test]
    fn test_marks_timed_out_sessions() {
        let text = rendered(&result(true));
        assert!(text.contains("time ran out"));
    }
}
