use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::timer::TimerMode;
use crate::session::controller::Session;

/// Summary of a submitted session, shown on the result dashboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub category: String,
    pub test_id: String,
    pub title: String,
    pub correct: usize,
    pub total: usize,
    pub percent: f64,
    pub band: u8,
    pub answered: usize,
    pub elapsed_secs: u32,
    pub timer_mode: TimerMode,
    pub timed_out: bool,
    pub started_at: DateTime<Utc>,
}

impl SessionResult {
    /// `None` until the session has been graded.
    pub fn from_session(session: &Session) -> Option<Self> {
        let report = session.report()?;
        let timer = session.timer();
        Some(Self {
            category: session.category().to_string(),
            test_id: session.test().id.clone(),
            title: session.test().title.clone(),
            correct: report.correct,
            total: report.total,
            percent: report.percent(),
            band: report.band(),
            answered: session.answers().answered_count(),
            elapsed_secs: timer.elapsed_secs(),
            timer_mode: timer.mode,
            timed_out: timer.is_expired(),
            started_at: session.started_at(),
        })
    }

    pub fn unanswered(&self) -> usize {
        self.total.saturating_sub(self.answered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::{Item, QuestionType, Section, Test};
    use crate::pointer::PointerHub;
    use crate::session::controller::{SessionController, TimerPrefs};
    use crate::store::completion::CompletionStore;
    use std::time::{Duration, Instant};

    fn test_with_two_items() -> Test {
        Test {
            id: "two".into(),
            title: "Two questions".into(),
            subtitle: String::new(),
            passage: "Passage.".into(),
            sections: vec![Section {
                rubric: "Questions 1-2".into(),
                instruction: String::new(),
                kind: QuestionType::ShortAnswer,
                items: vec![
                    Item {
                        number: 1,
                        prompt: "Colour?".into(),
                        answer: Some("amber".into()),
                        options: Vec::new(),
                        paragraph: None,
                    },
                    Item {
                        number: 2,
                        prompt: "Year?".into(),
                        answer: None,
                        options: Vec::new(),
                        paragraph: None,
                    },
                ],
                headings: Vec::new(),
                options: Vec::new(),
                letter_range: None,
            }],
        }
    }

    #[test]
    fn test_result_only_after_submit() {
        let prefs = TimerPrefs {
            mode: TimerMode::Stopwatch,
            session_length: 600,
        };
        let mut c = SessionController::new(CompletionStore::in_memory(), PointerHub::new(), prefs);
        let now = Instant::now();
        c.enter_test("general-training", &test_with_two_items(), now).unwrap();
        assert!(SessionResult::from_session(c.session().unwrap()).is_none());

        c.set_answer(1, "  Amber ").unwrap();
        c.pump(now + Duration::from_secs(42));
        c.submit().unwrap();

        let result = SessionResult::from_session(c.session().unwrap()).unwrap();
        assert_eq!(result.correct, 1);
        assert_eq!(result.total, 2);
        assert_eq!(result.percent, 50.0);
        assert_eq!(result.band, 5);
        assert_eq!(result.unanswered(), 1);
        assert_eq!(result.elapsed_secs, 42);
        assert!(!result.timed_out);
    }
}
