use std::collections::BTreeSet;
use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::content::model::Test;
use crate::engine::annotation::{AnnotationSet, Annotator, RegionId};
use crate::engine::grading::{self, GradeReport};
use crate::engine::timer::{DEFAULT_SESSION_SECS, TICK_PERIOD, Ticker, TimerMode, TimerState};
use crate::pointer::PointerHub;
use crate::session::answers::AnswerStore;
use crate::store::completion::CompletionStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Active,
    Submitted,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Active => "active",
            SessionStatus::Submitted => "submitted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {action} while the session is {status}")]
    InvalidTransition {
        action: &'static str,
        status: SessionStatus,
    },
    #[error("question {0} is not part of this test")]
    UnknownQuestion(u32),
    #[error("unknown test '{test}' in category '{category}'")]
    UnknownTest { category: String, test: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerPrefs {
    pub mode: TimerMode,
    pub session_length: u32,
}

impl Default for TimerPrefs {
    fn default() -> Self {
        Self {
            mode: TimerMode::Countdown,
            session_length: DEFAULT_SESSION_SECS,
        }
    }
}

/// One attempt at one test.
#[derive(Debug)]
pub struct Session {
    category: String,
    test: Test,
    status: SessionStatus,
    answers: AnswerStore,
    timer: TimerState,
    started_at: DateTime<Utc>,
    report: Option<GradeReport>,
}

impl Session {
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn test(&self) -> &Test {
        &self.test
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn report(&self) -> Option<&GradeReport> {
        self.report.as_ref()
    }
}

/// Char length of every highlightable region of a test.
pub fn regions(test: &Test) -> Vec<(RegionId, usize)> {
    let mut regions = vec![(RegionId::Passage, test.passage.chars().count())];
    regions.extend(
        test.sections
            .iter()
            .enumerate()
            .map(|(i, s)| (RegionId::Section(i), s.plain_text().chars().count())),
    );
    regions
}

/// Owns the session lifecycle: answers, timer schedule, highlight
/// listeners and the completion record.
pub struct SessionController {
    session: Option<Session>,
    completion: CompletionStore,
    hub: PointerHub,
    prefs: TimerPrefs,
    ticker: Option<Ticker>,
    annotator: Option<Annotator>,
    review_highlights: AnnotationSet,
}

impl SessionController {
    pub fn new(completion: CompletionStore, hub: PointerHub, prefs: TimerPrefs) -> Self {
        Self {
            session: None,
            completion,
            hub,
            prefs,
            ticker: None,
            annotator: None,
            review_highlights: AnnotationSet::default(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.session
            .as_ref()
            .map_or(SessionStatus::Idle, |s| s.status)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn hub(&self) -> &PointerHub {
        &self.hub
    }

    pub fn prefs(&self) -> TimerPrefs {
        self.prefs
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn annotator(&self) -> Option<&Annotator> {
        self.annotator.as_ref()
    }

    pub fn annotator_mut(&mut self) -> Option<&mut Annotator> {
        self.annotator.as_mut()
    }

    /// Highlights to draw: live while active, frozen after submission.
    pub fn highlights(&self) -> &AnnotationSet {
        match &self.annotator {
            Some(annotator) => annotator.annotations(),
            None => &self.review_highlights,
        }
    }

    pub fn completed(&mut self, category: &str) -> BTreeSet<String> {
        self.completion.load(category)
    }

    /// Start a fresh attempt at `test`. Any submitted session is replaced.
    pub fn enter_test(&mut self, category: &str, test: &Test, now: Instant) -> Result<(), SessionError> {
        if self.status() == SessionStatus::Active {
            return Err(self.invalid("enter a test"));
        }
        self.teardown();

        let mut timer = TimerState::new(self.prefs.mode, self.prefs.session_length);
        timer.start();
        self.ticker = Some(Ticker::start(now, TICK_PERIOD));
        self.annotator = Some(Annotator::attach(&self.hub, regions(test)));
        self.session = Some(Session {
            category: category.to_string(),
            test: test.clone(),
            status: SessionStatus::Active,
            answers: AnswerStore::for_test(test),
            timer,
            started_at: Utc::now(),
            report: None,
        });
        tracing::info!(
            "entered {category}/{} ({} timer, {} questions)",
            test.id,
            self.prefs.mode.as_str(),
            test.item_count()
        );
        Ok(())
    }

    /// Store a raw response. Returns false once the session is submitted.
    pub fn set_answer(&mut self, number: u32, value: &str) -> Result<bool, SessionError> {
        let Some(session) = self.session.as_mut() else {
            return Err(self.invalid("answer"));
        };
        if !session.answers.contains_question(number) {
            return Err(SessionError::UnknownQuestion(number));
        }
        Ok(session.answers.set(number, value))
    }

    /// Step the response for a choice question to the next (or previous)
    /// valid value. Returns the new value, or `None` for free-text items.
    pub fn cycle_choice(&mut self, number: u32, forward: bool) -> Result<Option<String>, SessionError> {
        let Some(session) = self.session.as_mut() else {
            return Err(self.invalid("answer"));
        };
        let (section, item) = session
            .test
            .item(number)
            .ok_or(SessionError::UnknownQuestion(number))?;
        let choices = section.choices(item);
        if choices.is_empty() || session.answers.is_frozen() {
            return Ok(None);
        }
        let current = session
            .answers
            .get(number)
            .and_then(|v| choices.iter().position(|c| c.eq_ignore_ascii_case(v.trim())));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => choices.len() - 1,
            (Some(i), true) => (i + 1) % choices.len(),
            (Some(i), false) => (i + choices.len() - 1) % choices.len(),
        };
        let value = choices[next].clone();
        session.answers.set(number, value.as_str());
        Ok(Some(value))
    }

    /// Grade, freeze and record completion. Ticking and highlight listeners stop here.
    pub fn submit(&mut self) -> Result<&GradeReport, SessionError> {
        if self.status() != SessionStatus::Active {
            return Err(self.invalid("submit"));
        }
        self.ticker = None;
        if let Some(annotator) = self.annotator.take() {
            self.review_highlights = annotator.into_annotations();
        }
        let Some(session) = self.session.as_mut() else {
            return Err(SessionError::InvalidTransition {
                action: "submit",
                status: SessionStatus::Idle,
            });
        };

        session.timer.stop();
        session.answers.freeze();
        let report = grading::grade(&session.test, &session.answers);
        tracing::info!(
            "submitted {}/{}: {}/{} correct, band {}",
            session.category,
            session.test.id,
            report.correct,
            report.total,
            report.band()
        );
        if self.completion.mark_complete(&session.category, &session.test.id) {
            tracing::info!("first completion of {}/{}", session.category, session.test.id);
        }
        Ok(session.report.insert(report))
    }

    /// Leave the test. Returns the category whose list should be shown.
    pub fn exit_test(&mut self) -> Result<String, SessionError> {
        let Some(session) = self.session.take() else {
            return Err(self.invalid("exit"));
        };
        self.teardown();
        tracing::info!("left {}/{} ({})", session.category, session.test.id, session.status);
        Ok(session.category)
    }

    /// Start over on the test that was just submitted.
    pub fn retry(&mut self, now: Instant) -> Result<(), SessionError> {
        let Some(session) = self.session.as_ref().filter(|s| s.status == SessionStatus::Submitted) else {
            return Err(self.invalid("retry"));
        };
        let category = session.category.clone();
        let test = session.test.clone();
        self.enter_test(&category, &test, now)
    }

    /// Pause or resume. Returns whether the timer is now running.
    pub fn toggle_timer(&mut self, now: Instant) -> Result<bool, SessionError> {
        let session = self.active_mut("pause the timer")?;
        session.timer.toggle_running();
        let running = session.timer.running;
        self.ticker = running.then(|| Ticker::start(now, TICK_PERIOD));
        Ok(running)
    }

    /// Flip between countdown and stopwatch, restarting the counter.
    pub fn switch_timer_mode(&mut self, now: Instant) -> Result<TimerMode, SessionError> {
        let session = self.active_mut("switch timer mode")?;
        session.timer.switch_mode();
        let mode = session.timer.mode;
        let running = session.timer.running;
        self.prefs.mode = mode;
        self.ticker = running.then(|| Ticker::start(now, TICK_PERIOD));
        tracing::debug!("timer switched to {}", mode.as_str());
        Ok(mode)
    }

    /// Apply every tick due by `now`. Returns the number applied.
    pub fn pump(&mut self, now: Instant) -> u32 {
        let Some(ticker) = self.ticker.as_mut() else {
            return 0;
        };
        let due = ticker.due(now);
        let Some(session) = self.session.as_mut() else {
            return 0;
        };
        let was_expired = session.timer.is_expired();
        for _ in 0..due {
            session.timer.tick();
        }
        if !was_expired && session.timer.is_expired() {
            tracing::info!("time is up on {}/{}", session.category, session.test.id);
        }
        due
    }

    fn active_mut(&mut self, action: &'static str) -> Result<&mut Session, SessionError> {
        let status = self.status();
        match self.session.as_mut() {
            Some(session) if status == SessionStatus::Active => Ok(session),
            _ => Err(SessionError::InvalidTransition { action, status }),
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            status: self.status(),
        }
    }

    fn teardown(&mut self) {
        self.ticker = None;
        self.annotator = None;
        self.review_highlights.clear();
    }
}
