use std::time::Instant;

use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::config::Config;
use crate::content::catalog::Catalog;
use crate::content::model::Test;
use crate::engine::annotation::{RegionId, ScreenPos, TextPoint};
use crate::navigation::{self, NavigationSync, Route};
use crate::pointer::{Listener, PointerHub};
use crate::session::controller::{SessionController, SessionStatus, TimerPrefs};
use crate::store::completion::CompletionStore;
use crate::ui::components::menu::{Menu, MenuItem};
use crate::ui::layout::{self, TestLayout};
use crate::ui::line_input::{InputResult, LineInput};
use crate::ui::split::SplitController;
use crate::ui::theme::{self, Theme};
use crate::ui::wrap::WrappedText;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Categories,
    Tests,
    Test,
}

/// What a route change does to the history stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryAction {
    Push,
    Replace,
}

const SCROLL_STEP: u16 = 3;
const NUDGE_PERCENT: i16 = 5;

/// View state of the open test that does not belong to the session itself.
#[derive(Debug, Default)]
pub struct TestView {
    pub split: SplitController,
    pub selected: usize,
    pub editing: Option<LineInput>,
    pub passage_scroll: u16,
    pub question_scroll: u16,
    pub show_result: bool,
}

impl TestView {
    fn reset(&mut self) {
        self.split.reset();
        self.selected = 0;
        self.editing = None;
        self.passage_scroll = 0;
        self.question_scroll = 0;
        self.show_result = false;
    }
}

pub struct App {
    pub screen: AppScreen,
    pub catalog: Catalog,
    pub nav: NavigationSync,
    pub controller: SessionController,
    pub menu: Menu<'static>,
    pub category: Option<String>,
    pub view: TestView,
    pub theme: &'static Theme,
    pub config: Config,
    pub viewport: Rect,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config, catalog: Catalog, completion: CompletionStore, initial_path: &str) -> Self {
        let theme = theme::active();
        let prefs = TimerPrefs {
            mode: config.timer_mode,
            session_length: config.session_length_secs,
        };
        let controller = SessionController::new(completion, PointerHub::new(), prefs);
        let mut app = Self {
            screen: AppScreen::Categories,
            catalog,
            nav: NavigationSync::new(initial_path),
            controller,
            menu: Menu::new("readingroom", "Reading practice", Vec::new(), theme),
            category: None,
            view: TestView::default(),
            theme,
            config,
            viewport: Rect::new(0, 0, 80, 24),
            should_quit: false,
        };
        let route = app.nav.current_route(&app.catalog);
        app.navigate(route, HistoryAction::Replace);
        app
    }

    /// Every route change goes through here: initial load, back/forward,
    /// and entering or leaving a test. Invalid routes fall back to a list.
    pub fn navigate(&mut self, route: Route, action: HistoryAction) {
        let route = navigation::resolve(&route.path(), &self.catalog);
        if self.controller.status() != SessionStatus::Idle
            && let Err(e) = self.controller.exit_test()
        {
            tracing::warn!("could not leave test: {e}");
        }
        self.view.split.end_drag();

        match &route {
            Route::Categories => self.show_categories(),
            Route::Tests { category } => self.show_tests(category),
            Route::Test { category, test_id } => self.start_test(category, test_id),
        }

        match action {
            HistoryAction::Push => self.nav.push(&route),
            HistoryAction::Replace => self.nav.replace(&route),
        }
    }

    pub fn back(&mut self) {
        if let Some(route) = self.nav.back(&self.catalog) {
            self.navigate(route, HistoryAction::Replace);
        }
    }

    pub fn forward(&mut self) {
        if let Some(route) = self.nav.forward(&self.catalog) {
            self.navigate(route, HistoryAction::Replace);
        }
    }

    fn show_categories(&mut self) {
        let items = self
            .catalog
            .categories()
            .iter()
            .enumerate()
            .map(|(i, c)| MenuItem {
                key: (i + 1).to_string(),
                label: c.title.clone(),
                description: format!("{} ({} tests)", c.description, c.tests.len()),
                done: false,
            })
            .collect();
        self.menu = Menu::new("readingroom", "Choose a reading module", items, self.theme);
        self.category = None;
        self.screen = AppScreen::Categories;
    }

    fn show_tests(&mut self, category_id: &str) {
        let Some(category) = self.catalog.category(category_id) else {
            self.show_categories();
            return;
        };
        let completed = self.controller.completed(category_id);
        let items = category
            .tests
            .iter()
            .enumerate()
            .map(|(i, t)| MenuItem {
                key: (i + 1).to_string(),
                label: t.title.clone(),
                description: if t.subtitle.is_empty() {
                    format!("{} questions", t.item_count())
                } else {
                    format!("{} ({} questions)", t.subtitle, t.item_count())
                },
                done: completed.contains(&t.id),
            })
            .collect();
        self.menu = Menu::new(&category.title, &category.description, items, self.theme);
        self.category = Some(category_id.to_string());
        self.screen = AppScreen::Tests;
    }

    fn start_test(&mut self, category: &str, test_id: &str) {
        let Some(test) = self.catalog.test(category, test_id) else {
            self.show_tests(category);
            return;
        };
        self.view.reset();
        match self.controller.enter_test(category, test, Instant::now()) {
            Ok(()) => {
                self.category = Some(category.to_string());
                self.screen = AppScreen::Test;
            }
            Err(e) => {
                tracing::warn!("could not enter {category}/{test_id}: {e}");
                self.show_tests(category);
            }
        }
    }

    /// Open whatever the menu has selected.
    pub fn open_selected(&mut self) {
        let index = self.menu.selected;
        let route = match self.screen {
            AppScreen::Categories => match self.catalog.categories().get(index) {
                Some(c) => Route::tests(&c.id),
                None => return,
            },
            AppScreen::Tests => {
                let Some(category) = self.category.as_deref().and_then(|id| self.catalog.category(id)) else {
                    return;
                };
                match category.tests.get(index) {
                    Some(t) => Route::test(&category.id, &t.id),
                    None => return,
                }
            }
            AppScreen::Test => return,
        };
        self.navigate(route, HistoryAction::Push);
    }

    pub fn go_to_categories(&mut self) {
        self.navigate(Route::Categories, HistoryAction::Push);
    }

    /// Leave the open test for its category's list.
    pub fn exit_test(&mut self) {
        let category = match self.controller.exit_test() {
            Ok(category) => category,
            Err(e) => {
                tracing::debug!("exit ignored: {e}");
                return;
            }
        };
        self.view.reset();
        self.navigate(Route::tests(&category), HistoryAction::Push);
    }

    pub fn submit(&mut self) {
        self.commit_edit();
        match self.controller.submit() {
            Ok(_) => self.view.show_result = true,
            Err(e) => tracing::debug!("submit ignored: {e}"),
        }
    }

    pub fn retry(&mut self) {
        match self.controller.retry(Instant::now()) {
            Ok(()) => self.view.reset(),
            Err(e) => tracing::debug!("retry ignored: {e}"),
        }
    }

    pub fn toggle_timer(&mut self) {
        if let Err(e) = self.controller.toggle_timer(Instant::now()) {
            tracing::debug!("{e}");
        }
    }

    pub fn switch_timer_mode(&mut self) {
        match self.controller.switch_timer_mode(Instant::now()) {
            Ok(mode) => self.config.timer_mode = mode,
            Err(e) => tracing::debug!("{e}"),
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.controller.pump(now);
    }

    pub fn test(&self) -> Option<&Test> {
        self.controller.session().map(|s| s.test())
    }

    pub fn selected_number(&self) -> Option<u32> {
        let test = self.test()?;
        test.items().nth(self.view.selected).map(|(_, item)| item.number)
    }

    /// Section shown in the question pane: the one holding the selected question.
    pub fn current_section(&self) -> usize {
        self.selected_number()
            .and_then(|n| self.test().and_then(|t| t.section_of(n)))
            .unwrap_or(0)
    }

    pub fn select_next(&mut self) {
        let count = self.test().map_or(0, |t| t.item_count());
        if count > 0 {
            self.select((self.view.selected + 1) % count);
        }
    }

    pub fn select_prev(&mut self) {
        let count = self.test().map_or(0, |t| t.item_count());
        if count > 0 {
            self.select((self.view.selected + count - 1) % count);
        }
    }

    fn select(&mut self, index: usize) {
        let before = self.current_section();
        self.view.selected = index;
        if self.current_section() != before {
            self.view.question_scroll = 0;
            if let Some(annotator) = self.controller.annotator_mut() {
                annotator.dismiss();
            }
        }
    }

    pub fn cycle_choice(&mut self, forward: bool) {
        let Some(number) = self.selected_number() else {
            return;
        };
        if let Err(e) = self.controller.cycle_choice(number, forward) {
            tracing::debug!("{e}");
        }
    }

    pub fn begin_edit(&mut self) {
        if self.controller.status() != SessionStatus::Active {
            return;
        }
        let Some(number) = self.selected_number() else {
            return;
        };
        let current = self
            .controller
            .session()
            .and_then(|s| s.answers().get(number))
            .unwrap_or_default()
            .to_string();
        self.view.editing = Some(LineInput::new(&current));
    }

    pub fn handle_edit_key(&mut self, key: KeyEvent) {
        let Some(input) = self.view.editing.as_mut() else {
            return;
        };
        match input.handle(key) {
            InputResult::Continue => {}
            InputResult::Cancel => self.view.editing = None,
            InputResult::Submit => {
                self.commit_edit();
            }
            InputResult::Next => {
                self.commit_edit();
                self.select_next();
                self.begin_edit();
            }
            InputResult::Previous => {
                self.commit_edit();
                self.select_prev();
                self.begin_edit();
            }
        }
    }

    fn commit_edit(&mut self) {
        let Some(input) = self.view.editing.take() else {
            return;
        };
        let Some(number) = self.selected_number() else {
            return;
        };
        if let Err(e) = self.controller.set_answer(number, input.value()) {
            tracing::debug!("answer not stored: {e}");
        }
    }

    pub fn nudge_split(&mut self, wider: bool) {
        self.view
            .split
            .nudge(if wider { NUDGE_PERCENT } else { -NUDGE_PERCENT });
    }

    pub fn scroll_passage(&mut self, down: bool) {
        self.view.passage_scroll = scrolled(self.view.passage_scroll, down);
    }

    pub fn scroll_questions(&mut self, down: bool) {
        self.view.question_scroll = scrolled(self.view.question_scroll, down);
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.viewport = Rect::new(0, 0, width, height);
        self.view.split.end_drag();
        if let Some(annotator) = self.controller.annotator_mut() {
            annotator.dismiss();
        }
    }

    /// The terminal lost focus: any drag in progress is over.
    pub fn focus_lost(&mut self) {
        self.view.split.end_drag();
    }

    pub fn test_layout(&self) -> TestLayout {
        TestLayout::new(self.viewport, &self.view.split)
    }

    /// Apply the highlight popup, if one is showing. Returns whether it was.
    pub fn apply_affordance(&mut self) -> bool {
        match self.controller.annotator_mut() {
            Some(annotator) if annotator.affordance().is_some() => {
                annotator.apply();
                true
            }
            _ => false,
        }
    }

    /// Close the highlight popup, if one is showing. Returns whether it was.
    pub fn dismiss_affordance(&mut self) -> bool {
        match self.controller.annotator_mut() {
            Some(annotator) if annotator.affordance().is_some() => {
                annotator.dismiss();
                true
            }
            _ => false,
        }
    }

    /// Wrapped text of a highlightable region at the current layout.
    pub fn region_text(&self, region: RegionId) -> Option<(WrappedText, Rect, u16)> {
        let test = self.test()?;
        let layout = self.test_layout();
        match region {
            RegionId::Passage => {
                let area = layout.passage_text();
                Some((WrappedText::new(&test.passage, area.width), area, self.view.passage_scroll))
            }
            RegionId::Section(i) => {
                let section = test.sections.get(i)?;
                let area = layout.question_text();
                Some((
                    WrappedText::new(&section.plain_text(), area.width),
                    area,
                    self.view.question_scroll,
                ))
            }
        }
    }

    /// Text position under a cell. With `within`, the point is clamped into
    /// that region's pane instead of failing outside it.
    pub fn point_at(&self, column: u16, row: u16, within: Option<RegionId>) -> Option<TextPoint> {
        let candidates = match within {
            Some(region) => vec![region],
            None => vec![RegionId::Passage, RegionId::Section(self.current_section())],
        };
        candidates.into_iter().find_map(|region| {
            let (text, area, scroll) = self.region_text(region)?;
            let offset = if within.is_some() {
                text.offset_clamped(area, scroll, column, row)?
            } else {
                text.offset_at(area, scroll, column, row)?
            };
            Some(TextPoint { region, offset })
        })
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.screen != AppScreen::Test {
            return;
        }
        let (column, row) = (mouse.column, mouse.row);
        let at = ScreenPos { column, row };
        let layout = self.test_layout();

        let hub = self.controller.hub().clone();
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(annotator) = self.controller.annotator_mut()
                    && annotator.affordance().is_some_and(|a| a.contains(at))
                {
                    annotator.press(at, None);
                    return;
                }
                if hub.is_listening(Listener::Dismiss) {
                    self.dismiss_affordance();
                }
                if self.view.split.press(&hub, column, row, layout.body) {
                    return;
                }
                if !hub.is_listening(Listener::Selection) || !hub.style().text_selection {
                    return;
                }
                let point = self.point_at(column, row, None);
                if let Some(annotator) = self.controller.annotator_mut() {
                    annotator.press(at, point);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if hub.is_listening(Listener::DragMove) {
                    self.view.split.drag_to(column, layout.body);
                    return;
                }
                if !hub.style().text_selection {
                    return;
                }
                let anchor_region = self
                    .controller
                    .annotator()
                    .and_then(|a| a.pending())
                    .map(|s| s.anchor.region);
                let Some(region) = anchor_region else {
                    return;
                };
                // Crossing into the other pane gives a point in another
                // region, which the wrap step rejects.
                let point = self
                    .point_at(column, row, None)
                    .or_else(|| self.point_at(column, row, Some(region)));
                if let (Some(point), Some(annotator)) = (point, self.controller.annotator_mut()) {
                    annotator.extend(point);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if hub.is_listening(Listener::DragRelease) {
                    self.view.split.end_drag();
                    return;
                }
                if !hub.is_listening(Listener::Selection) {
                    return;
                }
                if let Some(annotator) = self.controller.annotator_mut() {
                    annotator.release(at);
                }
            }
            MouseEventKind::ScrollDown | MouseEventKind::ScrollUp => {
                let down = mouse.kind == MouseEventKind::ScrollDown;
                if layout::contains(layout.passage, column, row) {
                    self.scroll_passage(down);
                } else if layout::contains(layout.questions, column, row) {
                    self.scroll_questions(down);
                }
            }
            _ => {}
        }
    }
}

fn scrolled(current: u16, down: bool) -> u16 {
    if down {
        current.saturating_add(SCROLL_STEP)
    } else {
        current.saturating_sub(SCROLL_STEP)
    }
}
