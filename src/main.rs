use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, KeyCode,
    KeyEvent, KeyEventKind, KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use tracing_subscriber::EnvFilter;

use readingroom::app::{App, AppScreen};
use readingroom::config::{Config, Overrides};
use readingroom::content::catalog::Catalog;
use readingroom::engine::annotation::RegionId;
use readingroom::engine::timer::TimerMode;
use readingroom::event::{AppEvent, EventHandler};
use readingroom::navigation;
use readingroom::pointer::CursorStyle;
use readingroom::session::controller::SessionStatus;
use readingroom::session::result::SessionResult;
use readingroom::store::completion::CompletionStore;
use readingroom::store::kv::FileStorage;
use readingroom::ui;
use readingroom::ui::components::answer_sheet::AnswerSheet;
use readingroom::ui::components::dashboard::Dashboard;
use readingroom::ui::components::highlight_popup::HighlightPopup;
use readingroom::ui::components::text_pane::TextPane;
use readingroom::ui::layout::{AppLayout, pack_hint_lines};
use readingroom::ui::theme::Theme;

const LOG_ENV: &str = "READINGROOM_LOG";

#[derive(Parser)]
#[command(name = "readingroom", version, about = "Timed reading-comprehension practice in the terminal")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Open this location, e.g. /reading/academic")]
    path: Option<String>,

    #[arg(long, help = "Count up instead of down")]
    stopwatch: bool,

    #[arg(short, long, help = "Countdown length in minutes")]
    minutes: Option<u32>,

    #[arg(long, help = "Directory for progress records and the log")]
    data_dir: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let stored = Config::load().unwrap_or_else(|e| {
        eprintln!("config unreadable, using defaults: {e}");
        Config::default()
    });
    let overrides = Overrides {
        theme: cli.theme,
        timer_mode: cli.stopwatch.then_some(TimerMode::Stopwatch),
        session_length_secs: cli.minutes.map(|m| m.saturating_mul(60)),
        data_dir: cli.data_dir,
    };
    let mut config = stored.with_overrides(&overrides);

    init_logging(&config.data_dir());
    config.validate(&Theme::available_themes());
    ui::theme::init(&config.theme);
    let launched = config.clone();

    let catalog = Catalog::bundled()?;
    let completion = match FileStorage::with_base_dir(config.data_dir()) {
        Ok(storage) => CompletionStore::new(Box::new(storage)),
        Err(e) => {
            tracing::warn!("progress will not be saved: {e}");
            CompletionStore::in_memory()
        }
    };
    let initial_path = cli.path.unwrap_or_else(|| navigation::ROOT.to_string());
    tracing::info!(path = %initial_path, theme = %config.theme, "starting");

    let mut app = App::new(config, catalog, completion, &initial_path);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let size = terminal.size()?;
    app.resize(size.width, size.height);

    let events = EventHandler::new(Duration::from_millis(100));

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(e) = app.config.persisted(&stored, &launched).save() {
        tracing::warn!("config not saved: {e}");
    }

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

/// Log to a file in the data directory; the terminal belongs to the UI.
fn init_logging(data_dir: &Path) {
    if fs::create_dir_all(data_dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("readingroom.log"))
    else {
        return;
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("readingroom=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Mouse(mouse) => app.handle_mouse(mouse),
            AppEvent::Tick => app.tick(Instant::now()),
            AppEvent::Resize(width, height) => app.resize(width, height),
            AppEvent::FocusLost => app.focus_lost(),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    if key.modifiers.contains(KeyModifiers::ALT) {
        match key.code {
            KeyCode::Left => return app.back(),
            KeyCode::Right => return app.forward(),
            _ => {}
        }
    }

    match app.screen {
        AppScreen::Categories | AppScreen::Tests => handle_menu_key(app, key),
        AppScreen::Test => handle_test_key(app, key),
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Left => {
            if app.screen == AppScreen::Tests {
                app.go_to_categories();
            } else if key.code == KeyCode::Esc {
                app.should_quit = true;
            }
        }
        KeyCode::Up | KeyCode::Char('k') => app.menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => app.open_selected(),
        KeyCode::Char(ch) if ch.is_ascii_digit() => {
            if app.menu.select_key(ch) {
                app.open_selected();
            }
        }
        _ => {}
    }
}

fn handle_test_key(app: &mut App, key: KeyEvent) {
    if app.view.editing.is_some() {
        app.handle_edit_key(key);
        return;
    }

    if app.view.show_result {
        match key.code {
            KeyCode::Char('r') => app.retry(),
            KeyCode::Char('v') | KeyCode::Enter => app.view.show_result = false,
            KeyCode::Char('q') | KeyCode::Esc => app.exit_test(),
            _ => {}
        }
        return;
    }

    let active = app.controller.status() == SessionStatus::Active;
    match key.code {
        KeyCode::Esc => {
            if !app.dismiss_affordance() {
                app.exit_test();
            }
        }
        KeyCode::Char('q') => app.exit_test(),
        KeyCode::Enter => {
            if !app.apply_affordance() {
                app.begin_edit();
            }
        }
        KeyCode::Tab | KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::BackTab | KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Char(']') | KeyCode::Right => app.cycle_choice(true),
        KeyCode::Char('[') | KeyCode::Left => app.cycle_choice(false),
        KeyCode::Char('s') if active => app.submit(),
        KeyCode::Char('p') if active => app.toggle_timer(),
        KeyCode::Char('m') if active => app.switch_timer_mode(),
        KeyCode::Char('r') if !active => app.retry(),
        KeyCode::Char('v') if !active => app.view.show_result = true,
        KeyCode::Char('>') => app.nudge_split(true),
        KeyCode::Char('<') => app.nudge_split(false),
        KeyCode::PageDown => app.scroll_passage(true),
        KeyCode::PageUp => app.scroll_passage(false),
        KeyCode::Char('}') => app.scroll_questions(true),
        KeyCode::Char('{') => app.scroll_questions(false),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Categories | AppScreen::Tests => render_menu(frame, app),
        AppScreen::Test => render_test(frame, app),
    }
}

fn header_bar<'a>(app: &App, right: Vec<Span<'a>>) -> Paragraph<'a> {
    let colors = &app.theme.colors;
    let mut spans = vec![
        Span::styled(
            " readingroom ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {} ", app.nav.current_path()),
            Style::default().fg(colors.text_dim()).bg(colors.header_bg()),
        ),
    ];
    spans.extend(right);
    Paragraph::new(Line::from(spans)).style(Style::default().bg(colors.header_bg()))
}

fn footer_bar(app: &App, hints: &[&str], width: u16) -> Paragraph<'static> {
    let colors = &app.theme.colors;
    let lines: Vec<Line> = pack_hint_lines(hints, width as usize)
        .into_iter()
        .take(1)
        .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.text_dim()))))
        .collect();
    Paragraph::new(lines)
}

fn render_menu(frame: &mut ratatui::Frame, app: &App) {
    let layout = AppLayout::new(frame.area());

    frame.render_widget(header_bar(app, Vec::new()), layout.header);

    let menu_area = ui::layout::centered_rect(60, 80, layout.main);
    frame.render_widget(&app.menu, menu_area);

    let hints: &[&str] = match app.screen {
        AppScreen::Tests => &["[1-9] Open", "[Enter] Open", "[Esc] Modules", "[Alt+\u{2190}/\u{2192}] History", "[q] Quit"],
        _ => &["[1-9] Open", "[Enter] Open", "[Alt+\u{2190}/\u{2192}] History", "[q] Quit"],
    };
    frame.render_widget(footer_bar(app, hints, layout.footer.width), layout.footer);
}

fn timer_spans(app: &App) -> Vec<Span<'static>> {
    let colors = &app.theme.colors;
    let Some(session) = app.controller.session() else {
        return Vec::new();
    };
    let timer = session.timer();
    let mut spans = vec![Span::styled(
        format!(" {} ", session.test().title),
        Style::default().fg(colors.header_fg()).bg(colors.header_bg()),
    )];

    let (text, color) = match session.status() {
        SessionStatus::Submitted => (format!(" {} \u{00b7} submitted ", timer.display()), colors.success()),
        _ if timer.is_expired() => (" Time's up ".to_string(), colors.error()),
        _ if !timer.running => (format!(" {} \u{00b7} paused ", timer.display()), colors.warning()),
        _ => (format!(" {} \u{00b7} {} ", timer.display(), timer.mode.as_str()), colors.accent()),
    };
    spans.push(Span::styled(
        text,
        Style::default()
            .fg(color)
            .bg(colors.header_bg())
            .add_modifier(Modifier::BOLD),
    ));
    spans
}

fn render_test(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let (Some(session), Some(number)) = (app.controller.session(), app.selected_number()) else {
        return;
    };
    let test = session.test();
    let layout = app.test_layout();
    let highlights = app.controller.highlights();
    let pending = app
        .controller
        .annotator()
        .and_then(|a| a.pending())
        .and_then(|s| s.span());
    let selection_in = |region: RegionId| {
        pending
            .filter(|(r, _, _)| *r == region)
            .map(|(_, start, end)| (start, end))
    };

    frame.render_widget(header_bar(app, timer_spans(app)), layout.header);

    let passage = TextPane::new(&test.title, &test.passage, app.theme)
        .highlights(highlights.mask(RegionId::Passage, test.passage.chars().count()))
        .selection(selection_in(RegionId::Passage))
        .scroll(app.view.passage_scroll);
    frame.render_widget(passage, layout.passage);

    let divider_color = if app.controller.hub().style().cursor == CursorStyle::ColumnResize {
        colors.divider_active()
    } else {
        colors.divider()
    };
    let divider_lines: Vec<Line> = (0..layout.divider.height)
        .map(|_| Line::from(Span::styled("\u{2502}", Style::default().fg(divider_color))))
        .collect();
    frame.render_widget(Paragraph::new(divider_lines), layout.divider);

    let section_index = app.current_section();
    if let Some(section) = test.sections.get(section_index) {
        let text = section.plain_text();
        let region = RegionId::Section(section_index);
        let questions = TextPane::new(&section.rubric, &text, app.theme)
            .highlights(highlights.mask(region, text.chars().count()))
            .selection(selection_in(region))
            .scroll(app.view.question_scroll)
            .focused(true);
        frame.render_widget(questions, layout.questions);
    }

    let sheet = AnswerSheet::new(test, session.answers(), number, app.theme)
        .report(session.report())
        .editing(app.view.editing.as_ref());
    frame.render_widget(sheet, layout.answers);

    let hints: &[&str] = if app.view.editing.is_some() {
        &["[Enter] Save", "[Tab] Next", "[Esc] Cancel"]
    } else if session.status() == SessionStatus::Active {
        &[
            "[Tab/j/k] Question",
            "[[/]] Choose",
            "[Enter] Type",
            "[s] Submit",
            "[p] Pause",
            "[m] Timer mode",
            "[</>] Resize",
            "[PgUp/PgDn] Scroll",
            "[q] Leave",
        ]
    } else {
        &["[Tab/j/k] Question", "[v] Result", "[r] Retry", "[q] Leave"]
    };
    frame.render_widget(footer_bar(app, hints, layout.footer.width), layout.footer);

    if let Some(affordance) = app.controller.annotator().and_then(|a| a.affordance()) {
        frame.render_widget(HighlightPopup::new(affordance, app.theme), area);
    }

    if app.view.show_result
        && let Some(result) = SessionResult::from_session(session)
    {
        let popup = ui::layout::centered_rect(50, 50, area);
        frame.render_widget(Dashboard::new(&result, app.theme), popup);
    }
}
