//! TUI setup, teardown, and main event loop.

pub mod autocomplete;
pub mod editor;
pub mod results;
pub mod sidebar;
pub mod statusbar;
pub mod ui;

use crate::app::{App, FocusPane};
use crate::config::Config;
use crate::error::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io;
use std::time::Duration;
use tracing::info;

/// Run the TUI application.
pub fn run(config: Config) -> Result<()> {
    let mut app = App::new(&config);
    for path in &config.databases {
        app.open_database(path);
    }
    info!(databases = config.databases.len(), "starting tui");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main event loop
    let result = run_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// The main TUI event loop.
fn run_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            handle_key(key, app);
        }

        if app.should_quit {
            break;
        }
    }
    info!("tui closed");
    Ok(())
}

/// Handle a key event.
fn handle_key(key: KeyEvent, app: &mut App) {
    // Global keys
    match (key.modifiers, key.code) {
        // Ctrl+Q — quit
        (KeyModifiers::CONTROL, KeyCode::Char('q')) => {
            app.should_quit = true;
            return;
        }
        // F1 — toggle help
        (_, KeyCode::F(1)) => {
            app.show_help = !app.show_help;
            return;
        }
        (_, KeyCode::Esc) if app.show_help => {
            app.show_help = false;
            return;
        }
        // Tab — cycle focus, unless it accepts a suggestion
        (KeyModifiers::NONE, KeyCode::Tab)
            if !(app.autocomplete.active && app.focus == FocusPane::Editor) =>
        {
            app.cycle_focus();
            return;
        }
        // Ctrl+D — toggle sidebar
        (KeyModifiers::CONTROL, KeyCode::Char('d')) => {
            app.toggle_sidebar();
            return;
        }
        // Ctrl+L — clear editor
        (KeyModifiers::CONTROL, KeyCode::Char('l')) => {
            app.clear_editor();
            app.autocomplete.dismiss();
            return;
        }
        // Ctrl+T — switch between Result and History
        (KeyModifiers::CONTROL, KeyCode::Char('t')) => {
            app.toggle_result_tab();
            return;
        }
        // Ctrl+Enter or F5 — execute
        (KeyModifiers::CONTROL, KeyCode::Enter) | (_, KeyCode::F(5)) => {
            app.autocomplete.dismiss();
            app.execute_editor();
            return;
        }
        (KeyModifiers::CONTROL, KeyCode::Up) => {
            app.history_prev();
            return;
        }
        (KeyModifiers::CONTROL, KeyCode::Down) => {
            app.history_next();
            return;
        }
        _ => {}
    }

    match app.focus {
        FocusPane::Editor => handle_editor_key(key, app),
        FocusPane::Results => match key.code {
            KeyCode::Up => app.scroll_results_up(),
            KeyCode::Down => app.scroll_results_down(),
            KeyCode::Left => app.scroll_results_left(),
            KeyCode::Right => app.scroll_results_right(),
            KeyCode::Char('[') => app.prev_result_set(),
            KeyCode::Char(']') => app.next_result_set(),
            _ => {}
        },
        FocusPane::Sidebar => match key.code {
            KeyCode::Up => app.scroll_sidebar_up(),
            KeyCode::Down => app.scroll_sidebar_down(),
            KeyCode::Enter => app.activate_selected(),
            KeyCode::Char('s') => app.select_top_rows(),
            KeyCode::Char('x') => app.prepare_drop_table(),
            KeyCode::Char('n') => app.prepare_create_table(),
            KeyCode::Char('r') => app.remove_selected_database(),
            KeyCode::Char('e') => app.expand_all(),
            KeyCode::Char('c') => app.collapse_all(),
            _ => {}
        },
    }
}

fn handle_editor_key(key: KeyEvent, app: &mut App) {
    // If autocomplete is active, intercept navigation keys
    if app.autocomplete.active {
        match key.code {
            KeyCode::Esc => {
                app.autocomplete.dismiss();
                return;
            }
            KeyCode::Up => {
                app.autocomplete.prev();
                return;
            }
            KeyCode::Down => {
                app.autocomplete.next();
                return;
            }
            KeyCode::Tab | KeyCode::Enter => {
                accept_suggestion(app);
                return;
            }
            _ => {}
        }
    }

    app.editor.input(key);
    app.refresh_highlights();

    let (row, col) = app.editor.cursor();
    let tables = app
        .workspace
        .active()
        .map(|db| db.tables.clone())
        .unwrap_or_default();
    app.autocomplete
        .update(app.editor.lines(), row, col, &tables);
}

/// Replace the typed prefix with the selected suggestion.
fn accept_suggestion(app: &mut App) {
    if let Some(word) = app.autocomplete.selected_word().map(str::to_string) {
        for _ in 0..app.autocomplete.prefix.chars().count() {
            app.editor
                .input(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        }
        for ch in word.chars() {
            app.editor
                .input(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
        }
        app.refresh_highlights();
    }
    app.autocomplete.dismiss();
}
