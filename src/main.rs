mod app;
mod backend;
mod components;
mod config;
mod logging;
mod theme;
mod tui;

use std::time::Duration;

use app::{App, Focus, PromptKind};
use color_eyre::Result;
use config::Config;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};
use remindkit::{AuthorizationStatus, Reminders};

fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::load()?;
    logging::init(&config)?;
    theme::init(&config.theme);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = {
        let _guard = runtime.enter();
        launch(&config)
    };
    // A fetch the store never answers must not hold up exit.
    runtime.shutdown_background();
    result
}

fn launch(config: &Config) -> Result<()> {
    eprintln!("Connecting to Reminders...");
    let store = backend::open(config.backend)?;
    let (kit, main_loop) = Reminders::with_current_runtime(store)?;
    let mut app = App::new(kit, main_loop, config.completed_days);
    app.start();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app);
    tui::restore()?;
    result
}

fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    while app.running {
        // The UI thread is the main execution context: deliveries run here.
        app.tick();

        terminal.draw(|frame| {
            let area = frame.area();

            match app.access {
                None => {
                    let msg = ratatui::widgets::Paragraph::new("Waiting for Reminders access...")
                        .style(theme::current().dim);
                    frame.render_widget(msg, area);
                    return;
                }
                Some(AuthorizationStatus::Denied) => {
                    let msg = ratatui::widgets::Paragraph::new(
                        "Reminders access denied.\n\n\
                         Please grant access in:\n\
                         System Settings > Privacy & Security > Reminders\n\n\
                         Press 'q' to quit.",
                    )
                    .style(theme::current().header);
                    frame.render_widget(msg, area);
                    return;
                }
                Some(AuthorizationStatus::Authorized) => {}
            }

            // Main layout: content + status bar
            let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);
            render_panes(frame, layout[0], app);

            if let Some(ref prompt) = app.prompt {
                components::PromptPopup::render(frame, area, prompt);
            }

            if app.show_help {
                render_help(frame, area);
            }

            components::StatusBar::render(frame, layout[1], app);
        })?;

        if let Some(key) = tui::next_key_press(Duration::from_millis(100))? {
            // Clear status message on any key
            app.status_message = None;

            if app.show_help {
                if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
                    app.show_help = false;
                }
                continue;
            }

            if app.prompt.is_some() {
                handle_prompt_input(app, key.code);
                continue;
            }

            handle_normal_input(app, key.code, key.modifiers);
        }
    }

    Ok(())
}

fn handle_normal_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        _ if is_quit(code, modifiers) => app.running = false,
        _ if app.access != Some(AuthorizationStatus::Authorized) => {}
        (KeyCode::Tab, _) | (KeyCode::BackTab, _) => app.toggle_focus(),
        (KeyCode::Left, _) | (KeyCode::Char('h'), _) => app.focus = Focus::Lists,
        (KeyCode::Right, _) | (KeyCode::Char('l'), _) => app.focus = Focus::Reminders,
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => app.move_down(),
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => app.move_up(),
        (KeyCode::Char('f'), _) => app.cycle_filter(),
        (KeyCode::Char('a'), _) => app.open_prompt(PromptKind::NewReminder),
        (KeyCode::Char('A'), _) => app.open_prompt(PromptKind::NewList),
        (KeyCode::Char(' '), _) => app.toggle_selected(),
        (KeyCode::Char('d'), _) => app.delete_selected(),
        (KeyCode::Char('r'), _) => {
            app.refresh_calendars();
            app.status_message = Some("Refreshing...".to_string());
        }
        (KeyCode::Char('?'), _) => app.show_help = true,
        _ => {}
    }
}

/// Quit keys outside popups. `Esc` only closes popups.
fn is_quit(code: KeyCode, modifiers: KeyModifiers) -> bool {
    matches!(
        (code, modifiers),
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL)
    )
}

fn handle_prompt_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.close_prompt(),
        KeyCode::Enter => app.submit_prompt(),
        KeyCode::Backspace => app.prompt_backspace(),
        KeyCode::Char(c) => app.prompt_input_char(c),
        _ => {}
    }
}

fn render_panes(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let lists_w = if area.width >= 100 { 32 } else { 24 };
    let panes = Layout::horizontal([Constraint::Length(lists_w), Constraint::Min(20)]).split(area);

    components::CalendarList::render(
        frame,
        panes[0],
        &app.calendars,
        app.calendar_index,
        app.focus == Focus::Lists,
    );

    let title = app
        .selected_calendar()
        .map(|c| format!("{} \u{00b7} {}", c.title, app.filter.label()))
        .unwrap_or_else(|| "Reminders".to_string());
    components::ReminderList::render(
        frame,
        panes[1],
        &title,
        &app.reminders,
        app.reminder_index,
        app.focus == Focus::Reminders,
    );
}

fn render_help(frame: &mut ratatui::Frame, area: Rect) {
    use ratatui::style::{Color, Modifier, Style};
    use ratatui::text::{Line, Span};
    use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

    let popup_area = components::centered(
        area,
        area.width.clamp(30, 52),
        area.height.clamp(12, 20),
    );

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Keybindings ")
        .title_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let section_style = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let entry = |keys: &'static str, desc: &'static str| {
        Line::from(vec![Span::styled(keys, key_style), Span::raw(desc)])
    };

    let lines = vec![
        Line::from(Span::styled("Navigation", section_style)),
        entry("  j/k       ", "Move selection"),
        entry("  h/l  Tab  ", "Switch between lists and reminders"),
        entry("  f         ", "Cycle To do / Done / All"),
        Line::from(""),
        Line::from(Span::styled("Actions", section_style)),
        entry("  a         ", "Add reminder to selected list"),
        entry("  A         ", "Create a new list"),
        entry("  Space     ", "Toggle reminder completion"),
        entry("  d         ", "Delete selected list or reminder"),
        entry("  r         ", "Refresh"),
        Line::from(""),
        entry("  Esc       ", "Close popup"),
        entry("  q  Ctrl-c ", "Quit"),
    ];

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_keys() {
        assert!(is_quit(KeyCode::Char('q'), KeyModifiers::NONE));
        assert!(is_quit(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!is_quit(KeyCode::Char('c'), KeyModifiers::NONE));
        assert!(!is_quit(KeyCode::Esc, KeyModifiers::NONE));
    }
}
