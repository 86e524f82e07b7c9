use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, Focus};
use crate::theme;

pub struct StatusBar;

impl StatusBar {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = theme::current();
        let w = area.width as usize;

        let focus = match app.focus {
            Focus::Lists => "Lists",
            Focus::Reminders => "Reminders",
        };
        let left = format!(" [{}] {} ", app.filter.label(), focus);

        // Show status message if present, otherwise context-aware hints
        let right = if let Some(ref msg) = app.status_message {
            format!(" {} ", msg)
        } else if w >= 90 {
            " jk:Move Tab:Pane f:Filter a:Add A:New list Sp:Done d:Del r:Refresh ?:Help q:Quit "
                .to_string()
        } else if w >= 50 {
            " jk:Move Tab:Pane a:Add Sp:Done ?:Help q:Quit ".to_string()
        } else {
            " ?:Help q:Quit ".to_string()
        };

        let padding = " ".repeat(w.saturating_sub(left.len() + right.chars().count()));

        let line = Line::from(vec![
            Span::styled(left, theme.status),
            Span::styled(padding, theme.status),
            Span::styled(right, theme.status),
        ]);

        frame.render_widget(Paragraph::new(line).style(theme.status), area);
    }
}
