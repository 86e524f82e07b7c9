use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{Prompt, PromptKind};
use crate::theme;

pub struct PromptPopup;

impl PromptPopup {
    pub fn render(frame: &mut Frame, area: Rect, prompt: &Prompt) {
        let theme = theme::current();

        // Up to 60 wide, at least 30 when the terminal allows it
        let popup_area = super::centered(area, area.width.clamp(30, 60), 6);

        frame.render_widget(Clear, popup_area);

        let (title, hint) = match prompt.kind {
            PromptKind::NewReminder => (" New Reminder ", "title !high|!medium|!low @2026-10-20"),
            PromptKind::NewList => (" New List ", "list title"),
        };

        let block = Block::default()
            .title(title)
            .title_style(theme.header)
            .borders(Borders::ALL)
            .border_style(theme.focus_border);

        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let rows = Layout::vertical([
            Constraint::Length(1), // input
            Constraint::Length(1), // format hint
            Constraint::Length(1), // spacer
            Constraint::Length(1), // keys
            Constraint::Min(0),
        ])
        .split(inner);

        let input = Line::from(vec![
            Span::styled("> ", theme.dim),
            Span::styled(format!("{}_", prompt.input), theme.focus_border),
        ]);
        frame.render_widget(Paragraph::new(input), rows[0]);
        frame.render_widget(Paragraph::new(hint).style(theme.dim), rows[1]);

        let keys = Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Save ", theme.dim),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Cancel", theme.dim),
        ]);
        frame.render_widget(Paragraph::new(keys), rows[3]);
    }
}
