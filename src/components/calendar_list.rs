use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use remindkit::calendar::{Calendar, Rgb};

use crate::theme;

pub struct CalendarList;

impl CalendarList {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        calendars: &[Calendar],
        selected_index: usize,
        focused: bool,
    ) {
        let theme = theme::current();
        let border_style = if focused { theme.focus_border } else { theme.border };

        let block = Block::default()
            .title(" Lists ")
            .title_style(theme.header)
            .borders(Borders::ALL)
            .border_style(border_style);

        if calendars.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let msg = Paragraph::new("No lists yet").style(theme.dim);
            frame.render_widget(msg, inner);
            return;
        }

        let inner_w = area.width.saturating_sub(2) as usize;
        let items: Vec<ListItem> = calendars
            .iter()
            .enumerate()
            .map(|(i, calendar)| {
                let is_selected = i == selected_index;
                let dot = Span::styled(" \u{25cf} ", Style::default().fg(list_color(calendar)));
                let title = truncate(&calendar.title, inner_w.saturating_sub(3));
                let title = if is_selected {
                    let style = if focused { theme.selected } else { theme.header };
                    Span::styled(title, style)
                } else {
                    Span::raw(title)
                };
                ListItem::new(Line::from(vec![dot, title]))
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }
}

fn list_color(calendar: &Calendar) -> Color {
    match calendar.color {
        Some(Rgb(r, g, b)) => Color::Rgb(r, g, b),
        None => Color::White,
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max > 3 {
        let kept: String = s.chars().take(max - 3).collect();
        format!("{kept}...")
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("Groceries", 20), "Groceries");
        assert_eq!(truncate("Groceries", 6), "Gro...");
        assert_eq!(truncate("Épicerie", 3), "Épi");
    }
}
