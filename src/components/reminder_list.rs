use chrono::Local;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use remindkit::calendar::{Priority, Reminder};

use super::calendar_list::truncate;
use crate::theme;

pub struct ReminderList;

impl ReminderList {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        title: &str,
        reminders: &[Reminder],
        selected_index: usize,
        focused: bool,
    ) {
        let theme = theme::current();
        let w = area.width as usize;

        let title = if w >= 25 {
            format!(" {} ({}) ", title, reminders.len())
        } else {
            format!(" {} ", title)
        };

        let border_style = if focused { theme.focus_border } else { theme.border };

        let block = Block::default()
            .title(title)
            .title_style(theme.header)
            .borders(Borders::ALL)
            .border_style(border_style);

        if reminders.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let msg = Paragraph::new("No reminders").style(theme.dim);
            frame.render_widget(msg, inner);
            return;
        }

        let inner_w = area.width.saturating_sub(2) as usize;
        let now = Local::now();

        let items: Vec<ListItem> = reminders
            .iter()
            .enumerate()
            .map(|(i, reminder)| {
                let checkbox = if reminder.completed { "[x]" } else { "[ ]" };
                let title_style = if reminder.completed {
                    Style::default().add_modifier(Modifier::DIM | Modifier::CROSSED_OUT)
                } else {
                    Style::default()
                };

                // The selection stays visible, muted, while the lists pane has focus.
                let highlight = (i == selected_index).then_some(if focused {
                    theme.selected
                } else {
                    theme.header
                });
                let row_style = |style: Style| highlight.unwrap_or(style);

                let mut spans = vec![
                    Span::styled(format!(" {} ", checkbox), row_style(Style::default())),
                    Span::styled(priority_mark(reminder.priority), row_style(theme.overdue)),
                    Span::styled(
                        truncate(&reminder.title, inner_w.saturating_sub(10)),
                        row_style(title_style),
                    ),
                ];

                // Due date if there's room
                if let Some(due) = reminder.due {
                    let label = match (due.to_naive_date_time(), due.has_time()) {
                        (Some(dt), true) => format!(" {}", dt.format("%m/%d %H:%M")),
                        (Some(dt), false) => format!(" {}", dt.format("%m/%d")),
                        (None, _) => String::new(),
                    };
                    let overdue = !reminder.completed
                        && due.to_local().is_some_and(|at| at < now);
                    let style = if overdue { theme.overdue } else { theme.dim };
                    if spans.iter().map(|s| s.width()).sum::<usize>() + label.len() < inner_w {
                        spans.push(Span::styled(label, style));
                    }
                }

                ListItem::new(Line::from(spans))
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }
}

fn priority_mark(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "!!! ",
        Priority::Medium => "!! ",
        Priority::Low => "! ",
        Priority::None => "",
    }
}

#[cfg(test)]
mod tests {
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;

    fn reminder(id: &str, title: &str) -> Reminder {
        Reminder {
            id: id.to_string(),
            title: title.to_string(),
            calendar_id: "calendar-1".to_string(),
            calendar_title: "Groceries".to_string(),
            start: None,
            due: None,
            priority: Priority::None,
            notes: None,
            completed: false,
            completion_date: None,
        }
    }

    fn draw(focused: bool) -> Terminal<TestBackend> {
        let reminders = [reminder("reminder-1", "Milk"), reminder("reminder-2", "Eggs")];
        let mut terminal = Terminal::new(TestBackend::new(40, 5)).unwrap();
        terminal
            .draw(|frame| {
                ReminderList::render(frame, frame.area(), "Groceries", &reminders, 1, focused)
            })
            .unwrap();
        terminal
    }

    #[test]
    fn selection_uses_selected_style_when_focused() {
        let terminal = draw(true);
        let buffer = terminal.backend().buffer();
        assert_eq!(buffer[(1u16, 2u16)].bg, theme::current().selected.bg.unwrap());
        assert_ne!(buffer[(1u16, 1u16)].bg, theme::current().selected.bg.unwrap());
    }

    #[test]
    fn selection_stays_marked_when_unfocused() {
        let terminal = draw(false);
        let buffer = terminal.backend().buffer();
        assert!(buffer[(1u16, 2u16)].modifier.contains(Modifier::BOLD));
        assert!(!buffer[(1u16, 1u16)].modifier.contains(Modifier::BOLD));
    }
}
