use std::cmp::Ordering;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use remindkit::{
    AuthorizationStatus, Calendar, DateComponents, Error, FetchToken, MainLoop, Priority,
    Reminder, ReminderDraft, Reminders, StoreEvent,
};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Focus {
    Lists,
    Reminders,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Filter {
    Incomplete,
    Completed,
    All,
}

impl Filter {
    pub fn next(self) -> Self {
        match self {
            Filter::Incomplete => Filter::Completed,
            Filter::Completed => Filter::All,
            Filter::All => Filter::Incomplete,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Filter::Incomplete => "To do",
            Filter::Completed => "Done",
            Filter::All => "All",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PromptKind {
    NewReminder,
    NewList,
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

/// Results of completions, forwarded to the UI state by the main loop.
enum Message {
    Access(AuthorizationStatus),
    Calendars(Vec<Calendar>),
    Reminders(Vec<Reminder>),
    Failed(String),
}

pub struct App {
    pub running: bool,
    pub access: Option<AuthorizationStatus>,
    pub calendars: Vec<Calendar>,
    pub calendar_index: usize,
    pub reminders: Vec<Reminder>,
    pub reminder_index: usize,
    pub focus: Focus,
    pub filter: Filter,
    pub prompt: Option<Prompt>,
    pub status_message: Option<String>,
    pub show_help: bool,
    completed_days: u32,
    kit: Reminders,
    main_loop: MainLoop,
    events: mpsc::UnboundedReceiver<StoreEvent>,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    fetch: Option<FetchToken>,
}

impl App {
    pub fn new(kit: Reminders, main_loop: MainLoop, completed_days: u32) -> Self {
        let events = kit.subscribe();
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            running: true,
            access: None,
            calendars: Vec::new(),
            calendar_index: 0,
            reminders: Vec::new(),
            reminder_index: 0,
            focus: Focus::Lists,
            filter: Filter::Incomplete,
            prompt: None,
            status_message: None,
            show_help: false,
            completed_days,
            kit,
            main_loop,
            events,
            tx,
            rx,
            fetch: None,
        }
    }

    pub fn start(&mut self) {
        let tx = self.tx.clone();
        self.kit.request_authorization(move |status| {
            let _ = tx.send(Message::Access(status));
        });
    }

    /// Run queued deliveries, then fold their results into the UI state.
    pub fn tick(&mut self) {
        self.main_loop.run_pending();
        while let Ok(message) = self.rx.try_recv() {
            self.handle_message(message);
        }
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_message(&mut self, message: Message) {
        match message {
            Message::Access(status) => {
                self.access = Some(status);
                if status == AuthorizationStatus::Authorized {
                    self.refresh_calendars();
                }
            }
            Message::Calendars(calendars) => {
                let selected = self.selected_calendar().map(|c| c.id.clone());
                self.calendars = calendars;
                self.calendar_index = selected
                    .and_then(|id| self.calendars.iter().position(|c| c.id == id))
                    .unwrap_or(0);
                self.refresh_reminders();
            }
            Message::Reminders(mut reminders) => {
                sort_reminders(&mut reminders);
                self.reminders = reminders;
                self.reminder_index = self
                    .reminder_index
                    .min(self.reminders.len().saturating_sub(1));
            }
            Message::Failed(message) => self.status_message = Some(message),
        }
    }

    fn handle_event(&mut self, event: StoreEvent) {
        tracing::debug!(?event, "store event");
        match event {
            StoreEvent::CalendarCreated(Ok(calendar)) => {
                self.status_message = Some(format!("Created list \"{}\"", calendar.title));
                self.refresh_calendars();
            }
            StoreEvent::CalendarRemoved { result: Ok(()), .. } => {
                self.status_message = Some("List removed".to_string());
                self.refresh_calendars();
            }
            StoreEvent::ReminderCreated(Ok(reminder)) => {
                self.status_message = Some(format!("Added \"{}\"", reminder.title));
                self.refresh_reminders();
            }
            StoreEvent::ReminderRemoved { result: Ok(()), .. } => {
                self.status_message = Some("Reminder removed".to_string());
                self.refresh_reminders();
            }
            StoreEvent::ReminderUpdated(Ok(_)) => self.refresh_reminders(),
            StoreEvent::CalendarCreated(Err(err))
            | StoreEvent::CalendarRemoved { result: Err(err), .. }
            | StoreEvent::ReminderCreated(Err(err))
            | StoreEvent::ReminderRemoved { result: Err(err), .. }
            | StoreEvent::ReminderUpdated(Err(err)) => {
                self.status_message = Some(format!("Error: {err}"));
            }
            StoreEvent::StatusChanged(_) | StoreEvent::Authorized | StoreEvent::Denied => {}
        }
    }

    pub fn selected_calendar(&self) -> Option<&Calendar> {
        self.calendars.get(self.calendar_index)
    }

    pub fn selected_reminder(&self) -> Option<&Reminder> {
        self.reminders.get(self.reminder_index)
    }

    pub fn refresh_calendars(&mut self) {
        let tx = self.tx.clone();
        self.kit.calendars(move |calendars| {
            let _ = tx.send(Message::Calendars(calendars));
        });
    }

    pub fn refresh_reminders(&mut self) {
        if let Some(token) = self.fetch.take() {
            self.kit.cancel(&token);
        }
        let Some(calendar) = self.selected_calendar().cloned() else {
            self.reminders.clear();
            return;
        };

        let scope = std::slice::from_ref(&calendar);
        let tx = self.tx.clone();
        let deliver = move |reminders| {
            let _ = tx.send(Message::Reminders(reminders));
        };
        let token = match self.filter {
            Filter::Incomplete => self.kit.incomplete(None, None, Some(scope), deliver),
            Filter::Completed => {
                let since = Local::now() - Duration::days(i64::from(self.completed_days));
                self.kit.completed(Some(since), None, Some(scope), deliver)
            }
            Filter::All => self.kit.reminders_in(Some(scope), deliver),
        };
        self.fetch = Some(token);
    }

    pub fn move_down(&mut self) {
        match self.focus {
            Focus::Lists => {
                if self.calendar_index + 1 < self.calendars.len() {
                    self.calendar_index += 1;
                    self.on_calendar_changed();
                }
            }
            Focus::Reminders => {
                if self.reminder_index + 1 < self.reminders.len() {
                    self.reminder_index += 1;
                }
            }
        }
    }

    pub fn move_up(&mut self) {
        match self.focus {
            Focus::Lists => {
                if self.calendar_index > 0 {
                    self.calendar_index -= 1;
                    self.on_calendar_changed();
                }
            }
            Focus::Reminders => self.reminder_index = self.reminder_index.saturating_sub(1),
        }
    }

    fn on_calendar_changed(&mut self) {
        self.reminder_index = 0;
        self.refresh_reminders();
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Lists => Focus::Reminders,
            Focus::Reminders => Focus::Lists,
        };
    }

    pub fn cycle_filter(&mut self) {
        self.filter = self.filter.next();
        self.reminder_index = 0;
        self.refresh_reminders();
    }

    // Prompt

    pub fn open_prompt(&mut self, kind: PromptKind) {
        if kind == PromptKind::NewReminder && self.selected_calendar().is_none() {
            self.status_message = Some("Create a list first (A)".to_string());
            return;
        }
        self.prompt = Some(Prompt {
            kind,
            input: String::new(),
        });
    }

    pub fn close_prompt(&mut self) {
        self.prompt = None;
    }

    pub fn prompt_input_char(&mut self, c: char) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.input.push(c);
        }
    }

    pub fn prompt_backspace(&mut self) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.input.pop();
        }
    }

    pub fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        match prompt.kind {
            PromptKind::NewList => {
                let title = prompt.input.trim();
                if title.is_empty() {
                    self.status_message = Some("List title cannot be empty".to_string());
                    return;
                }
                // Outcome arrives as a `CalendarCreated` event.
                self.kit.create_calendar(title, |_| {});
            }
            PromptKind::NewReminder => {
                let Some(calendar) = self.selected_calendar() else {
                    return;
                };
                match parse_reminder_input(&prompt.input) {
                    Some(parsed) => {
                        let mut draft = ReminderDraft::new(parsed.title, calendar);
                        draft.priority = parsed.priority;
                        draft.due = parsed.due;
                        self.kit.create_reminder(draft, |_| {});
                    }
                    None => {
                        self.status_message = Some("Reminder title cannot be empty".to_string())
                    }
                }
            }
        }
    }

    // Mutations on the selection. Store failures arrive as events; an
    // identifier that no longer resolves is only reported to the completion.

    fn report_not_found<T: 'static>(&self) -> impl FnOnce(remindkit::Result<T>) + Send + 'static {
        let tx = self.tx.clone();
        move |result| {
            if let Err(err @ Error::NotFound { .. }) = result {
                let _ = tx.send(Message::Failed(format!("Error: {err}")));
            }
        }
    }

    pub fn delete_selected(&mut self) {
        match self.focus {
            Focus::Lists => {
                if let Some(calendar) = self.selected_calendar() {
                    let id = calendar.id.clone();
                    self.kit.remove_calendar(id, self.report_not_found::<()>());
                }
            }
            Focus::Reminders => {
                if let Some(reminder) = self.selected_reminder() {
                    let id = reminder.id.clone();
                    self.kit.remove_reminder(id, self.report_not_found::<()>());
                }
            }
        }
    }

    pub fn toggle_selected(&mut self) {
        if self.focus != Focus::Reminders {
            return;
        }
        if let Some(reminder) = self.selected_reminder() {
            let (id, completed) = (reminder.id.clone(), !reminder.completed);
            self.kit.set_completed(id, completed, self.report_not_found::<Reminder>());
        }
    }
}

/// Undated reminders last; otherwise by due date, then title.
fn sort_reminders(reminders: &mut [Reminder]) {
    reminders.sort_by(|a, b| {
        let due = |r: &Reminder| r.due.and_then(|d| d.to_naive_date_time());
        let by_due = match (due(a), due(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_due.then_with(|| a.title.cmp(&b.title))
    });
}

#[derive(Debug, PartialEq)]
pub struct ParsedReminder {
    pub title: String,
    pub priority: Option<Priority>,
    pub due: Option<DateComponents>,
}

/// Parse `title [!high|!medium|!low] [@YYYY-MM-DD[THH:MM]]`. Markers may
/// appear anywhere; unrecognised markers stay part of the title.
pub fn parse_reminder_input(input: &str) -> Option<ParsedReminder> {
    let mut words = Vec::new();
    let mut priority = None;
    let mut due = None;

    for word in input.split_whitespace() {
        if let Some(p) = word.strip_prefix('!').and_then(parse_priority) {
            priority = Some(p);
        } else if let Some(d) = word.strip_prefix('@').and_then(parse_due) {
            due = Some(d);
        } else {
            words.push(word);
        }
    }

    if words.is_empty() {
        return None;
    }
    Some(ParsedReminder {
        title: words.join(" "),
        priority,
        due,
    })
}

fn parse_priority(s: &str) -> Option<Priority> {
    match s.to_lowercase().as_str() {
        "high" | "h" | "1" => Some(Priority::High),
        "medium" | "med" | "m" | "5" => Some(Priority::Medium),
        "low" | "l" | "9" => Some(Priority::Low),
        "none" | "0" => Some(Priority::None),
        _ => None,
    }
}

fn parse_due(s: &str) -> Option<DateComponents> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Some(DateComponents::date_time(dt));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(DateComponents::date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_title() {
        let parsed = parse_reminder_input("  Buy   milk ").unwrap();
        assert_eq!(parsed.title, "Buy milk");
        assert_eq!(parsed.priority, None);
        assert_eq!(parsed.due, None);
    }

    #[test]
    fn markers_anywhere() {
        let parsed = parse_reminder_input("!high Call @2026-10-20 mum").unwrap();
        assert_eq!(parsed.title, "Call mum");
        assert_eq!(parsed.priority, Some(Priority::High));
        assert_eq!(
            parsed.due,
            Some(DateComponents::date(NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()))
        );
    }

    #[test]
    fn due_with_time() {
        let parsed = parse_reminder_input("Standup @2026-10-20T09:30").unwrap();
        let due = parsed.due.unwrap();
        assert!(due.has_time());
        assert_eq!(due.hour, Some(9));
        assert_eq!(due.minute, Some(30));
    }

    #[test]
    fn unknown_markers_stay_in_title() {
        let parsed = parse_reminder_input("Fix !bang @home").unwrap();
        assert_eq!(parsed.title, "Fix !bang @home");
    }

    #[test]
    fn markers_alone_are_not_a_reminder() {
        assert_eq!(parse_reminder_input("!low @2026-01-01"), None);
        assert_eq!(parse_reminder_input("   "), None);
    }

    #[test]
    fn filter_cycles_through_all_views() {
        let start = Filter::Incomplete;
        assert_eq!(start.next().next().next(), start);
    }
}
