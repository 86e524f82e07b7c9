use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Local;

use crate::error::{Error, ItemKind, Result};

use super::calendar::{Calendar, CalendarDraft, Source};
use super::predicate::Predicate;
use super::reminder::{Reminder, ReminderDraft};
use super::store::{AuthorizationStatus, EventStore, FetchId, FetchOutcome};

/// Error domain of failures raised by [`MemoryStore`].
pub const DOMAIN: &str = "MemoryStore";

// Mirror the EventKit error codes for the same conditions.
const NO_CALENDAR: i64 = 1;
const CALENDAR_DOES_NOT_ALLOW_REMINDERS: i64 = 17;

/// Event store kept entirely in process memory.
///
/// Serves tests, the demo backend of the terminal browser and hosts without
/// EventKit. Access is granted or denied by a scripted answer.
pub struct MemoryStore {
    state: Mutex<State>,
}

struct State {
    answer: bool,
    decided: Option<bool>,
    source: Source,
    calendars: Vec<Calendar>,
    reminders: Vec<Reminder>,
    next_id: u64,
    fail_next_write: Option<Error>,
    fetch_unavailable: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// A store that grants access when asked.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                answer: true,
                decided: None,
                source: Source {
                    id: "local".to_string(),
                    title: "On My Computer".to_string(),
                },
                calendars: Vec::new(),
                reminders: Vec::new(),
                next_id: 1,
                fail_next_write: None,
                fetch_unavailable: false,
            }),
        }
    }

    /// A store whose user answers `granted` to the access prompt.
    pub fn answering(granted: bool) -> Self {
        let store = Self::new();
        store.lock().answer = granted;
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a reminder list directly, bypassing failure injection.
    pub fn insert_calendar(&self, title: &str) -> Calendar {
        let mut state = self.lock();
        let draft = CalendarDraft {
            title: title.to_string(),
            source: Some(state.source.clone()),
        };
        state.add_calendar(&draft)
    }

    /// Add a reminder directly, bypassing failure injection.
    pub fn insert_reminder(&self, draft: &ReminderDraft) -> Result<Reminder> {
        self.lock().add_reminder(draft)
    }

    /// Make the next save or remove fail with `error`.
    pub fn fail_next_write(&self, error: Error) {
        self.lock().fail_next_write = Some(error);
    }

    /// While set, fetches complete without a result, as EventKit does when
    /// the query itself fails.
    pub fn set_fetch_unavailable(&self, unavailable: bool) {
        self.lock().fetch_unavailable = unavailable;
    }
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}-{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn take_failure(&mut self) -> Result<()> {
        match self.fail_next_write.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn add_calendar(&mut self, draft: &CalendarDraft) -> Calendar {
        let calendar = Calendar {
            id: self.next_id("calendar"),
            title: draft.title.clone(),
            source: draft.source.clone(),
            color: None,
        };
        self.calendars.push(calendar.clone());
        calendar
    }

    fn add_reminder(&mut self, draft: &ReminderDraft) -> Result<Reminder> {
        let (calendar_id, calendar_title) = self
            .calendars
            .iter()
            .find(|c| c.id == draft.calendar_id)
            .map(|c| (c.id.clone(), c.title.clone()))
            .ok_or_else(|| Error::store(DOMAIN, NO_CALENDAR, "No calendar has been set."))?;
        let reminder = Reminder {
            id: self.next_id("reminder"),
            title: draft.title.clone(),
            calendar_id,
            calendar_title,
            start: draft.start,
            due: draft.due,
            priority: draft.priority.unwrap_or_default(),
            notes: draft.notes.clone(),
            completed: false,
            completion_date: None,
        };
        self.reminders.push(reminder.clone());
        Ok(reminder)
    }
}

impl EventStore for MemoryStore {
    fn authorization_status(&self) -> AuthorizationStatus {
        match self.lock().decided {
            Some(true) => AuthorizationStatus::Authorized,
            _ => AuthorizationStatus::Denied,
        }
    }

    fn request_access(&self) -> Result<bool> {
        let mut state = self.lock();
        let answer = state.answer;
        Ok(*state.decided.get_or_insert(answer))
    }

    fn calendars(&self) -> Vec<Calendar> {
        self.lock().calendars.clone()
    }

    fn default_source(&self) -> Option<Source> {
        Some(self.lock().source.clone())
    }

    fn calendar(&self, identifier: &str) -> Option<Calendar> {
        self.lock()
            .calendars
            .iter()
            .find(|c| c.id == identifier)
            .cloned()
    }

    fn save_calendar(&self, draft: &CalendarDraft) -> Result<Calendar> {
        let mut state = self.lock();
        state.take_failure()?;
        if draft.source.is_none() {
            return Err(Error::store(
                DOMAIN,
                CALENDAR_DOES_NOT_ALLOW_REMINDERS,
                "The calendar has no source.",
            ));
        }
        Ok(state.add_calendar(draft))
    }

    fn remove_calendar(&self, calendar: &Calendar) -> Result<()> {
        let mut state = self.lock();
        state.take_failure()?;
        let before = state.calendars.len();
        state.calendars.retain(|c| c.id != calendar.id);
        if state.calendars.len() == before {
            return Err(Error::not_found(ItemKind::Calendar, calendar.id.clone()));
        }
        state.reminders.retain(|r| r.calendar_id != calendar.id);
        Ok(())
    }

    fn fetch_reminders(&self, _id: FetchId, predicate: &Predicate) -> FetchOutcome {
        let state = self.lock();
        if state.fetch_unavailable {
            return FetchOutcome::Completed(None);
        }
        let found = state
            .reminders
            .iter()
            .filter(|r| predicate.matches(r))
            .cloned()
            .collect();
        FetchOutcome::Completed(Some(found))
    }

    // Fetches finish before `fetch_reminders` returns; nothing is in flight.
    fn cancel_fetch(&self, _id: FetchId) {}

    fn reminder(&self, identifier: &str) -> Option<Reminder> {
        self.lock()
            .reminders
            .iter()
            .find(|r| r.id == identifier)
            .cloned()
    }

    fn save_reminder(&self, draft: &ReminderDraft) -> Result<Reminder> {
        let mut state = self.lock();
        state.take_failure()?;
        state.add_reminder(draft)
    }

    fn remove_reminder(&self, reminder: &Reminder) -> Result<()> {
        let mut state = self.lock();
        state.take_failure()?;
        let before = state.reminders.len();
        state.reminders.retain(|r| r.id != reminder.id);
        if state.reminders.len() == before {
            return Err(Error::not_found(ItemKind::Reminder, reminder.id.clone()));
        }
        Ok(())
    }

    fn set_completed(&self, reminder: &Reminder, completed: bool) -> Result<Reminder> {
        let mut state = self.lock();
        state.take_failure()?;
        let stored = state
            .reminders
            .iter_mut()
            .find(|r| r.id == reminder.id)
            .ok_or_else(|| Error::not_found(ItemKind::Reminder, reminder.id.clone()))?;
        stored.completed = completed;
        stored.completion_date = completed.then(Local::now);
        Ok(stored.clone())
    }
}
