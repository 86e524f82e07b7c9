use std::collections::HashMap;
use std::sync::{mpsc, Mutex, MutexGuard, PoisonError};

use block2::RcBlock;
use chrono::{DateTime, Local, TimeZone};
use objc2::rc::Retained;
use objc2::runtime::{AnyObject, Bool};
use objc2_event_kit::{
    EKAuthorizationStatus, EKCalendar, EKEntityType, EKEventStore, EKReminder, EKSource,
};
use objc2_foundation::{NSArray, NSDate, NSDateComponents, NSError, NSPredicate, NSString};

use crate::error::{Error, ItemKind, Result};

use super::calendar::{Calendar, CalendarDraft, Rgb, Source};
use super::predicate::Predicate;
use super::reminder::{DateComponents, Priority, Reminder, ReminderDraft};
use super::store::{AuthorizationStatus, EventStore, FetchId, FetchOutcome};

/// Seconds between Unix epoch (1970-01-01) and NSDate reference date (2001-01-01)
const NSDATE_UNIX_OFFSET: f64 = 978307200.0;

/// `NSDateComponentUndefined`, the value of an unset component.
const UNDEFINED_COMPONENT: isize = isize::MAX;

struct PendingFetch {
    request: Retained<AnyObject>,
    tx: mpsc::Sender<FetchOutcome>,
}

/// [`EventStore`] backed by EventKit's `EKEventStore`.
pub struct EventKitStore {
    store: Retained<EKEventStore>,
    pending: Mutex<HashMap<FetchId, PendingFetch>>,
}

// EKEventStore accepts calls from any thread. Objective-C objects never
// leave this module: everything handed out is converted to plain values.
unsafe impl Send for EventKitStore {}
unsafe impl Sync for EventKitStore {}

impl EventKitStore {
    pub fn new() -> Result<Self> {
        let store = unsafe { EKEventStore::new() };
        Ok(Self {
            store,
            pending: Mutex::new(HashMap::new()),
        })
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<FetchId, PendingFetch>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ek_calendar(&self, identifier: &str) -> Option<Retained<EKCalendar>> {
        let identifier = NSString::from_str(identifier);
        unsafe { self.store.calendarWithIdentifier(&identifier) }
    }

    fn ek_source(&self, identifier: &str) -> Option<Retained<EKSource>> {
        let identifier = NSString::from_str(identifier);
        unsafe { self.store.sourceWithIdentifier(&identifier) }
    }

    fn ek_reminder(&self, identifier: &str) -> Option<Retained<EKReminder>> {
        let identifier = NSString::from_str(identifier);
        let item = unsafe { self.store.calendarItemWithIdentifier(&identifier) }?;
        item.downcast::<EKReminder>().ok()
    }

    fn ek_calendars(&self, identifiers: Option<&[String]>) -> Option<Retained<NSArray<EKCalendar>>> {
        let calendars: Vec<Retained<EKCalendar>> = identifiers?
            .iter()
            .filter_map(|id| self.ek_calendar(id))
            .collect();
        Some(NSArray::from_retained_slice(&calendars))
    }

    fn ek_predicate(&self, predicate: &Predicate) -> Retained<NSPredicate> {
        let calendars = self.ek_calendars(predicate.calendars());
        let calendars = calendars.as_deref();
        unsafe {
            match predicate {
                Predicate::Reminders { .. } => self.store.predicateForRemindersInCalendars(calendars),
                Predicate::Incomplete {
                    starting, ending, ..
                } => self
                    .store
                    .predicateForIncompleteRemindersWithDueDateStarting_ending_calendars(
                        starting.as_ref().map(datetime_to_nsdate).as_deref(),
                        ending.as_ref().map(datetime_to_nsdate).as_deref(),
                        calendars,
                    ),
                Predicate::Completed {
                    starting, ending, ..
                } => self
                    .store
                    .predicateForCompletedRemindersWithCompletionDateStarting_ending_calendars(
                        starting.as_ref().map(datetime_to_nsdate).as_deref(),
                        ending.as_ref().map(datetime_to_nsdate).as_deref(),
                        calendars,
                    ),
            }
        }
    }
}

impl EventStore for EventKitStore {
    fn authorization_status(&self) -> AuthorizationStatus {
        let status =
            unsafe { EKEventStore::authorizationStatusForEntityType(EKEntityType::Reminder) };
        match status {
            EKAuthorizationStatus::FullAccess => AuthorizationStatus::Authorized,
            _ => AuthorizationStatus::Denied,
        }
    }

    fn request_access(&self) -> Result<bool> {
        let status =
            unsafe { EKEventStore::authorizationStatusForEntityType(EKEntityType::Reminder) };

        match status {
            EKAuthorizationStatus::FullAccess => return Ok(true),
            EKAuthorizationStatus::Denied | EKAuthorizationStatus::Restricted => {
                return Ok(false);
            }
            _ => {}
        }

        let (tx, rx) = mpsc::channel();
        let block = RcBlock::new(move |granted: Bool, error: *mut NSError| {
            let outcome = match unsafe { error.as_ref() } {
                Some(error) if !granted.as_bool() => Err(store_error(error)),
                _ => Ok(granted.as_bool()),
            };
            let _ = tx.send(outcome);
        });

        unsafe {
            self.store
                .requestFullAccessToRemindersWithCompletion(&*block as *const _ as *mut _);
        }

        rx.recv().map_err(|_| {
            Error::store(
                "EKEventStore",
                0,
                "Failed to receive reminders access response",
            )
        })?
    }

    fn calendars(&self) -> Vec<Calendar> {
        let ek_calendars = unsafe { self.store.calendarsForEntityType(EKEntityType::Reminder) };

        let mut calendars = Vec::new();
        for i in 0..ek_calendars.len() {
            calendars.push(convert_calendar(&ek_calendars.objectAtIndex(i)));
        }
        calendars
    }

    fn default_source(&self) -> Option<Source> {
        let calendar = unsafe { self.store.defaultCalendarForNewReminders() }?;
        let source = unsafe { calendar.source() }?;
        Some(convert_source(&source))
    }

    fn calendar(&self, identifier: &str) -> Option<Calendar> {
        self.ek_calendar(identifier).map(|c| convert_calendar(&c))
    }

    fn save_calendar(&self, draft: &CalendarDraft) -> Result<Calendar> {
        let calendar = unsafe {
            EKCalendar::calendarForEntityType_eventStore(EKEntityType::Reminder, &self.store)
        };
        let source = draft
            .source
            .as_ref()
            .and_then(|source| self.ek_source(&source.id));
        unsafe {
            calendar.setTitle(&NSString::from_str(&draft.title));
            calendar.setSource(source.as_deref());
            self.store
                .saveCalendar_commit_error(&calendar, true)
                .map_err(|e| store_error(&e))?;
        }
        Ok(convert_calendar(&calendar))
    }

    fn remove_calendar(&self, calendar: &Calendar) -> Result<()> {
        let ek_calendar = self
            .ek_calendar(&calendar.id)
            .ok_or_else(|| Error::not_found(ItemKind::Calendar, calendar.id.clone()))?;
        unsafe {
            self.store
                .removeCalendar_commit_error(&ek_calendar, true)
                .map_err(|e| store_error(&e))
        }
    }

    fn fetch_reminders(&self, id: FetchId, predicate: &Predicate) -> FetchOutcome {
        let predicate = self.ek_predicate(predicate);

        let (tx, rx) = mpsc::channel();
        let done = tx.clone();
        let block = RcBlock::new(move |reminders: *mut NSArray<EKReminder>| {
            let found = unsafe { reminders.as_ref() }.map(|list| {
                (0..list.len())
                    .map(|i| convert_reminder(&list.objectAtIndex(i)))
                    .collect()
            });
            let _ = done.send(FetchOutcome::Completed(found));
        });

        let request = unsafe {
            self.store
                .fetchRemindersMatchingPredicate_completion(&predicate, &block)
        };
        self.pending().insert(id, PendingFetch { request, tx });

        let outcome = rx.recv().unwrap_or(FetchOutcome::Cancelled);
        self.pending().remove(&id);
        outcome
    }

    fn cancel_fetch(&self, id: FetchId) {
        let Some(fetch) = self.pending().remove(&id) else {
            return;
        };
        unsafe { self.store.cancelFetchRequest(&fetch.request) };
        let _ = fetch.tx.send(FetchOutcome::Cancelled);
    }

    fn reminder(&self, identifier: &str) -> Option<Reminder> {
        self.ek_reminder(identifier).map(|r| convert_reminder(&r))
    }

    fn save_reminder(&self, draft: &ReminderDraft) -> Result<Reminder> {
        let calendar = self.ek_calendar(&draft.calendar_id);
        let start = draft.start.as_ref().map(components_to_ns);
        let due = draft.due.as_ref().map(components_to_ns);
        let notes = draft.notes.as_deref().map(NSString::from_str);
        let priority = draft.priority.unwrap_or_default().level() as usize;

        let reminder = unsafe { EKReminder::reminderWithEventStore(&self.store) };
        unsafe {
            reminder.setTitle(Some(&NSString::from_str(&draft.title)));
            // A missing calendar is left unset; the save reports it.
            reminder.setCalendar(calendar.as_deref());
            reminder.setStartDateComponents(start.as_deref());
            reminder.setDueDateComponents(due.as_deref());
            reminder.setPriority(priority);
            reminder.setNotes(notes.as_deref());
            self.store
                .saveReminder_commit_error(&reminder, true)
                .map_err(|e| store_error(&e))?;
        }
        Ok(convert_reminder(&reminder))
    }

    fn remove_reminder(&self, reminder: &Reminder) -> Result<()> {
        let ek_reminder = self
            .ek_reminder(&reminder.id)
            .ok_or_else(|| Error::not_found(ItemKind::Reminder, reminder.id.clone()))?;
        unsafe {
            self.store
                .removeReminder_commit_error(&ek_reminder, true)
                .map_err(|e| store_error(&e))
        }
    }

    fn set_completed(&self, reminder: &Reminder, completed: bool) -> Result<Reminder> {
        let ek_reminder = self
            .ek_reminder(&reminder.id)
            .ok_or_else(|| Error::not_found(ItemKind::Reminder, reminder.id.clone()))?;
        unsafe {
            ek_reminder.setCompleted(completed);
            self.store
                .saveReminder_commit_error(&ek_reminder, true)
                .map_err(|e| store_error(&e))?;
        }
        Ok(convert_reminder(&ek_reminder))
    }
}

fn store_error(error: &NSError) -> Error {
    Error::Store {
        domain: error.domain().to_string(),
        code: error.code() as i64,
        message: error.localizedDescription().to_string(),
    }
}

fn convert_source(source: &EKSource) -> Source {
    unsafe {
        Source {
            id: source.sourceIdentifier().to_string(),
            title: source.title().to_string(),
        }
    }
}

fn convert_calendar(cal: &EKCalendar) -> Calendar {
    let id = unsafe { cal.calendarIdentifier().to_string() };
    let title = unsafe { cal.title().to_string() };
    let source = unsafe { cal.source().map(|s| convert_source(&s)) };
    Calendar {
        id,
        title,
        source,
        color: calendar_color(cal),
    }
}

fn convert_reminder(reminder: &EKReminder) -> Reminder {
    unsafe {
        let (calendar_id, calendar_title) = reminder
            .calendar()
            .map(|cal| (cal.calendarIdentifier().to_string(), cal.title().to_string()))
            .unwrap_or_default();

        Reminder {
            id: reminder.calendarItemIdentifier().to_string(),
            title: reminder.title().to_string(),
            calendar_id,
            calendar_title,
            start: reminder.startDateComponents().map(|c| components_from_ns(&c)),
            due: reminder.dueDateComponents().map(|c| components_from_ns(&c)),
            priority: Priority::from_level(reminder.priority()),
            notes: reminder.notes().map(|s| s.to_string()),
            completed: reminder.isCompleted(),
            completion_date: reminder.completionDate().map(|d| nsdate_to_datetime(&d)),
        }
    }
}

fn calendar_color(cal: &EKCalendar) -> Option<Rgb> {
    unsafe {
        let cg_color = cal.CGColor()?;
        use objc2::msg_send;
        let num_components: usize = msg_send![&*cg_color, numberOfComponents];
        if num_components < 3 {
            return None;
        }
        let components: *const f64 = msg_send![&*cg_color, components];
        let r = *components;
        let g = *components.add(1);
        let b = *components.add(2);
        Some(Rgb((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8))
    }
}

fn components_from_ns(components: &NSDateComponents) -> DateComponents {
    let field = |value: isize| (value != UNDEFINED_COMPONENT).then_some(value);
    DateComponents {
        year: field(components.year()).map(|v| v as i32),
        month: field(components.month()).map(|v| v as u32),
        day: field(components.day()).map(|v| v as u32),
        hour: field(components.hour()).map(|v| v as u32),
        minute: field(components.minute()).map(|v| v as u32),
        second: field(components.second()).map(|v| v as u32),
    }
}

fn components_to_ns(components: &DateComponents) -> Retained<NSDateComponents> {
    let ns = NSDateComponents::new();
    if let Some(year) = components.year {
        ns.setYear(year as isize);
    }
    if let Some(month) = components.month {
        ns.setMonth(month as isize);
    }
    if let Some(day) = components.day {
        ns.setDay(day as isize);
    }
    if let Some(hour) = components.hour {
        ns.setHour(hour as isize);
    }
    if let Some(minute) = components.minute {
        ns.setMinute(minute as isize);
    }
    if let Some(second) = components.second {
        ns.setSecond(second as isize);
    }
    ns
}

fn datetime_to_nsdate(dt: &DateTime<Local>) -> Retained<NSDate> {
    let unix_ts = dt.timestamp() as f64;
    let nsdate_ts = unix_ts - NSDATE_UNIX_OFFSET;
    NSDate::dateWithTimeIntervalSinceReferenceDate(nsdate_ts)
}

fn nsdate_to_datetime(date: &NSDate) -> DateTime<Local> {
    let nsdate_ts = date.timeIntervalSinceReferenceDate();
    let unix_ts = (nsdate_ts + NSDATE_UNIX_OFFSET) as i64;
    Local
        .timestamp_opt(unix_ts, 0)
        .single()
        .unwrap_or_else(Local::now)
}
