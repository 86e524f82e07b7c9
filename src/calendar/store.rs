use crate::error::Result;

use super::calendar::{Calendar, CalendarDraft, Source};
use super::predicate::Predicate;
use super::reminder::{Reminder, ReminderDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    Authorized,
    Denied,
}

/// Identifies one in-flight reminder fetch so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The store answered. `None` is the store reporting no result at all.
    Completed(Option<Vec<Reminder>>),
    Cancelled,
}

/// The platform reminders backend.
///
/// Methods block until the store answers; callers run them off the main
/// executor.
pub trait EventStore: Send + Sync + 'static {
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Ask for access, prompting the user only if they have not decided yet.
    fn request_access(&self) -> Result<bool>;

    fn calendars(&self) -> Vec<Calendar>;

    /// Source new reminder lists are created in.
    fn default_source(&self) -> Option<Source>;

    fn calendar(&self, identifier: &str) -> Option<Calendar>;

    fn save_calendar(&self, draft: &CalendarDraft) -> Result<Calendar>;

    fn remove_calendar(&self, calendar: &Calendar) -> Result<()>;

    fn fetch_reminders(&self, id: FetchId, predicate: &Predicate) -> FetchOutcome;

    /// Cancel a fetch started with `id`. Unknown or finished ids are ignored.
    fn cancel_fetch(&self, id: FetchId);

    fn reminder(&self, identifier: &str) -> Option<Reminder>;

    fn save_reminder(&self, draft: &ReminderDraft) -> Result<Reminder>;

    fn remove_reminder(&self, reminder: &Reminder) -> Result<()>;

    fn set_completed(&self, reminder: &Reminder, completed: bool) -> Result<Reminder>;
}
