//! Reminders facade over the platform event store.
//!
//! [`Reminders`] forwards every request to an [`EventStore`] backend on a
//! background executor and delivers the outcome on the main executor, both to
//! the per-call completion and to the optional [`Observer`] listener.

pub mod calendar;
pub mod error;
pub mod executor;
pub mod facade;
pub mod observer;

pub use calendar::{
    AuthorizationStatus, Calendar, CalendarDraft, DateComponents, EventStore, FetchId,
    FetchOutcome, MemoryStore, Predicate, Priority, Reminder, ReminderDraft, Source,
};
#[cfg(target_os = "macos")]
pub use calendar::EventKitStore;
pub use error::{Error, ItemKind, Result};
pub use executor::{main_queue, Background, Executor, MainLoop, MainQueue};
pub use facade::{FetchToken, Reminders};
pub use observer::{Observer, StoreEvent};
