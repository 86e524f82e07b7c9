pub mod calendar;
#[cfg(target_os = "macos")]
pub mod eventkit;
pub mod memory;
pub mod predicate;
pub mod reminder;
pub mod store;

pub use calendar::{Calendar, CalendarDraft, Rgb, Source};
#[cfg(target_os = "macos")]
pub use eventkit::EventKitStore;
pub use memory::MemoryStore;
pub use predicate::Predicate;
pub use reminder::{DateComponents, Priority, Reminder, ReminderDraft};
pub use store::{AuthorizationStatus, EventStore, FetchId, FetchOutcome};
