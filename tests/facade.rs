use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDate, TimeZone};
use remindkit::calendar::memory::DOMAIN;
use remindkit::{
    AuthorizationStatus, DateComponents, Error, EventStore, ItemKind, MainLoop, MemoryStore,
    Priority, ReminderDraft, Reminders, StoreEvent,
};
use tokio::sync::oneshot;
use tokio::time::timeout;

fn setup(store: MemoryStore) -> (Reminders, MainLoop, Arc<MemoryStore>) {
    let store = Arc::new(store);
    let (kit, main) = Reminders::with_current_runtime(store.clone()).unwrap();
    (kit, main, store)
}

/// Run the next delivery queued on the main loop.
async fn deliver(main: &mut MainLoop) {
    let ran = timeout(Duration::from_secs(5), main.turn())
        .await
        .expect("no delivery within 5s");
    assert!(ran, "main queue closed");
}

#[tokio::test]
async fn calendars_come_back_sorted_by_title() {
    let (kit, mut main, store) = setup(MemoryStore::new());
    store.insert_calendar("Work");
    store.insert_calendar("Groceries");
    store.insert_calendar("Errands");

    let (tx, mut rx) = oneshot::channel();
    kit.calendars(move |calendars| {
        let _ = tx.send(calendars);
    });
    deliver(&mut main).await;

    let titles: Vec<_> = rx.try_recv().unwrap().into_iter().map(|c| c.title).collect();
    assert_eq!(titles, ["Errands", "Groceries", "Work"]);
}

#[tokio::test]
async fn fetch_without_result_delivers_empty_list() {
    let (kit, mut main, store) = setup(MemoryStore::new());
    let list = store.insert_calendar("Groceries");
    store.insert_reminder(&ReminderDraft::new("Milk", &list)).unwrap();
    store.set_fetch_unavailable(true);

    let (tx, mut rx) = oneshot::channel();
    kit.reminders_in(None, move |reminders| {
        let _ = tx.send(reminders);
    });
    deliver(&mut main).await;

    assert!(rx.try_recv().unwrap().is_empty());
}

#[tokio::test]
async fn fetch_is_scoped_to_calendars() {
    let (kit, mut main, store) = setup(MemoryStore::new());
    let groceries = store.insert_calendar("Groceries");
    let work = store.insert_calendar("Work");
    store.insert_reminder(&ReminderDraft::new("Milk", &groceries)).unwrap();
    store.insert_reminder(&ReminderDraft::new("Report", &work)).unwrap();

    let (tx, mut rx) = oneshot::channel();
    kit.reminders_in(Some(std::slice::from_ref(&work)), move |reminders| {
        let _ = tx.send(reminders);
    });
    deliver(&mut main).await;

    let titles: Vec<_> = rx.try_recv().unwrap().into_iter().map(|r| r.title).collect();
    assert_eq!(titles, ["Report"]);
}

#[tokio::test]
async fn incomplete_fetch_honours_due_range() {
    let (kit, mut main, store) = setup(MemoryStore::new());
    let list = store.insert_calendar("Work");
    let day = |d| DateComponents::date(NaiveDate::from_ymd_opt(2026, 3, d).unwrap());
    store.insert_reminder(&ReminderDraft::new("Early", &list).due(day(1))).unwrap();
    store.insert_reminder(&ReminderDraft::new("Inside", &list).due(day(10))).unwrap();
    store.insert_reminder(&ReminderDraft::new("Boundary", &list).due(day(20))).unwrap();
    store.insert_reminder(&ReminderDraft::new("Undated", &list)).unwrap();

    let start = Local.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap();
    let end = Local.with_ymd_and_hms(2026, 3, 20, 0, 0, 0).unwrap();
    let (tx, mut rx) = oneshot::channel();
    kit.incomplete(Some(start), Some(end), None, move |reminders| {
        let _ = tx.send(reminders);
    });
    deliver(&mut main).await;

    let titles: Vec<_> = rx.try_recv().unwrap().into_iter().map(|r| r.title).collect();
    assert_eq!(titles, ["Inside"]);
}

#[tokio::test]
async fn cancelled_fetch_never_calls_back() {
    let (kit, mut main, store) = setup(MemoryStore::new());
    let list = store.insert_calendar("Groceries");
    store.insert_reminder(&ReminderDraft::new("Milk", &list)).unwrap();

    let (tx, mut rx) = oneshot::channel();
    let token = kit.reminders_in(None, move |reminders| {
        let _ = tx.send(reminders);
    });
    kit.cancel(&token);
    assert!(token.is_cancelled());
    deliver(&mut main).await;

    // The completion was dropped unused, closing the channel.
    assert_eq!(rx.try_recv(), Err(oneshot::error::TryRecvError::Closed));
}

#[tokio::test]
async fn fetch_tokens_are_distinct() {
    let (kit, mut main, _store) = setup(MemoryStore::new());
    let first = kit.reminders_in(None, |_| {});
    let second = kit.reminders_in(None, |_| {});
    assert_ne!(first.id(), second.id());
    deliver(&mut main).await;
    deliver(&mut main).await;
}

#[tokio::test]
async fn granted_access_is_announced() {
    let (kit, mut main, _store) = setup(MemoryStore::new());
    let mut events = kit.subscribe();

    let (tx, mut rx) = oneshot::channel();
    kit.request_authorization(move |status| {
        let _ = tx.send(status);
    });
    deliver(&mut main).await;

    assert_eq!(rx.try_recv().unwrap(), AuthorizationStatus::Authorized);
    assert_eq!(
        events.try_recv().unwrap(),
        StoreEvent::StatusChanged(AuthorizationStatus::Authorized)
    );
    assert_eq!(events.try_recv().unwrap(), StoreEvent::Authorized);
    assert_eq!(kit.authorization_status(), AuthorizationStatus::Authorized);
}

#[tokio::test]
async fn denied_access_is_announced() {
    let (kit, mut main, _store) = setup(MemoryStore::answering(false));
    let mut events = kit.subscribe();

    let (tx, mut rx) = oneshot::channel();
    kit.request_authorization(move |status| {
        let _ = tx.send(status);
    });
    deliver(&mut main).await;

    assert_eq!(rx.try_recv().unwrap(), AuthorizationStatus::Denied);
    assert_eq!(
        events.try_recv().unwrap(),
        StoreEvent::StatusChanged(AuthorizationStatus::Denied)
    );
    assert_eq!(events.try_recv().unwrap(), StoreEvent::Denied);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn created_calendar_reaches_completion_and_listener() {
    let (kit, mut main, store) = setup(MemoryStore::new());
    let mut events = kit.subscribe();

    let (tx, mut rx) = oneshot::channel();
    kit.create_calendar("Groceries", move |result| {
        let _ = tx.send(result);
    });
    deliver(&mut main).await;

    let calendar = rx.try_recv().unwrap().unwrap();
    assert_eq!(calendar.title, "Groceries");
    assert_eq!(calendar.source, store.default_source());
    assert_eq!(events.try_recv().unwrap(), StoreEvent::CalendarCreated(Ok(calendar)));
}

#[tokio::test]
async fn failed_reminder_create_reaches_completion_and_listener() {
    let (kit, mut main, store) = setup(MemoryStore::new());
    let list = store.insert_calendar("Groceries");
    let mut events = kit.subscribe();
    let failure = Error::store(DOMAIN, 99, "disk full");
    store.fail_next_write(failure.clone());

    let (tx, mut rx) = oneshot::channel();
    kit.create_reminder(ReminderDraft::new("Milk", &list), move |result| {
        let _ = tx.send(result);
    });
    deliver(&mut main).await;

    assert_eq!(rx.try_recv().unwrap(), Err(failure.clone()));
    assert_eq!(events.try_recv().unwrap(), StoreEvent::ReminderCreated(Err(failure)));
}

#[tokio::test]
async fn reminder_priority_defaults_to_none() {
    let (kit, mut main, store) = setup(MemoryStore::new());
    let list = store.insert_calendar("Groceries");

    let (tx, mut rx) = oneshot::channel();
    kit.create_reminder(ReminderDraft::new("Milk", &list), move |result| {
        let _ = tx.send(result);
    });
    deliver(&mut main).await;

    let reminder = rx.try_recv().unwrap().unwrap();
    assert_eq!(reminder.priority, Priority::None);
    assert_eq!(reminder.calendar_id, list.id);
}

#[tokio::test]
async fn removing_unknown_reminder_skips_listener() {
    let (kit, mut main, _store) = setup(MemoryStore::new());
    let mut events = kit.subscribe();

    let (tx, mut rx) = oneshot::channel();
    kit.remove_reminder("doesnotexist", move |result| {
        let _ = tx.send(result);
    });
    deliver(&mut main).await;

    let err = rx.try_recv().unwrap().unwrap_err();
    assert_eq!(err, Error::not_found(ItemKind::Reminder, "doesnotexist"));
    assert!(err.is_not_found());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn removing_unknown_calendar_skips_listener() {
    let (kit, mut main, _store) = setup(MemoryStore::new());
    let mut events = kit.subscribe();

    let (tx, mut rx) = oneshot::channel();
    kit.remove_calendar("doesnotexist", move |result| {
        let _ = tx.send(result);
    });
    deliver(&mut main).await;

    assert_eq!(
        rx.try_recv().unwrap(),
        Err(Error::not_found(ItemKind::Calendar, "doesnotexist"))
    );
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn removing_calendar_notifies_with_same_result() {
    let (kit, mut main, store) = setup(MemoryStore::new());
    let list = store.insert_calendar("Groceries");
    let mut events = kit.subscribe();

    let (tx, mut rx) = oneshot::channel();
    kit.remove_calendar(list.id.clone(), move |result| {
        let _ = tx.send(result);
    });
    deliver(&mut main).await;

    assert_eq!(rx.try_recv().unwrap(), Ok(()));
    assert_eq!(
        events.try_recv().unwrap(),
        StoreEvent::CalendarRemoved {
            identifier: list.id,
            result: Ok(()),
        }
    );
    assert!(store.calendars().is_empty());
}

#[tokio::test]
async fn removing_reminder_notifies_with_same_result() {
    let (kit, mut main, store) = setup(MemoryStore::new());
    let list = store.insert_calendar("Groceries");
    let milk = store.insert_reminder(&ReminderDraft::new("Milk", &list)).unwrap();
    let mut events = kit.subscribe();

    let (tx, mut rx) = oneshot::channel();
    kit.remove_reminder(milk.id.clone(), move |result| {
        let _ = tx.send(result);
    });
    deliver(&mut main).await;

    assert_eq!(rx.try_recv().unwrap(), Ok(()));
    assert_eq!(
        events.try_recv().unwrap(),
        StoreEvent::ReminderRemoved {
            identifier: milk.id,
            result: Ok(()),
        }
    );
}

#[tokio::test]
async fn failed_calendar_create_reaches_completion_and_listener() {
    let (kit, mut main, store) = setup(MemoryStore::new());
    let mut events = kit.subscribe();
    let failure = Error::store(DOMAIN, 99, "disk full");
    store.fail_next_write(failure.clone());

    let (tx, mut rx) = oneshot::channel();
    kit.create_calendar("Groceries", move |result| {
        let _ = tx.send(result);
    });
    deliver(&mut main).await;

    assert_eq!(rx.try_recv().unwrap(), Err(failure.clone()));
    assert_eq!(events.try_recv().unwrap(), StoreEvent::CalendarCreated(Err(failure)));
    assert!(store.calendars().is_empty());
}

#[tokio::test]
async fn removing_calendar_failure_reaches_completion_and_listener() {
    let (kit, mut main, store) = setup(MemoryStore::new());
    let list = store.insert_calendar("Groceries");
    let mut events = kit.subscribe();
    let failure = Error::store(DOMAIN, 7, "locked");
    store.fail_next_write(failure.clone());

    let (tx, mut rx) = oneshot::channel();
    kit.remove_calendar(list.id.clone(), move |result| {
        let _ = tx.send(result);
    });
    deliver(&mut main).await;

    assert_eq!(rx.try_recv().unwrap(), Err(failure.clone()));
    assert_eq!(
        events.try_recv().unwrap(),
        StoreEvent::CalendarRemoved {
            identifier: list.id.clone(),
            result: Err(failure),
        }
    );
    assert_eq!(store.calendar(&list.id), Some(list));
}

#[tokio::test]
async fn removing_reminder_failure_reaches_completion_and_listener() {
    let (kit, mut main, store) = setup(MemoryStore::new());
    let list = store.insert_calendar("Groceries");
    let milk = store.insert_reminder(&ReminderDraft::new("Milk", &list)).unwrap();
    let mut events = kit.subscribe();
    let failure = Error::store(DOMAIN, 7, "locked");
    store.fail_next_write(failure.clone());

    let (tx, mut rx) = oneshot::channel();
    kit.remove_reminder(milk.id.clone(), move |result| {
        let _ = tx.send(result);
    });
    deliver(&mut main).await;

    assert_eq!(rx.try_recv().unwrap(), Err(failure.clone()));
    assert_eq!(
        events.try_recv().unwrap(),
        StoreEvent::ReminderRemoved {
            identifier: milk.id.clone(),
            result: Err(failure),
        }
    );
    assert_eq!(store.reminder(&milk.id), Some(milk));
}

#[tokio::test]
async fn completing_reminder_notifies_update() {
    let (kit, mut main, store) = setup(MemoryStore::new());
    let list = store.insert_calendar("Groceries");
    let milk = store.insert_reminder(&ReminderDraft::new("Milk", &list)).unwrap();
    let mut events = kit.subscribe();

    let (tx, mut rx) = oneshot::channel();
    kit.set_completed(milk.id.clone(), true, move |result| {
        let _ = tx.send(result);
    });
    deliver(&mut main).await;

    let updated = rx.try_recv().unwrap().unwrap();
    assert!(updated.completed);
    assert!(updated.completion_date.is_some());
    assert_eq!(events.try_recv().unwrap(), StoreEvent::ReminderUpdated(Ok(updated)));
}

#[tokio::test]
async fn completing_unknown_reminder_skips_listener() {
    let (kit, mut main, _store) = setup(MemoryStore::new());
    let mut events = kit.subscribe();

    let (tx, mut rx) = oneshot::channel();
    kit.set_completed("doesnotexist", true, move |result| {
        let _ = tx.send(result);
    });
    deliver(&mut main).await;

    assert!(rx.try_recv().unwrap().unwrap_err().is_not_found());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn completions_run_without_a_listener() {
    let (kit, mut main, _store) = setup(MemoryStore::new());
    assert!(!kit.observer().is_registered());

    let (tx, mut rx) = oneshot::channel();
    kit.create_calendar("Groceries", move |result| {
        let _ = tx.send(result);
    });
    deliver(&mut main).await;

    assert!(rx.try_recv().unwrap().is_ok());
}

#[tokio::test]
async fn completions_run_on_main_loop_thread() {
    let (kit, mut main, _store) = setup(MemoryStore::new());
    let main_thread = thread::current().id();

    let (tx, mut rx) = oneshot::channel();
    kit.calendars(move |_| {
        let _ = tx.send(thread::current().id());
    });
    deliver(&mut main).await;

    assert_eq!(rx.try_recv().unwrap(), main_thread);
}
