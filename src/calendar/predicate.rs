use chrono::{DateTime, Local};

use super::calendar::Calendar;
use super::reminder::Reminder;

/// Declarative reminder filter. Backends translate it to their native query.
///
/// `calendars: None` means every reminder list. Date bounds are
/// `[starting, ending)`; a missing bound is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// All reminders, complete or not.
    Reminders { calendars: Option<Vec<String>> },
    /// Incomplete reminders with a due date in range.
    Incomplete {
        starting: Option<DateTime<Local>>,
        ending: Option<DateTime<Local>>,
        calendars: Option<Vec<String>>,
    },
    /// Completed reminders with a completion date in range.
    Completed {
        starting: Option<DateTime<Local>>,
        ending: Option<DateTime<Local>>,
        calendars: Option<Vec<String>>,
    },
}

fn calendar_ids(calendars: Option<&[Calendar]>) -> Option<Vec<String>> {
    calendars.map(|list| list.iter().map(|c| c.id.clone()).collect())
}

impl Predicate {
    pub fn reminders_in(calendars: Option<&[Calendar]>) -> Self {
        Predicate::Reminders {
            calendars: calendar_ids(calendars),
        }
    }

    pub fn incomplete(
        starting: Option<DateTime<Local>>,
        ending: Option<DateTime<Local>>,
        calendars: Option<&[Calendar]>,
    ) -> Self {
        Predicate::Incomplete {
            starting,
            ending,
            calendars: calendar_ids(calendars),
        }
    }

    pub fn completed(
        starting: Option<DateTime<Local>>,
        ending: Option<DateTime<Local>>,
        calendars: Option<&[Calendar]>,
    ) -> Self {
        Predicate::Completed {
            starting,
            ending,
            calendars: calendar_ids(calendars),
        }
    }

    pub fn calendars(&self) -> Option<&[String]> {
        match self {
            Predicate::Reminders { calendars }
            | Predicate::Incomplete { calendars, .. }
            | Predicate::Completed { calendars, .. } => calendars.as_deref(),
        }
    }

    pub fn matches(&self, reminder: &Reminder) -> bool {
        let in_scope = self
            .calendars()
            .map_or(true, |ids| ids.iter().any(|id| *id == reminder.calendar_id));
        if !in_scope {
            return false;
        }

        match self {
            Predicate::Reminders { .. } => true,
            Predicate::Incomplete {
                starting, ending, ..
            } => {
                !reminder.completed
                    && in_range(
                        reminder.due.and_then(|d| d.to_local()),
                        *starting,
                        *ending,
                    )
            }
            Predicate::Completed {
                starting, ending, ..
            } => reminder.completed && in_range(reminder.completion_date, *starting, *ending),
        }
    }
}

fn in_range(
    date: Option<DateTime<Local>>,
    starting: Option<DateTime<Local>>,
    ending: Option<DateTime<Local>>,
) -> bool {
    match date {
        None => starting.is_none() && ending.is_none(),
        Some(date) => {
            starting.map_or(true, |start| date >= start) && ending.map_or(true, |end| date < end)
        }
    }
}
