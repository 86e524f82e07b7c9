use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};

use super::calendar::Calendar;

/// Reminder priority, stored by the event store as a numeric level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    #[default]
    None,
    High,
    Medium,
    Low,
}

impl Priority {
    pub const fn level(self) -> u8 {
        match self {
            Priority::None => 0,
            Priority::High => 1,
            Priority::Medium => 5,
            Priority::Low => 9,
        }
    }

    /// Map any stored level back to a priority. Levels other than 1-9 read
    /// as no priority.
    pub fn from_level(level: usize) -> Self {
        match level {
            1..=4 => Priority::High,
            5 => Priority::Medium,
            6..=9 => Priority::Low,
            _ => Priority::None,
        }
    }
}

/// Calendar date fields, any of which may be unset. Reminders carry
/// components rather than instants so that "due on the 20th" stays floating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateComponents {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
}

impl DateComponents {
    pub fn date(date: NaiveDate) -> Self {
        Self {
            year: Some(date.year()),
            month: Some(date.month()),
            day: Some(date.day()),
            ..Self::default()
        }
    }

    pub fn date_time(dt: NaiveDateTime) -> Self {
        Self {
            hour: Some(dt.hour()),
            minute: Some(dt.minute()),
            second: Some(dt.second()),
            ..Self::date(dt.date())
        }
    }

    pub fn has_time(&self) -> bool {
        self.hour.is_some()
    }

    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year?, self.month?, self.day?)
    }

    pub fn to_naive_date_time(&self) -> Option<NaiveDateTime> {
        let time = NaiveTime::from_hms_opt(
            self.hour.unwrap_or(0),
            self.minute.unwrap_or(0),
            self.second.unwrap_or(0),
        )?;
        Some(self.to_naive_date()?.and_time(time))
    }

    /// Resolve in the local time zone. Date-only components resolve to
    /// local midnight.
    pub fn to_local(&self) -> Option<DateTime<Local>> {
        Local
            .from_local_datetime(&self.to_naive_date_time()?)
            .earliest()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: String,
    pub title: String,
    pub calendar_id: String,
    pub calendar_title: String,
    pub start: Option<DateComponents>,
    pub due: Option<DateComponents>,
    pub priority: Priority,
    pub notes: Option<String>,
    pub completed: bool,
    pub completion_date: Option<DateTime<Local>>,
}

/// Fields of a reminder to create.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReminderDraft {
    pub title: String,
    pub calendar_id: String,
    pub start: Option<DateComponents>,
    pub due: Option<DateComponents>,
    pub priority: Option<Priority>,
    pub notes: Option<String>,
}

impl ReminderDraft {
    pub fn new(title: impl Into<String>, calendar: &Calendar) -> Self {
        Self::in_calendar(title, calendar.id.clone())
    }

    pub fn in_calendar(title: impl Into<String>, calendar_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            calendar_id: calendar_id.into(),
            ..Self::default()
        }
    }

    pub fn start(mut self, start: DateComponents) -> Self {
        self.start = Some(start);
        self
    }

    pub fn due(mut self, due: DateComponents) -> Self {
        self.due = Some(due);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
