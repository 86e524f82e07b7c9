/// Account a calendar lives in (iCloud, local, an Exchange server, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// A reminder list. Owned by the event store; this is a snapshot by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    pub id: String,
    pub title: String,
    pub source: Option<Source>,
    pub color: Option<Rgb>,
}

/// What a backend needs to persist a new reminder list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDraft {
    pub title: String,
    pub source: Option<Source>,
}

/// Sort reminder lists by title, lexicographically.
pub fn sort_by_title(calendars: &mut [Calendar]) {
    calendars.sort_by(|a, b| a.title.cmp(&b.title));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar(title: &str) -> Calendar {
        Calendar {
            id: title.to_lowercase(),
            title: title.to_string(),
            source: None,
            color: None,
        }
    }

    #[test]
    fn sorts_titles_lexicographically() {
        let mut lists = vec![calendar("Work"), calendar("Groceries"), calendar("Errands")];
        sort_by_title(&mut lists);
        let titles: Vec<_> = lists.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Errands", "Groceries", "Work"]);
    }

    #[test]
    fn uppercase_sorts_before_lowercase() {
        let mut lists = vec![calendar("b"), calendar("B"), calendar("a")];
        sort_by_title(&mut lists);
        let titles: Vec<_> = lists.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["B", "a", "b"]);
    }
}
