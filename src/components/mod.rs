pub mod calendar_list;
pub mod prompt;
pub mod reminder_list;
pub mod status_bar;

pub use calendar_list::CalendarList;
pub use prompt::PromptPopup;
pub use reminder_list::ReminderList;
pub use status_bar::StatusBar;

use ratatui::layout::Rect;

/// Center a popup of `width` x `height` in `area`, shrunk to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width - w) / 2;
    let y = area.y + (area.height - h) / 2;
    Rect::new(x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_is_centered() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(centered(area, 60, 6), Rect::new(20, 17, 60, 6));
    }

    #[test]
    fn popup_never_exceeds_narrow_terminal() {
        let area = Rect::new(2, 1, 24, 4);
        let popup = centered(area, 30, 6);
        assert_eq!(popup, Rect::new(2, 1, 24, 4));
        assert_eq!(area.intersection(popup), popup);
    }
}
