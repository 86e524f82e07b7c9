use std::sync::OnceLock;

use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Install the theme described by the config. Later calls are ignored.
pub fn init(config: &ThemeConfig) {
    let _ = THEME.set(config.to_theme());
}

/// The active theme; the default one until [`init`] runs.
pub fn current() -> &'static Theme {
    THEME.get_or_init(|| DEFAULT.theme())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub selected: Style,
    pub header: Style,
    pub dim: Style,
    pub border: Style,
    pub focus_border: Style,
    pub status: Style,
    pub overdue: Style,
}

/// The handful of colors a preset is made of.
struct Palette {
    accent: Color,
    text: Color,
    muted: Color,
    line: Color,
    focus: Color,
    bar: Color,
    alert: Color,
}

impl Palette {
    fn theme(&self) -> Theme {
        Theme {
            selected: Style::new().fg(Color::Black).bg(self.accent),
            header: Style::new().fg(self.text).add_modifier(Modifier::BOLD),
            dim: Style::new().fg(self.muted),
            border: Style::new().fg(self.line),
            focus_border: Style::new().fg(self.focus),
            status: Style::new().fg(self.text).bg(self.bar),
            overdue: Style::new().fg(self.alert),
        }
    }
}

const DEFAULT: Palette = Palette {
    accent: Color::Cyan,
    text: Color::White,
    muted: Color::DarkGray,
    line: Color::Gray,
    focus: Color::Cyan,
    bar: Color::DarkGray,
    alert: Color::Red,
};

const DRACULA: Palette = Palette {
    accent: Color::Rgb(139, 233, 253),
    text: Color::Rgb(248, 248, 242),
    muted: Color::Rgb(98, 114, 164),
    line: Color::Rgb(68, 71, 90),
    focus: Color::Rgb(189, 147, 249),
    bar: Color::Rgb(68, 71, 90),
    alert: Color::Rgb(255, 85, 85),
};

const GRUVBOX: Palette = Palette {
    accent: Color::Rgb(131, 165, 152),
    text: Color::Rgb(235, 219, 178),
    muted: Color::Rgb(146, 131, 116),
    line: Color::Rgb(102, 92, 84),
    focus: Color::Rgb(250, 189, 47),
    bar: Color::Rgb(80, 73, 69),
    alert: Color::Rgb(251, 73, 52),
};

const NORD: Palette = Palette {
    accent: Color::Rgb(136, 192, 208),
    text: Color::Rgb(229, 233, 240),
    muted: Color::Rgb(76, 86, 106),
    line: Color::Rgb(67, 76, 94),
    focus: Color::Rgb(235, 203, 139),
    bar: Color::Rgb(67, 76, 94),
    alert: Color::Rgb(191, 97, 106),
};

fn palette(name: &str) -> &'static Palette {
    match name.to_lowercase().as_str() {
        "dracula" => &DRACULA,
        "gruvbox" => &GRUVBOX,
        "nord" => &NORD,
        other => {
            tracing::warn!(preset = other, "unknown theme preset, using default");
            &DEFAULT
        }
    }
}

/// `[theme]` table of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThemeConfig {
    pub preset: Option<String>,
    pub selected_fg: Option<String>,
    pub selected_bg: Option<String>,
    pub header_fg: Option<String>,
    pub dim_fg: Option<String>,
    pub border_fg: Option<String>,
    pub focus_fg: Option<String>,
    pub status_fg: Option<String>,
    pub status_bg: Option<String>,
    pub overdue_fg: Option<String>,
}

impl ThemeConfig {
    /// The preset, with any per-style color overrides on top.
    pub fn to_theme(&self) -> Theme {
        let mut theme = self.preset.as_deref().map_or(&DEFAULT, palette).theme();
        let color = |value: &Option<String>| value.as_deref().and_then(parse_color);

        for (value, style) in [
            (&self.selected_fg, &mut theme.selected),
            (&self.header_fg, &mut theme.header),
            (&self.dim_fg, &mut theme.dim),
            (&self.border_fg, &mut theme.border),
            (&self.focus_fg, &mut theme.focus_border),
            (&self.status_fg, &mut theme.status),
            (&self.overdue_fg, &mut theme.overdue),
        ] {
            if let Some(c) = color(value) {
                *style = style.fg(c);
            }
        }
        for (value, style) in [
            (&self.selected_bg, &mut theme.selected),
            (&self.status_bg, &mut theme.status),
        ] {
            if let Some(c) = color(value) {
                *style = style.bg(c);
            }
        }

        theme
    }
}

/// `#rrggbb` or one of the basic color names.
fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        return Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?));
    }
    let color = match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        _ => return None,
    };
    Some(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_names() {
        assert_eq!(parse_color("#88c0d0"), Some(Color::Rgb(136, 192, 208)));
        assert_eq!(parse_color(" Dark-Grey "), Some(Color::DarkGray));
        assert_eq!(parse_color("#88c0d"), None);
        assert_eq!(parse_color("#zz0000"), None);
        assert_eq!(parse_color("mauve"), None);
    }

    #[test]
    fn overrides_apply_on_top_of_preset() {
        let config = ThemeConfig {
            preset: Some("nord".into()),
            overdue_fg: Some("yellow".into()),
            status_bg: Some("#000000".into()),
            ..ThemeConfig::default()
        };
        let theme = config.to_theme();
        assert_eq!(theme.overdue.fg, Some(Color::Yellow));
        assert_eq!(theme.status.bg, Some(Color::Rgb(0, 0, 0)));
        assert_eq!(theme.border, NORD.theme().border);
    }

    #[test]
    fn unknown_preset_falls_back_to_default() {
        let config = ThemeConfig {
            preset: Some("solarized".into()),
            ..ThemeConfig::default()
        };
        assert_eq!(config.to_theme(), DEFAULT.theme());
    }
}
