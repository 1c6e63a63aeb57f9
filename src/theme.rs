use crate::storage::{KeyValueStore, StorageError, THEME_KEY};
use ratatui::style::{Color, Modifier, Style};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Reads the saved preference, falling back to dark when nothing usable
    /// has been saved
    pub(crate) fn load<K: KeyValueStore + ?Sized>(store: &K) -> Theme {
        match store.get(THEME_KEY) {
            Ok(Some(s)) if s == "light" => Theme::Light,
            Ok(Some(s)) if s == "dark" => Theme::Dark,
            Ok(Some(s)) => {
                log::warn!("ignoring unknown theme {s:?}");
                Theme::Dark
            }
            Ok(None) => Theme::Dark,
            Err(e) => {
                log::warn!("could not read theme preference: {e}");
                Theme::Dark
            }
        }
    }

    pub(crate) fn save<K: KeyValueStore + ?Sized>(self, store: &mut K) -> Result<(), StorageError> {
        store.set(THEME_KEY, self.as_str())
    }

    pub(crate) fn toggled(self) -> Theme {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub(crate) fn palette(self) -> Palette {
        match self {
            Theme::Dark => DARK,
            Theme::Light => LIGHT,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Palette {
    pub(crate) base: Style,
    pub(crate) heading: Style,
    pub(crate) muted: Style,
    /// Days that carry a record
    pub(crate) record: Style,
    pub(crate) today: Style,
    pub(crate) highlight: Style,
    pub(crate) error: Style,
}

impl Palette {
    pub(crate) fn unfilled(&self) -> Style {
        self.base.fg(Color::DarkGray)
    }

    pub(crate) fn ready(&self) -> Style {
        self.base.add_modifier(Modifier::UNDERLINED)
    }
}

const DARK_BASE: Style = Style::new().fg(Color::White).bg(Color::Black);

pub(crate) const DARK: Palette = Palette {
    base: DARK_BASE,
    heading: DARK_BASE.add_modifier(Modifier::BOLD),
    muted: DARK_BASE.fg(Color::Gray),
    record: Style::new()
        .fg(Color::LightGreen)
        .bg(Color::Black)
        .add_modifier(Modifier::BOLD),
    today: DARK_BASE.fg(Color::LightYellow).add_modifier(Modifier::BOLD),
    highlight: DARK_BASE.add_modifier(Modifier::REVERSED),
    error: DARK_BASE.fg(Color::LightRed),
};

const LIGHT_BASE: Style = Style::new().fg(Color::Black).bg(Color::White);

pub(crate) const LIGHT: Palette = Palette {
    base: LIGHT_BASE,
    heading: LIGHT_BASE.add_modifier(Modifier::BOLD),
    muted: LIGHT_BASE.fg(Color::DarkGray),
    record: Style::new()
        .fg(Color::Green)
        .bg(Color::White)
        .add_modifier(Modifier::BOLD),
    today: LIGHT_BASE.fg(Color::Blue).add_modifier(Modifier::BOLD),
    highlight: LIGHT_BASE.add_modifier(Modifier::REVERSED),
    error: LIGHT_BASE.fg(Color::Red),
};
