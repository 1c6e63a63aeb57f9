use super::MedicineLog;
use crate::app::Screen;
use crate::calendar::{CalendarView, MonthCalendar, MonthGrid, CALENDAR_HEIGHT, CALENDAR_WIDTH};
use crate::datekey::DateKey;
use crate::help::Help;
use crate::jumpto::{JumpTo, JumpToInput, JumpToOutput, JumpToState};
use crate::storage::KeyValueStore;
use crate::theme::{Palette, Theme};
use crossterm::event::KeyCode;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Flex, Layout, Margin, Rect},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Widget},
};

static MAIN_HELP: &[&str] = &[
    "ENTER, SPACE    Record today's dose",
    "h               Show or hide history",
    "c               Open the calendar",
    "t               Switch light/dark theme",
    "?               Show this help",
    "q, ESC          Quit",
];

static CALENDAR_HELP: &[&str] = &[
    "[, PAGE UP      Previous month",
    "], PAGE DOWN    Next month",
    "ARROWS, hjkl    Move the day cursor",
    "a               Toggle admin mode",
    "ENTER, SPACE    Flip the day (admin mode)",
    "0, HOME         Jump to today",
    "g               Input month to jump to",
    "t               Switch light/dark theme",
    "?               Show this help",
    "q, c, ESC       Close the calendar",
];

const BUTTON_WIDTH: u16 = 24;

/// The medicine tracker: a button for today, a history list, and a calendar
/// in which past days can be corrected while admin mode is on
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct MedicineApp<K> {
    store: K,
    medicine: MedicineLog,
    today: DateKey,
    theme: Theme,
    history_open: bool,
    calendar: CalendarView,
    admin_mode: bool,
    state: AppState,
    status: Option<String>,
}

impl<K: KeyValueStore> MedicineApp<K> {
    /// Loads the log and theme from `store`, then forgets anything recorded
    /// more than a year before `today`
    pub(crate) fn new(store: K, today: DateKey) -> Self {
        let medicine = MedicineLog::load(&store);
        let theme = Theme::load(&store);
        let mut app = MedicineApp {
            store,
            medicine,
            today,
            theme,
            history_open: false,
            calendar: CalendarView::new(today),
            admin_mode: false,
            state: AppState::Main,
            status: None,
        };
        if let Some(cutoff) = today.one_year_before() {
            let purged = app.medicine.purge_older_than(cutoff);
            if purged > 0 {
                log::info!("forgot {purged} medicine record(s) from before {cutoff}");
                app.persist();
            }
        }
        if app.medicine.is_unread() {
            app.status = Some(String::from(
                "Could not read saved records; changes will not be saved",
            ));
        }
        log::debug!("loaded {} medicine record(s)", app.medicine.len());
        app
    }

    fn persist(&mut self) {
        match self.medicine.save(&mut self.store) {
            Ok(()) => self.status = None,
            Err(e) => {
                log::error!("failed to save medicine records: {e}");
                self.status = Some(format!("Could not save: {e}"));
            }
        }
    }

    fn take_today(&mut self) -> bool {
        if self.medicine.take(self.today) {
            log::info!("recorded {} as taken", self.today);
            self.persist();
            true
        } else {
            false
        }
    }

    fn toggle_day(&mut self, day: DateKey) {
        let taken = self.medicine.toggle(day);
        log::info!("admin: marked {day} as {}", if taken { "taken" } else { "not taken" });
        self.persist();
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        if let Err(e) = self.theme.save(&mut self.store) {
            log::error!("failed to save theme: {e}");
            self.status = Some(format!("Could not save: {e}"));
        }
    }

    /// The calendar always opens on the current month with admin mode off
    fn open_calendar(&mut self) {
        self.calendar = CalendarView::new(self.today);
        self.admin_mode = false;
        self.state = AppState::Calendar;
    }

    fn handle_calendar_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('[') | KeyCode::PageUp => self.calendar.prev_month().is_ok(),
            KeyCode::Char(']') | KeyCode::PageDown => self.calendar.next_month().is_ok(),
            KeyCode::Char('h') | KeyCode::Left => self.calendar.move_cursor(-1).is_ok(),
            KeyCode::Char('l') | KeyCode::Right => self.calendar.move_cursor(1).is_ok(),
            KeyCode::Char('k') | KeyCode::Up => self.calendar.move_cursor(-7).is_ok(),
            KeyCode::Char('j') | KeyCode::Down => self.calendar.move_cursor(7).is_ok(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.admin_mode {
                    self.toggle_day(self.calendar.cursor());
                }
                self.admin_mode
            }
            KeyCode::Char('a') => {
                self.admin_mode = !self.admin_mode;
                true
            }
            KeyCode::Char('0') | KeyCode::Home => {
                self.calendar.show_day(self.today);
                true
            }
            KeyCode::Char('g') => {
                self.state = AppState::Jumping(JumpToState::new());
                true
            }
            KeyCode::Char('t') => {
                self.toggle_theme();
                true
            }
            KeyCode::Char('?') => {
                self.state = AppState::Helping { in_calendar: true };
                true
            }
            KeyCode::Char('q' | 'c') | KeyCode::Esc => {
                self.state = AppState::Main;
                true
            }
            _ => false,
        }
    }

    fn render_main(&self, area: Rect, buf: &mut Buffer, palette: Palette) {
        Block::new().style(palette.base).render(area, buf);
        let [title, _, date, _, button, _, hints, history, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);
        Paragraph::new("Medicine Tracker")
            .style(palette.heading)
            .centered()
            .render(title, buf);
        Paragraph::new(self.today.long_form())
            .centered()
            .render(date, buf);
        let (label, style) = if self.medicine.is_taken(self.today) {
            ("Taken!", palette.record)
        } else {
            ("Not taken yet", palette.base)
        };
        let [button] = Layout::horizontal([BUTTON_WIDTH])
            .flex(Flex::Center)
            .areas(button);
        Paragraph::new(label)
            .style(style)
            .centered()
            .block(Block::bordered().border_style(style))
            .render(button, buf);
        Paragraph::new("ENTER: took it · h: history · c: calendar · ?: help · q: quit")
            .style(palette.muted)
            .centered()
            .render(hints, buf);
        if self.history_open {
            self.render_history(history, buf, palette);
        }
        if let Some(msg) = &self.status {
            Paragraph::new(msg.as_str())
                .style(palette.error)
                .render(status, buf);
        }
    }

    fn render_history(&self, area: Rect, buf: &mut Buffer, palette: Palette) {
        let [area] = Layout::horizontal([Constraint::Max(44)])
            .flex(Flex::Center)
            .areas(area);
        let block = Block::bordered()
            .title(format!(" History ({}) ", self.medicine.len()))
            .title_alignment(Alignment::Center)
            .style(palette.base);
        let para = if self.medicine.is_empty() {
            Paragraph::new(Line::styled("No records yet", palette.muted)).centered()
        } else {
            Paragraph::new(
                self.medicine
                    .history()
                    .map(|day| {
                        Line::from_iter([
                            Span::styled(format!("{day} ({})", day.short_form()), palette.base),
                            Span::raw("  "),
                            Span::styled("Taken", palette.record),
                        ])
                    })
                    .collect::<Vec<_>>(),
            )
        };
        para.block(block).render(area, buf);
    }

    fn render_calendar(&self, area: Rect, buf: &mut Buffer, palette: Palette) {
        let [modal] = Layout::horizontal([CALENDAR_WIDTH + 4])
            .flex(Flex::Center)
            .areas(area);
        let [modal] = Layout::vertical([CALENDAR_HEIGHT + 4])
            .flex(Flex::Center)
            .areas(modal);
        Clear.render(modal, buf);
        let block = Block::bordered()
            .title(" Calendar ")
            .title_alignment(Alignment::Center)
            .style(palette.base);
        let inner = block.inner(modal).inner(Margin::new(1, 0));
        block.render(modal, buf);
        let [grid_area, admin_area, hint_area] = Layout::vertical([
            Constraint::Length(CALENDAR_HEIGHT),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);
        let selected = self.admin_mode.then_some(self.calendar.cursor());
        let grid = MonthGrid::build(self.calendar.month(), &self.medicine, self.today, selected);
        MonthCalendar::new(&grid, palette).render(grid_area, buf);
        let (admin, hint) = if self.admin_mode {
            (
                Span::styled("Admin mode: on", palette.today),
                "ENTER: flip day · a: admin off",
            )
        } else {
            (
                Span::styled("Admin mode: off", palette.muted),
                "[ ]: month · a: admin · ESC: close",
            )
        };
        Paragraph::new(Line::from(admin))
            .centered()
            .render(admin_area, buf);
        Paragraph::new(hint)
            .style(palette.muted)
            .centered()
            .render(hint_area, buf);
    }
}

impl<K: KeyValueStore> Screen for MedicineApp<K> {
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match self.state {
            AppState::Main => match key {
                KeyCode::Enter | KeyCode::Char(' ') => self.take_today(),
                KeyCode::Char('h') => {
                    self.history_open = !self.history_open;
                    true
                }
                KeyCode::Char('c') => {
                    self.open_calendar();
                    true
                }
                KeyCode::Char('t') => {
                    self.toggle_theme();
                    true
                }
                KeyCode::Char('?') => {
                    self.state = AppState::Helping { in_calendar: false };
                    true
                }
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.state = AppState::Quitting;
                    true
                }
                _ => false,
            },
            AppState::Calendar => self.handle_calendar_key(key),
            AppState::Helping { in_calendar } => {
                self.state = if in_calendar {
                    AppState::Calendar
                } else {
                    AppState::Main
                };
                true
            }
            AppState::Jumping(mut jump) => {
                if matches!(key, KeyCode::Char('q' | 'g') | KeyCode::Esc) {
                    self.state = AppState::Calendar;
                    return true;
                }
                let output = JumpToInput::from_key(key)
                    .map_or(JumpToOutput::Invalid, |input| jump.handle_input(input));
                match output {
                    JumpToOutput::Ok => {
                        self.state = AppState::Jumping(jump);
                        true
                    }
                    JumpToOutput::Invalid => false,
                    JumpToOutput::Jump(month) => {
                        self.calendar.show_month(month);
                        self.state = AppState::Calendar;
                        true
                    }
                }
            }
            AppState::Quitting => false,
        }
    }

    fn render(&mut self, area: Rect, buf: &mut Buffer) {
        let palette = self.theme.palette();
        self.render_main(area, buf, palette);
        match self.state {
            AppState::Main | AppState::Quitting => (),
            AppState::Calendar => self.render_calendar(area, buf, palette),
            AppState::Helping { in_calendar } => {
                let text = if in_calendar {
                    self.render_calendar(area, buf, palette);
                    CALENDAR_HELP
                } else {
                    MAIN_HELP
                };
                Help::new(text, palette.base).render(area, buf);
            }
            AppState::Jumping(ref jump) => {
                self.render_calendar(area, buf, palette);
                JumpTo::new(jump, palette).render(area, buf);
            }
        }
    }

    fn quitting(&self) -> bool {
        self.state == AppState::Quitting
    }

    fn set_today(&mut self, today: DateKey) {
        if today != self.today {
            log::info!("date changed from {} to {today}", self.today);
            self.today = today;
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AppState {
    Main,
    Calendar,
    Helping { in_calendar: bool },
    Jumping(JumpToState),
    Quitting,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, MEDICINE_KEY, THEME_KEY};

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn screen_text<K: KeyValueStore>(app: &mut MedicineApp<K>) -> String {
        let area = Rect::new(0, 0, 80, 30);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn stored(app: &MedicineApp<MemoryStore>) -> Option<String> {
        app.store.get(MEDICINE_KEY).unwrap()
    }

    #[test]
    fn test_take_today() {
        let mut app = MedicineApp::new(MemoryStore::new(), key("2026-01-19"));
        assert!(screen_text(&mut app).contains("Not taken yet"));
        assert!(app.handle_key(KeyCode::Enter));
        assert_eq!(stored(&app).as_deref(), Some(r#"{"2026-01-19":true}"#));
        assert!(screen_text(&mut app).contains("Taken!"));
        // The button is disabled once today is recorded
        assert!(!app.handle_key(KeyCode::Char(' ')));
    }

    #[test]
    fn test_load_purges_old_records() {
        let mut store = MemoryStore::new();
        store
            .set(
                MEDICINE_KEY,
                r#"{"2024-12-01":true,"2025-01-19":true,"2025-03-25":true}"#,
            )
            .unwrap();
        let app = MedicineApp::new(store, key("2026-01-19"));
        assert_eq!(
            stored(&app).as_deref(),
            Some(r#"{"2025-01-19":true,"2025-03-25":true}"#)
        );
    }

    #[test]
    fn test_load_without_purge_does_not_write() {
        let app = MedicineApp::new(MemoryStore::new(), key("2026-01-19"));
        assert_eq!(stored(&app), None);
    }

    #[test]
    fn test_history() {
        let mut store = MemoryStore::new();
        store
            .set(MEDICINE_KEY, r#"{"2026-01-17":true,"2026-01-18":true}"#)
            .unwrap();
        let mut app = MedicineApp::new(store, key("2026-01-19"));
        assert!(!screen_text(&mut app).contains("History"));
        app.handle_key(KeyCode::Char('h'));
        let text = screen_text(&mut app);
        let newer = text.find("2026-01-18 (Sun, Jan 18)  Taken").unwrap();
        let older = text.find("2026-01-17 (Sat, Jan 17)  Taken").unwrap();
        assert!(newer < older);
    }

    #[test]
    fn test_empty_history() {
        let mut app = MedicineApp::new(MemoryStore::new(), key("2026-01-19"));
        app.handle_key(KeyCode::Char('h'));
        assert!(screen_text(&mut app).contains("No records yet"));
    }

    #[test]
    fn test_calendar_needs_admin_mode() {
        let mut app = MedicineApp::new(MemoryStore::new(), key("2026-01-19"));
        app.handle_key(KeyCode::Char('c'));
        assert!(screen_text(&mut app).contains("January 2026"));
        assert!(!app.handle_key(KeyCode::Enter));
        assert_eq!(stored(&app), None);
        app.handle_key(KeyCode::Char('a'));
        assert!(screen_text(&mut app).contains("Admin mode: on"));
        app.handle_key(KeyCode::Left);
        assert!(app.handle_key(KeyCode::Enter));
        assert_eq!(stored(&app).as_deref(), Some(r#"{"2026-01-18":true}"#));
        assert!(app.handle_key(KeyCode::Enter));
        assert_eq!(stored(&app).as_deref(), Some("{}"));
    }

    #[test]
    fn test_admin_toggle_of_today_updates_button() {
        let mut app = MedicineApp::new(MemoryStore::new(), key("2026-01-19"));
        app.handle_key(KeyCode::Char('c'));
        app.handle_key(KeyCode::Char('a'));
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Esc);
        assert_eq!(app.state, AppState::Main);
        assert!(screen_text(&mut app).contains("Taken!"));
    }

    #[test]
    fn test_reopening_calendar_resets() {
        let mut app = MedicineApp::new(MemoryStore::new(), key("2026-01-19"));
        app.handle_key(KeyCode::Char('c'));
        app.handle_key(KeyCode::Char('a'));
        app.handle_key(KeyCode::Char(']'));
        assert!(screen_text(&mut app).contains("February 2026"));
        app.handle_key(KeyCode::Char('q'));
        app.handle_key(KeyCode::Char('c'));
        let text = screen_text(&mut app);
        assert!(text.contains("January 2026"));
        assert!(text.contains("Admin mode: off"));
    }

    #[test]
    fn test_jump_to_month() {
        let mut app = MedicineApp::new(MemoryStore::new(), key("2026-01-19"));
        app.handle_key(KeyCode::Char('c'));
        app.handle_key(KeyCode::Char('g'));
        for c in "202412".chars() {
            assert!(app.handle_key(KeyCode::Char(c)));
        }
        assert!(app.handle_key(KeyCode::Enter));
        assert_eq!(app.state, AppState::Calendar);
        assert!(screen_text(&mut app).contains("December 2024"));
    }

    #[test]
    fn test_save_failure_is_reported() {
        let mut app = MedicineApp::new(MemoryStore::new().with_quota(2), key("2026-01-19"));
        assert!(app.handle_key(KeyCode::Enter));
        assert!(app.medicine.is_taken(key("2026-01-19")));
        assert_eq!(stored(&app), None);
        assert!(screen_text(&mut app).contains("Could not save"));
    }

    #[test]
    fn test_unreadable_records_are_not_replaced() {
        let mut store = MemoryStore::new();
        store.set(MEDICINE_KEY, r#"{"2026-01-10":true}"#).unwrap();
        let mut app = MedicineApp::new(store.with_failing_reads(), key("2026-01-19"));
        assert!(screen_text(&mut app).contains("changes will not be saved"));
        assert!(app.handle_key(KeyCode::Enter));
        assert_eq!(app.store.raw(MEDICINE_KEY), Some(r#"{"2026-01-10":true}"#));
        assert!(screen_text(&mut app).contains("Could not save"));
    }

    #[test]
    fn test_button_follows_date_change() {
        let mut app = MedicineApp::new(MemoryStore::new(), key("2026-01-19"));
        assert!(app.handle_key(KeyCode::Enter));
        assert!(screen_text(&mut app).contains("Taken!"));
        app.set_today(key("2026-01-20"));
        let text = screen_text(&mut app);
        assert!(text.contains("Tuesday, January 20, 2026"));
        assert!(text.contains("Not taken yet"));
        assert!(app.handle_key(KeyCode::Enter));
        assert_eq!(
            stored(&app).as_deref(),
            Some(r#"{"2026-01-19":true,"2026-01-20":true}"#)
        );
    }

    #[test]
    fn test_theme_toggle_persists() {
        let mut app = MedicineApp::new(MemoryStore::new(), key("2026-01-19"));
        app.handle_key(KeyCode::Char('t'));
        assert_eq!(app.store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_help_and_quit() {
        let mut app = MedicineApp::new(MemoryStore::new(), key("2026-01-19"));
        app.handle_key(KeyCode::Char('?'));
        assert!(screen_text(&mut app).contains("Record today's dose"));
        app.handle_key(KeyCode::Char('x'));
        assert_eq!(app.state, AppState::Main);
        app.handle_key(KeyCode::Char('q'));
        assert!(app.quitting());
    }
}
