use super::form::{AppForm, AppFormView, FormInput, FormOutput};
use super::{filter_apps, AppCatalog, AppDraft, AppEntry};
use crate::app::Screen;
use crate::calendar::{CalendarView, MonthCalendar, MonthGrid, CALENDAR_HEIGHT, CALENDAR_WIDTH};
use crate::datekey::DateKey;
use crate::help::Help;
use crate::storage::KeyValueStore;
use crate::theme::{Palette, Theme};
use crossterm::event::KeyCode;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Flex, Layout, Margin, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Widget, Wrap},
};

static HELP: &[&str] = &[
    "/               Search by name or tag",
    "TAB             Switch between app list and calendar",
    "UP, DOWN, j, k  Select an app (list)",
    "ARROWS, hjkl    Move the day cursor (calendar)",
    "ENTER, SPACE    Filter by the day under the cursor (calendar)",
    "r               Clear the date filter",
    "[, PAGE UP      Previous month",
    "], PAGE DOWN    Next month",
    "0, HOME         Calendar back to today",
    "a               Add an app",
    "e               Edit the selected app",
    "d               Delete the selected app",
    "m               Show or hide the selected app's memo",
    "t               Switch light/dark theme",
    "?               Show this help",
    "q, ESC          Quit",
];

static NO_APPS: &str = "No apps found.";

/// The bookmark manager: a searchable app list next to a calendar that
/// marks and filters by creation date
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct WebAppsApp<K> {
    store: K,
    catalog: AppCatalog,
    today: DateKey,
    theme: Theme,
    search: String,
    date_filter: Option<DateKey>,
    calendar: CalendarView,
    focus: Focus,
    selected: usize,
    memo_open: bool,
    state: AppState,
    status: Option<String>,
}

impl<K: KeyValueStore> WebAppsApp<K> {
    pub(crate) fn new(store: K, today: DateKey) -> Self {
        let (catalog, seeded) = AppCatalog::load(&store);
        let theme = Theme::load(&store);
        let mut app = WebAppsApp {
            store,
            catalog,
            today,
            theme,
            search: String::new(),
            date_filter: None,
            calendar: CalendarView::new(today),
            focus: Focus::List,
            selected: 0,
            memo_open: false,
            state: AppState::Browsing,
            status: None,
        };
        if seeded {
            app.persist();
        }
        if app.catalog.is_unread() {
            app.status = Some(String::from(
                "Could not read saved apps; changes will not be saved",
            ));
        }
        log::debug!("loaded {} app(s)", app.catalog.len());
        app
    }

    fn persist(&mut self) {
        match self.catalog.save(&mut self.store) {
            Ok(()) => self.status = None,
            Err(e) => {
                log::error!("failed to save apps: {e}");
                self.status = Some(format!("Could not save: {e}"));
            }
        }
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        if let Err(e) = self.theme.save(&mut self.store) {
            log::error!("failed to save theme: {e}");
            self.status = Some(format!("Could not save: {e}"));
        }
    }

    fn visible(&self) -> Vec<&AppEntry> {
        filter_apps(self.catalog.apps(), &self.search, self.date_filter)
    }

    fn selected_app(&self) -> Option<&AppEntry> {
        self.visible().get(self.selected).copied()
    }

    fn select(&mut self, index: usize) {
        let count = self.visible().len();
        let index = index.min(count.saturating_sub(1));
        if index != self.selected {
            self.selected = index;
            self.memo_open = false;
        }
    }

    fn select_id(&mut self, id: &str) {
        let index = self.visible().iter().position(|a| a.id == id);
        self.select(index.unwrap_or(0));
    }

    fn move_selection(&mut self, down: bool) -> bool {
        let count = self.visible().len();
        if down && self.selected + 1 < count {
            self.select(self.selected + 1);
            true
        } else if !down && self.selected > 0 {
            self.select(self.selected - 1);
            true
        } else {
            false
        }
    }

    fn set_date_filter(&mut self, filter: Option<DateKey>) {
        self.date_filter = filter;
        self.selected = 0;
        self.memo_open = false;
    }

    fn submit(&mut self, editing: Option<String>, draft: AppDraft) {
        let id = match editing {
            Some(id) => {
                if !self.catalog.update(&id, draft) {
                    log::warn!("app {id} vanished while being edited");
                    return;
                }
                log::info!("updated app {id}");
                id
            }
            None => {
                let id = self.catalog.create(draft);
                log::info!("added app {id}");
                id
            }
        };
        self.persist();
        self.select_id(&id);
    }

    fn handle_browse_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('/') => {
                self.state = AppState::Searching;
                true
            }
            KeyCode::Tab => {
                self.focus = self.focus.toggled();
                true
            }
            KeyCode::Char('a') => {
                self.state = AppState::Editing(AppForm::new(self.today));
                true
            }
            KeyCode::Char('e') => match self.selected_app().map(AppForm::edit) {
                Some(form) => {
                    self.state = AppState::Editing(form);
                    true
                }
                None => false,
            },
            KeyCode::Char('d') => match self.selected_app().map(|a| a.id.clone()) {
                Some(id) => {
                    self.state = AppState::ConfirmDelete(id);
                    true
                }
                None => false,
            },
            KeyCode::Char('m') => {
                if self.selected_app().is_some_and(|a| !a.memo.is_empty()) {
                    self.memo_open = !self.memo_open;
                    true
                } else {
                    false
                }
            }
            KeyCode::Char('r') => {
                self.set_date_filter(None);
                true
            }
            KeyCode::Char('[') | KeyCode::PageUp => self.calendar.prev_month().is_ok(),
            KeyCode::Char(']') | KeyCode::PageDown => self.calendar.next_month().is_ok(),
            KeyCode::Char('0') | KeyCode::Home => {
                self.calendar.show_day(self.today);
                true
            }
            KeyCode::Char('t') => {
                self.toggle_theme();
                true
            }
            KeyCode::Char('?') => {
                self.state = AppState::Helping;
                true
            }
            KeyCode::Char('q') | KeyCode::Esc => {
                self.state = AppState::Quitting;
                true
            }
            _ => match self.focus {
                Focus::List => self.handle_list_key(key),
                Focus::Calendar => self.handle_calendar_key(key),
            },
        }
    }

    fn handle_list_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(true),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(false),
            _ => false,
        }
    }

    fn handle_calendar_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('h') | KeyCode::Left => self.calendar.move_cursor(-1).is_ok(),
            KeyCode::Char('l') | KeyCode::Right => self.calendar.move_cursor(1).is_ok(),
            KeyCode::Char('k') | KeyCode::Up => self.calendar.move_cursor(-7).is_ok(),
            KeyCode::Char('j') | KeyCode::Down => self.calendar.move_cursor(7).is_ok(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                let day = self.calendar.cursor();
                if self.date_filter == Some(day) {
                    self.set_date_filter(None);
                } else {
                    self.set_date_filter(Some(day));
                }
                true
            }
            _ => false,
        }
    }

    fn handle_search_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char(c) => self.search.push(c),
            KeyCode::Backspace => {
                if self.search.pop().is_none() {
                    return false;
                }
            }
            KeyCode::Enter => {
                self.state = AppState::Browsing;
                return true;
            }
            KeyCode::Esc => {
                self.search.clear();
                self.state = AppState::Browsing;
            }
            _ => return false,
        }
        self.selected = 0;
        self.memo_open = false;
        true
    }

    fn handle_form_key(&mut self, key: KeyCode) -> bool {
        let AppState::Editing(ref mut form) = self.state else {
            return false;
        };
        let Some(input) = FormInput::from_key(key) else {
            return false;
        };
        let editing = form.editing().map(String::from);
        match form.handle_input(input) {
            FormOutput::Ok => true,
            FormOutput::Invalid => false,
            FormOutput::Cancel => {
                self.state = AppState::Browsing;
                true
            }
            FormOutput::Submit(draft) => {
                self.state = AppState::Browsing;
                self.submit(editing, draft);
                true
            }
        }
    }

    fn handle_confirm_key(&mut self, key: KeyCode) -> bool {
        let AppState::ConfirmDelete(ref id) = self.state else {
            return false;
        };
        match key {
            KeyCode::Char('y' | 'Y') => {
                let id = id.clone();
                self.state = AppState::Browsing;
                if self.catalog.delete(&id) {
                    log::info!("deleted app {id}");
                    self.persist();
                }
                self.select(self.selected);
                self.memo_open = false;
                true
            }
            KeyCode::Char('n' | 'N') | KeyCode::Esc => {
                self.state = AppState::Browsing;
                true
            }
            _ => false,
        }
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer, palette: Palette) {
        let [title_area, search_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(area);
        let total = format!("Total: {} ", self.catalog.len());
        let [title_cell, total_cell] = Layout::horizontal([
            Constraint::Min(0),
            Constraint::Length(u16::try_from(total.len()).unwrap_or(u16::MAX)),
        ])
        .areas(title_area);
        Paragraph::new(" My Web Apps")
            .style(palette.heading)
            .render(title_cell, buf);
        Paragraph::new(total)
            .style(palette.muted)
            .render(total_cell, buf);
        let searching = self.state == AppState::Searching;
        let mut spans = vec![
            Span::styled(" Search: ", palette.muted),
            Span::styled(
                self.search.as_str(),
                if searching {
                    palette.highlight
                } else {
                    palette.base
                },
            ),
        ];
        if searching {
            spans.push(Span::styled("▏", palette.highlight));
        } else if self.search.is_empty() {
            spans.push(Span::styled("(press / to search)", palette.unfilled()));
        }
        Paragraph::new(Line::from(spans)).render(search_area, buf);
    }

    fn render_calendar(&self, area: Rect, buf: &mut Buffer, palette: Palette) {
        let block = Block::bordered()
            .title(" Calendar ")
            .border_style(focus_style(self.focus == Focus::Calendar, palette));
        let inner = block.inner(area);
        block.render(area, buf);
        let [grid_area, filter_area] =
            Layout::vertical([Constraint::Length(CALENDAR_HEIGHT), Constraint::Length(1)])
                .areas(inner);
        let selected = match self.focus {
            Focus::Calendar => Some(self.calendar.cursor()),
            Focus::List => self.date_filter,
        };
        let grid = MonthGrid::build(self.calendar.month(), &self.catalog, self.today, selected);
        MonthCalendar::new(&grid, palette).render(grid_area, buf);
        let filter = match self.date_filter {
            Some(day) => Line::from_iter([
                Span::styled("Filter: ", palette.muted),
                Span::styled(day.to_string(), palette.today),
                Span::styled("  (r: reset)", palette.muted),
            ]),
            None => Line::styled("Filter: none", palette.muted),
        };
        Paragraph::new(filter).centered().render(filter_area, buf);
    }

    fn render_list(
        &self,
        visible: &[&AppEntry],
        area: Rect,
        buf: &mut Buffer,
        palette: Palette,
    ) {
        let block = Block::bordered()
            .title(format!(" Apps ({}/{}) ", visible.len(), self.catalog.len()))
            .border_style(focus_style(self.focus == Focus::List, palette));
        let inner = block.inner(area);
        block.render(area, buf);
        if visible.is_empty() {
            Paragraph::new(Line::styled(NO_APPS, palette.muted))
                .centered()
                .render(inner, buf);
            return;
        }
        let rows = usize::from(inner.height);
        let offset = (self.selected + 1).saturating_sub(rows);
        let lines = visible
            .iter()
            .enumerate()
            .skip(offset)
            .take(rows)
            .map(|(i, app)| {
                let (marker, style) = if i == self.selected {
                    ("> ", palette.highlight)
                } else {
                    ("  ", palette.base)
                };
                Line::from_iter([
                    Span::styled(marker, style),
                    Span::styled(app.name.as_str(), style),
                    Span::styled(format!("  {}", app.created_at), palette.muted),
                ])
            })
            .collect::<Vec<_>>();
        Paragraph::new(lines).render(inner, buf);
    }

    fn render_detail(
        &self,
        app: Option<&AppEntry>,
        area: Rect,
        buf: &mut Buffer,
        palette: Palette,
    ) {
        let block = Block::bordered().title(" Details ");
        let inner = block.inner(area).inner(Margin::new(1, 0));
        block.render(area, buf);
        let Some(app) = app else {
            return;
        };
        let mut lines = vec![
            Line::styled(app.name.as_str(), palette.heading),
            Line::styled(app.display_url().into_owned(), palette.record),
            Line::styled(
                app.display_description(),
                if app.description.is_empty() {
                    palette.muted
                } else {
                    palette.base
                },
            ),
            Line::default(),
        ];
        let mut tags = vec![Span::styled("Tags: ", palette.muted)];
        if app.tags.is_empty() {
            tags.push(Span::styled("none", palette.muted));
        }
        for t in &app.tags {
            tags.push(Span::styled(format!("#{t} "), palette.today));
        }
        lines.push(Line::from(tags));
        lines.push(Line::from_iter([
            Span::styled("Created: ", palette.muted),
            Span::styled(app.created_at.to_string(), palette.base),
        ]));
        if let Some(image) = &app.image {
            lines.push(Line::from_iter([
                Span::styled("Image: ", palette.muted),
                Span::styled(truncate_chars(image, 40), palette.base),
            ]));
        }
        if !app.memo.is_empty() {
            lines.push(Line::default());
            if self.memo_open {
                lines.push(Line::styled("Memo (m to hide):", palette.muted));
                lines.extend(app.memo.lines().map(|l| Line::styled(l, palette.base)));
            } else {
                lines.push(Line::styled("m: show memo", palette.muted));
            }
        }
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }

    fn render_footer(&self, area: Rect, buf: &mut Buffer, palette: Palette) {
        if let Some(msg) = &self.status {
            Paragraph::new(msg.as_str())
                .style(palette.error)
                .render(area, buf);
            return;
        }
        let hint = match (&self.state, self.focus) {
            (AppState::Searching, _) => "type to filter · ENTER: done · ESC: clear",
            (_, Focus::List) => {
                "a: add · e: edit · d: delete · TAB: calendar · ?: help · q: quit"
            }
            (_, Focus::Calendar) => {
                "ENTER: filter by day · [ ]: month · TAB: list · ?: help · q: quit"
            }
        };
        Paragraph::new(hint)
            .style(palette.muted)
            .centered()
            .render(area, buf);
    }

    fn render_confirm(&self, id: &str, area: Rect, buf: &mut Buffer, palette: Palette) {
        let name = self.catalog.get(id).map_or("this app", |a| a.name.as_str());
        let text = Line::from(format!("Delete {name:?}? (y/n)"));
        let width = u16::try_from(text.width())
            .unwrap_or(u16::MAX)
            .saturating_add(4)
            .min(area.width);
        let [popup] = Layout::horizontal([width]).flex(Flex::Center).areas(area);
        let [popup] = Layout::vertical([Constraint::Length(3)])
            .flex(Flex::Center)
            .areas(popup);
        Clear.render(popup, buf);
        Paragraph::new(text)
            .centered()
            .block(
                Block::bordered()
                    .title(" Confirm ")
                    .title_alignment(Alignment::Center),
            )
            .style(palette.base)
            .render(popup, buf);
    }
}

impl<K: KeyValueStore> Screen for WebAppsApp<K> {
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match self.state {
            AppState::Browsing => self.handle_browse_key(key),
            AppState::Searching => self.handle_search_key(key),
            AppState::Editing(_) => self.handle_form_key(key),
            AppState::ConfirmDelete(_) => self.handle_confirm_key(key),
            AppState::Helping => {
                self.state = AppState::Browsing;
                true
            }
            AppState::Quitting => false,
        }
    }

    fn render(&mut self, area: Rect, buf: &mut Buffer) {
        let palette = self.theme.palette();
        Block::new().style(palette.base).render(area, buf);
        let [header, body, footer] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);
        self.render_header(header, buf, palette);
        let [left, right] = Layout::horizontal([
            Constraint::Length(CALENDAR_WIDTH + 2),
            Constraint::Min(0),
        ])
        .areas(body);
        let [calendar_area, _] = Layout::vertical([
            Constraint::Length(CALENDAR_HEIGHT + 3),
            Constraint::Min(0),
        ])
        .areas(left);
        self.render_calendar(calendar_area, buf, palette);
        let visible = self.visible();
        let [list_area, detail_area] =
            Layout::vertical([Constraint::Percentage(40), Constraint::Min(0)]).areas(right);
        self.render_list(&visible, list_area, buf, palette);
        self.render_detail(visible.get(self.selected).copied(), detail_area, buf, palette);
        self.render_footer(footer, buf, palette);
        match self.state {
            AppState::Editing(ref form) => AppFormView::new(form, palette).render(area, buf),
            AppState::ConfirmDelete(ref id) => self.render_confirm(id, area, buf, palette),
            AppState::Helping => Help::new(HELP, palette.base).render(area, buf),
            AppState::Browsing | AppState::Searching | AppState::Quitting => (),
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

fn focus_style(focused: bool, palette: Palette) -> Style {
    if focused {
        palette.highlight
    } else {
        palette.muted
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((i, _)) => format!("{}...", &s[..i]),
        None => s.to_owned(),
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Focus {
    List,
    Calendar,
}

impl Focus {
    fn toggled(self) -> Focus {
        match self {
            Focus::List => Focus::Calendar,
            Focus::Calendar => Focus::List,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum AppState {
    Browsing,
    Searching,
    Editing(AppForm),
    /// Waiting for the user to confirm deleting the app with the given ID
    ConfirmDelete(String),
    Helping,
    Quitting,
}
