use crate::datekey::DateKey;
use crossterm::event::{read, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{backend::Backend, buffer::Buffer, layout::Rect, widgets::Widget, Terminal};
use std::io::{self, Write};

/// One full-screen view: a state struct that reacts to key presses and knows
/// how to draw itself
pub(crate) trait Screen {
    /// Returns `false` if the user pressed an invalid key
    fn handle_key(&mut self, key: KeyCode) -> bool;

    fn render(&mut self, area: Rect, buf: &mut Buffer);

    fn quitting(&self) -> bool;

    /// Called before each key press with the current date, which changes if
    /// the program is left running past midnight
    fn set_today(&mut self, today: DateKey);
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct App<S> {
    screen: S,
    interrupted: bool,
}

impl<S: Screen> App<S> {
    pub(crate) fn new(screen: S) -> App<S> {
        App {
            screen,
            interrupted: false,
        }
    }

    pub(crate) fn run<B: Backend>(mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        while !self.quitting() {
            self.draw(terminal)?;
            self.handle_input()?;
        }
        Ok(())
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        terminal.draw(|frame| frame.render_widget(&mut *self, frame.area()))?;
        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        if let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = read()?
        {
            match DateKey::today() {
                Ok(today) => self.screen.set_today(today),
                Err(e) => log::debug!("keeping previous date: {e}"),
            }
            self.handle_key_event(code, modifiers)?;
        }
        // else: Redraw on resize, and we might as well redraw on other stuff
        // too
        Ok(())
    }

    fn handle_key_event(&mut self, code: KeyCode, modifiers: KeyModifiers) -> io::Result<()> {
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
            log::info!("interrupted");
            self.interrupted = true;
        } else if !normal_modifiers.contains(modifiers) || !self.screen.handle_key(code) {
            self.beep()?;
        }
        Ok(())
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn quitting(&self) -> bool {
        self.interrupted || self.screen.quitting()
    }
}

impl<S: Screen> Widget for &mut App<S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.screen.render(area, buf);
    }
}
