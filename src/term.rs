use std::io::{Stdout, Write, stdout};

use anyhow::{bail, Context};
use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::terminal::ClearType;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, read};
use log::debug;

use crate::game::{Frame, FrameSink, GameConfig};
use crate::input::{InputSource, QUIT_SYMBOL};

pub struct TermManager<W: Write = Stdout> {
    width: u16,
    height: u16,
    out: W,
    // Row just below the last drawn frame.
    bottom: u16,
}

impl TermManager {
    pub fn new() -> anyhow::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(TermManager::with_writer(stdout(), width, height))
    }
}

impl<W: Write> TermManager<W> {
    pub fn with_writer(out: W, width: u16, height: u16) -> Self {
        TermManager { width, height, out, bottom: 0 }
    }

    /// The grid plus the score line must fit on screen.
    pub fn ensure_fits(&self, config: &GameConfig) -> anyhow::Result<()> {
        let (need_w, need_h) = (config.width, config.height + 1);
        if i32::from(self.width) < need_w || i32::from(self.height) < need_h {
            bail!(
                "Terminal is {}x{}, the game needs at least {}x{}",
                self.width, self.height, need_w, need_h
            );
        }
        Ok(())
    }

    pub fn setup(&mut self) -> anyhow::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(self.out, cursor::Hide, cursor::DisableBlinking, terminal::Clear(ClearType::All))?;
        Ok(())
    }

    /// Leaves raw mode with the cursor under the last frame, so the frame
    /// stays visible after exit. Safe to call when raw mode was never entered.
    pub fn restore(&mut self) -> anyhow::Result<()> {
        self.park_cursor()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    fn park_cursor(&mut self) -> anyhow::Result<()> {
        let bottom = self.bottom;
        execute!(self.out, cursor::MoveTo(0, bottom), cursor::Show, cursor::EnableBlinking)?;
        Ok(())
    }
}

impl<W: Write> FrameSink for TermManager<W> {
    fn draw(&mut self, frame: &Frame) -> anyhow::Result<()> {
        queue!(self.out, terminal::Clear(ClearType::All))?;

        // Raw mode does no newline translation, so every row is placed explicitly.
        let mut y = 0;
        for row in frame.rows() {
            queue!(self.out, cursor::MoveTo(0, y), style::Print(row))?;
            y += 1;
        }
        queue!(self.out, cursor::MoveTo(0, y), style::Print(frame.score_line()))?;

        self.bottom = y + 1;
        self.out.flush().context("Error flushing.")?;
        Ok(())
    }
}

/// Keyboard input through crossterm. Arrow keys stand in for w/a/s/d and
/// Ctrl+C for quit, since raw mode swallows the interrupt signal.
pub struct KeyInput;

impl InputSource for KeyInput {
    fn next_char(&mut self) -> anyhow::Result<Option<char>> {
        loop {
            if let Event::Key(ev) = read()? {
                match key_to_symbol(&ev) {
                    Some(symbol) => return Ok(Some(symbol)),
                    None => debug!("Ignoring key {:?}", ev),
                }
            }
        }
    }
}

fn key_to_symbol(ev: &KeyEvent) -> Option<char> {
    match ev {
        KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL } => Some(QUIT_SYMBOL),
        KeyEvent { code, modifiers: _ } => match code {
            KeyCode::Char(c) => Some(*c),
            KeyCode::Up => Some('w'),
            KeyCode::Left => Some('a'),
            KeyCode::Down => Some('s'),
            KeyCode::Right => Some('d'),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::Point;
    use crate::game::Session;

    fn frame(width: i32, height: i32) -> Frame {
        let config = GameConfig { width, height, start: Point::new(1, 1), ..GameConfig::default() };
        Session::new(&config, StdRng::seed_from_u64(1)).frame()
    }

    #[test]
    fn draw_places_rows_and_score() {
        let mut term = TermManager::with_writer(Vec::new(), 80, 24);
        term.draw(&frame(5, 4)).unwrap();

        let out = String::from_utf8(term.out.clone()).unwrap();
        assert!(out.starts_with("\x1B[2J"));
        assert!(out.contains("\x1B[1;1H█████"));
        assert!(out.contains("\x1B[5;1HScore: 0"));
        assert_eq!(term.bottom, 5);
    }

    #[test]
    fn cursor_is_parked_below_last_frame() {
        let mut term = TermManager::with_writer(Vec::new(), 80, 24);
        term.draw(&frame(5, 4)).unwrap();
        term.out.clear();

        term.park_cursor().unwrap();

        let out = String::from_utf8(term.out).unwrap();
        assert!(out.starts_with("\x1B[6;1H"));
        assert!(out.contains("\x1B[?25h"));
    }

    #[test]
    fn ensure_fits_needs_room_for_score_line() {
        let config = GameConfig::default();
        assert!(TermManager::with_writer(Vec::new(), 100, 21).ensure_fits(&config).is_ok());
        assert!(TermManager::with_writer(Vec::new(), 100, 20).ensure_fits(&config).is_err());
        assert!(TermManager::with_writer(Vec::new(), 99, 30).ensure_fits(&config).is_err());
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent { code, modifiers }
    }

    #[test]
    fn arrows_map_to_wasd() {
        assert_eq!(key_to_symbol(&key(KeyCode::Up, KeyModifiers::NONE)), Some('w'));
        assert_eq!(key_to_symbol(&key(KeyCode::Left, KeyModifiers::NONE)), Some('a'));
        assert_eq!(key_to_symbol(&key(KeyCode::Down, KeyModifiers::NONE)), Some('s'));
        assert_eq!(key_to_symbol(&key(KeyCode::Right, KeyModifiers::NONE)), Some('d'));
    }

    #[test]
    fn ctrl_c_quits_and_plain_c_passes_through() {
        assert_eq!(key_to_symbol(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)), Some(QUIT_SYMBOL));
        assert_eq!(key_to_symbol(&key(KeyCode::Char('c'), KeyModifiers::NONE)), Some('c'));
        assert_eq!(key_to_symbol(&key(KeyCode::Char('q'), KeyModifiers::NONE)), Some('q'));
    }

    #[test]
    fn other_keys_are_dropped() {
        assert_eq!(key_to_symbol(&key(KeyCode::Esc, KeyModifiers::NONE)), None);
        assert_eq!(key_to_symbol(&key(KeyCode::Enter, KeyModifiers::NONE)), None);
    }
}
