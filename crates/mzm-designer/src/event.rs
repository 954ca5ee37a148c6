//! Terminal input polling, modeled on the teacher's `tui/event.rs`: a single
//! bounded-timeout poll so the render loop can interleave keystrokes with
//! background solver/improver updates draining on every tick.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEventKind};

#[derive(Debug, Clone, Copy)]
pub enum Event {
    Key(KeyCode),
    Resize(u16, u16),
}

/// Blocks up to `timeout` for a terminal event. `Ok(None)` on timeout is the
/// normal case — it just means there's nothing new to handle this tick.
pub fn poll_event(timeout: Duration) -> io::Result<Option<Event>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    match event::read()? {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(Event::Key(key.code))),
        CrosstermEvent::Resize(w, h) => Ok(Some(Event::Resize(w, h))),
        _ => Ok(None),
    }
}
