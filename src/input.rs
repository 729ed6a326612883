use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InputEvent {
    Quit,
    PointerDown { col: u16, row: u16 },
    PointerUp { col: u16, row: u16 },
    PointerMoved { col: u16, row: u16 },
    Key(KeyCode),
}

pub(crate) fn collect_input_nonblocking(
    max_frame_time: Duration,
) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Some(ev) = translate(event::read()?) {
            out.push(ev);
            if out.len() >= 32 {
                break;
            }
        }
    }
    Ok(out)
}

pub(crate) fn translate(ev: Event) -> Option<InputEvent> {
    match ev {
        Event::Key(k) => translate_key(k),
        Event::Mouse(m) => translate_mouse(m),
        _ => None,
    }
}

fn translate_key(k: KeyEvent) -> Option<InputEvent> {
    if k.kind != KeyEventKind::Press && k.kind != KeyEventKind::Repeat {
        return None;
    }
    if matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        && k.modifiers.contains(KeyModifiers::CONTROL)
    {
        return Some(InputEvent::Quit);
    }
    match k.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(InputEvent::Quit),
        code => Some(InputEvent::Key(code)),
    }
}

fn translate_mouse(m: MouseEvent) -> Option<InputEvent> {
    let (col, row) = (m.column, m.row);
    match m.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(InputEvent::PointerDown { col, row }),
        MouseEventKind::Up(MouseButton::Left) => Some(InputEvent::PointerUp { col, row }),
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
            Some(InputEvent::PointerMoved { col, row })
        }
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pointer {
    pub(crate) col: u16,
    pub(crate) row: u16,
    pub(crate) down: bool,
}

impl Pointer {
    pub(crate) fn observe(&mut self, ev: &InputEvent) {
        match *ev {
            InputEvent::PointerDown { col, row } => {
                self.col = col;
                self.row = row;
                self.down = true;
            }
            InputEvent::PointerUp { col, row } => {
                self.col = col;
                self.row = row;
                self.down = false;
            }
            InputEvent::PointerMoved { col, row } => {
                self.col = col;
                self.row = row;
            }
            InputEvent::Quit | InputEvent::Key(_) => {}
        }
    }
}
