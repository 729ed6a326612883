use crate::layout::{QuestLayout, Rect, Step};
use crate::model::Slot;
use crate::quest::AllocationQuest;
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
            bold: false,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn get(&self, x: u16, y: u16) -> Option<Cell> {
        (x < self.w && y < self.h).then(|| self.cells[self.idx(x, y)])
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            *c = Cell {
                bg,
                ..Cell::default()
            };
        }
    }
}

// the RGB set needs a truecolor terminal
#[derive(Clone, Copy, Debug)]
pub(crate) struct Palette {
    pub(crate) bg: Color,
    pub(crate) text: Color,
    pub(crate) title: Color,
    pub(crate) good: Color,
    pub(crate) bad: Color,
    pub(crate) muted: Color,
    pub(crate) pressed: Color,
    pub(crate) field: Color,
    pub(crate) focus: Color,
}

impl Palette {
    pub(crate) fn new(enable_color: bool) -> Self {
        if enable_color {
            Self {
                bg: Color::Black,
                text: Color::White,
                title: Color::Rgb { r: 0, g: 122, b: 255 },
                good: Color::Rgb { r: 52, g: 199, b: 89 },
                bad: Color::Rgb { r: 255, g: 59, b: 48 },
                muted: Color::Rgb { r: 142, g: 142, b: 147 },
                pressed: Color::Rgb { r: 50, g: 50, b: 50 },
                field: Color::Rgb { r: 209, g: 209, b: 214 },
                focus: Color::Rgb { r: 0, g: 122, b: 255 },
            }
        } else {
            Self {
                bg: Color::Black,
                text: Color::White,
                title: Color::Blue,
                good: Color::Green,
                bad: Color::Red,
                muted: Color::Grey,
                pressed: Color::DarkGrey,
                field: Color::White,
                focus: Color::Blue,
            }
        }
    }
}

pub(crate) struct Terminal<W: Write = io::Stdout> {
    pub(crate) out: W,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    active: bool,
    raw: bool,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        // nothing is written until raw mode is on, so a missing tty leaves no trace
        terminal::enable_raw_mode()?;
        Terminal::enter(io::stdout(), true, terminal::size)
    }
}

impl<W: Write> Terminal<W> {
    // The guard exists before the first escape goes out, so any later
    // failure unwinds through Drop and restores the screen.
    fn enter(
        out: W,
        raw: bool,
        size: impl FnOnce() -> io::Result<(u16, u16)>,
    ) -> anyhow::Result<Self> {
        let mut term = Self {
            out,
            cols: 0,
            rows: 0,
            prev: CellBuffer::new(0, 0),
            cur: CellBuffer::new(0, 0),
            active: true,
            raw,
        };
        execute!(
            term.out,
            EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;

        let (cols, rows) = size()?;
        term.cols = cols;
        term.rows = rows;
        term.prev = CellBuffer::new(cols, rows);
        term.cur = CellBuffer::new(cols, rows);
        Ok(term)
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let restored = queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            DisableMouseCapture,
            LeaveAlternateScreen
        )
        .and_then(|()| self.out.flush());
        if self.raw {
            self.raw = false;
            terminal::disable_raw_mode()?;
        }
        restored?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        let mut last_bold = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_bold != Some(c.bold) {
                    let attr = if c.bold {
                        Attribute::Bold
                    } else {
                        Attribute::NormalIntensity
                    };
                    queue!(self.out, SetAttribute(attr))?;
                    last_bold = Some(c.bold);
                }
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

impl<W: Write> Drop for Terminal<W> {
    fn drop(&mut self) {
        let _ = self.end();
    }
}

/* -----------------------------
   Primitives
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(
            xx,
            y,
            Cell {
                ch,
                fg,
                bg,
                bold: false,
            },
        );
    }
}

pub(crate) fn draw_text_centered(
    buf: &mut CellBuffer,
    cx: u16,
    y: u16,
    s: &str,
    fg: Color,
    bg: Color,
) {
    let half = (s.chars().count() / 2) as u16;
    draw_text(buf, cx.saturating_sub(half), y, s, fg, bg);
}

pub(crate) fn fill_rect(buf: &mut CellBuffer, r: Rect, bg: Color) {
    for y in r.y..r.y.saturating_add(r.h) {
        for x in r.x..r.x.saturating_add(r.w) {
            buf.set(
                x,
                y,
                Cell {
                    ch: ' ',
                    fg: Color::White,
                    bg,
                    bold: false,
                },
            );
        }
    }
}

// keeps whatever background is already there
pub(crate) fn outline_rect(buf: &mut CellBuffer, r: Rect, fg: Color, bold: bool) {
    if r.w < 2 || r.h < 2 {
        return;
    }
    let x1 = r.x.saturating_add(r.w - 1);
    let y1 = r.y.saturating_add(r.h - 1);
    let mut put = |x: u16, y: u16, ch: char| {
        let bg = buf.get(x, y).map_or(Color::Black, |c| c.bg);
        buf.set(x, y, Cell { ch, fg, bg, bold });
    };
    for x in r.x + 1..x1 {
        put(x, r.y, '─');
        put(x, y1, '─');
    }
    for y in r.y + 1..y1 {
        put(r.x, y, '│');
        put(x1, y, '│');
    }
    put(r.x, r.y, '┌');
    put(x1, r.y, '┐');
    put(r.x, y1, '└');
    put(x1, y1, '┘');
}

pub(crate) fn draw_button(buf: &mut CellBuffer, r: Rect, caption: &str, fg: Color, bg: Color) {
    fill_rect(buf, r, bg);
    draw_text_centered(buf, r.center_x(), r.center_y(), caption, fg, bg);
}

/* -----------------------------
   Screens
------------------------------ */

pub(crate) fn draw_idle(buf: &mut CellBuffer, level: u64, status: Option<&str>, pal: &Palette) {
    buf.clear(pal.bg);
    let cx = buf.w / 2;
    let cy = buf.h / 2;
    draw_text_centered(buf, cx, cy.saturating_sub(1), &format!("Level {level}"), pal.title, pal.bg);
    draw_text_centered(
        buf,
        cx,
        cy + 1,
        "Press Space to start allocation quest",
        pal.text,
        pal.bg,
    );
    if let Some(s) = status {
        draw_text_centered(buf, cx, cy + 3, s, pal.muted, pal.bg);
    }
    draw_text(
        buf,
        1,
        buf.h.saturating_sub(1),
        "Keys: space next level | q quit",
        pal.muted,
        pal.bg,
    );
}

pub(crate) fn draw_quest(
    buf: &mut CellBuffer,
    q: &AllocationQuest,
    l: &QuestLayout,
    pal: &Palette,
) {
    buf.clear(pal.bg);
    let cx = l.cols / 2;

    let title = format!(
        "Level {}: Allocate {} {}",
        q.level(),
        q.total_items(),
        q.resource()
    );
    draw_text_centered(buf, cx, l.title_y, &title, pal.title, pal.bg);

    let alloc = q.allocation();
    for slot in Slot::ALL {
        let row = l.row(slot);
        draw_text(buf, row.label_x, row.label_y, slot.label(), pal.text, pal.bg);

        let focused = q.active() == Some(slot);
        let field_bg = if focused { pal.field } else { Color::White };
        draw_button(buf, row.field, &alloc.get(slot).to_string(), Color::Black, field_bg);
        outline_rect(buf, row.field, if focused { pal.focus } else { pal.pressed }, focused);

        for (rect, step) in [(row.up, Step::Up), (row.down, Step::Down)] {
            let pressed = q
                .pressed()
                .is_some_and(|p| p.slot == slot && p.step == step);
            let bg = if pressed { pal.pressed } else { pal.muted };
            let glyph = match step {
                Step::Up => "▲",
                Step::Down => "▼",
            };
            draw_button(buf, rect, glyph, Color::White, bg);
        }
    }

    let allocated = q.allocated();
    let readout = format!("Allocated: {}, Remaining: {}", allocated, q.remaining());
    let readout_fg = if q.is_complete() { pal.good } else { pal.bad };
    draw_text_centered(buf, cx, l.readout_y, &readout, readout_fg, pal.bg);

    let confirm_bg = if q.is_complete() { pal.good } else { pal.muted };
    draw_button(buf, l.confirm, "Confirm", Color::Black, confirm_bg);
    outline_rect(buf, l.confirm, pal.pressed, false);

    draw_text(
        buf,
        1,
        l.rows.saturating_sub(1),
        "Click a box and type digits | backspace erase | tab next box | enter confirm | q quit",
        pal.muted,
        pal.bg,
    );
}
