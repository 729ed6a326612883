use crate::model::Slot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rect {
    pub(crate) x: u16,
    pub(crate) y: u16,
    pub(crate) w: u16,
    pub(crate) h: u16,
}

impl Rect {
    pub(crate) fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self { x, y, w, h }
    }

    pub(crate) fn contains(&self, col: u16, row: u16) -> bool {
        let (col, row) = (col as u32, row as u32);
        col >= self.x as u32
            && col < self.x as u32 + self.w as u32
            && row >= self.y as u32
            && row < self.y as u32 + self.h as u32
    }

    pub(crate) fn center_x(&self) -> u16 {
        self.x.saturating_add(self.w / 2)
    }

    pub(crate) fn center_y(&self) -> u16 {
        self.y.saturating_add(self.h / 2)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Affordance {
    pub(crate) slot: Slot,
    pub(crate) step: Step,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Target {
    Field(Slot),
    Arrow(Affordance),
    Confirm,
}

pub(crate) struct SlotRow {
    pub(crate) label_x: u16,
    pub(crate) label_y: u16,
    pub(crate) field: Rect,
    pub(crate) up: Rect,
    pub(crate) down: Rect,
}

// Rebuilt from the terminal size each frame; hit-testing and painting share it.
pub(crate) struct QuestLayout {
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) title_y: u16,
    pub(crate) slots: [SlotRow; 3],
    pub(crate) readout_y: u16,
    pub(crate) confirm: Rect,
}

const FIRST_SLOT_Y: u16 = 5;
const SLOT_PITCH: u16 = 4;
const FIELD_W: u16 = 10;
const ARROW_W: u16 = 3;

impl QuestLayout {
    pub(crate) fn new(cols: u16, rows: u16) -> Self {
        let cx = cols / 2;
        let row = |i: u16| {
            let top = FIRST_SLOT_Y + i * SLOT_PITCH;
            let field = Rect::new(cx.saturating_add(2), top, FIELD_W, 3);
            let arrow_x = field.x.saturating_add(FIELD_W + 1);
            SlotRow {
                label_x: cx.saturating_sub(30),
                label_y: top + 1,
                field,
                up: Rect::new(arrow_x, top, ARROW_W, 1),
                down: Rect::new(arrow_x, top + 2, ARROW_W, 1),
            }
        };
        Self {
            cols,
            rows,
            title_y: 2,
            slots: [row(0), row(1), row(2)],
            readout_y: 18,
            confirm: Rect::new(cx.saturating_sub(7), 20, 14, 3),
        }
    }

    pub(crate) fn row(&self, slot: Slot) -> &SlotRow {
        &self.slots[slot.index()]
    }

    pub(crate) fn arrow(&self, aff: Affordance) -> Rect {
        let row = self.row(aff.slot);
        match aff.step {
            Step::Up => row.up,
            Step::Down => row.down,
        }
    }

    pub(crate) fn hit_test(&self, col: u16, row: u16) -> Option<Target> {
        for slot in Slot::ALL {
            let r = self.row(slot);
            if r.field.contains(col, row) {
                return Some(Target::Field(slot));
            }
            if r.up.contains(col, row) {
                return Some(Target::Arrow(Affordance {
                    slot,
                    step: Step::Up,
                }));
            }
            if r.down.contains(col, row) {
                return Some(Target::Arrow(Affordance {
                    slot,
                    step: Step::Down,
                }));
            }
        }
        if self.confirm.contains(col, row) {
            return Some(Target::Confirm);
        }
        None
    }

    pub(crate) fn arrow_at(&self, col: u16, row: u16) -> Option<Affordance> {
        match self.hit_test(col, row) {
            Some(Target::Arrow(aff)) => Some(aff),
            _ => None,
        }
    }
}
