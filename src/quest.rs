use crate::hold::HoldRepeat;
use crate::input::{InputEvent, Pointer};
use crate::layout::{Affordance, QuestLayout, Step, Target};
use crate::model::{resource_for, Allocation, QuestOutcome, Rules, Slot};
use crossterm::event::KeyCode;
use std::time::Duration;
use tracing::debug;

pub(crate) struct AllocationQuest {
    rules: Rules,
    level: u64,
    allocation: Allocation,
    active: Option<Slot>,
    pressed: Option<Affordance>,
    hold: HoldRepeat,
}

impl AllocationQuest {
    pub(crate) fn new(rules: Rules, level: u64) -> Self {
        Self {
            rules,
            level,
            allocation: Allocation::default(),
            active: None,
            pressed: None,
            hold: HoldRepeat::default(),
        }
    }

    pub(crate) fn level(&self) -> u64 {
        self.level
    }

    pub(crate) fn resource(&self) -> &'static str {
        resource_for(self.level)
    }

    pub(crate) fn total_items(&self) -> u32 {
        self.rules.total_items
    }

    pub(crate) fn allocation(&self) -> Allocation {
        self.allocation
    }

    pub(crate) fn active(&self) -> Option<Slot> {
        self.active
    }

    pub(crate) fn pressed(&self) -> Option<Affordance> {
        self.pressed
    }

    pub(crate) fn allocated(&self) -> u32 {
        self.allocation.sum()
    }

    pub(crate) fn remaining(&self) -> u32 {
        self.rules.total_items.saturating_sub(self.allocated())
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.allocated() == self.rules.total_items
    }

    pub(crate) fn select(&mut self, slot: Slot) {
        debug!(slot = slot.name(), "field selected");
        self.active = Some(slot);
    }

    // overflow past the total comes back out of the active slot only
    pub(crate) fn enter_digit(&mut self, digit: u32) {
        let Some(slot) = self.active else {
            return;
        };
        let current = self.allocation.get(slot);
        // same as reparsing the decimal string with the digit appended
        let grown = current.saturating_mul(10).saturating_add(digit);
        self.allocation
            .set(slot, grown.min(self.rules.max_allocation));
        self.absorb_overflow(slot);
    }

    pub(crate) fn erase(&mut self) {
        let Some(slot) = self.active else {
            return;
        };
        let v = self.allocation.get(slot);
        self.allocation.set(slot, v / 10);
        self.absorb_overflow(slot);
    }

    fn absorb_overflow(&mut self, slot: Slot) {
        let total = self.rules.total_items;
        let sum = self.allocated();
        if sum > total {
            let v = self.allocation.get(slot);
            self.allocation.set(slot, v.saturating_sub(sum - total));
        }
    }

    pub(crate) fn increment(&mut self, slot: Slot) -> bool {
        if self.allocated() >= self.rules.total_items {
            return false;
        }
        let v = self.allocation.get(slot);
        self.allocation
            .set(slot, v.saturating_add(1).min(self.rules.max_allocation));
        true
    }

    pub(crate) fn decrement(&mut self, slot: Slot) -> bool {
        let v = self.allocation.get(slot);
        let next = v.saturating_sub(1).max(self.rules.min_allocation);
        self.allocation.set(slot, next);
        next != v
    }

    fn step(&mut self, aff: Affordance) {
        match aff.step {
            Step::Up => {
                self.increment(aff.slot);
            }
            Step::Down => {
                self.decrement(aff.slot);
            }
        }
    }

    pub(crate) fn confirm(&self) -> Option<Allocation> {
        self.is_complete().then_some(self.allocation)
    }

    // `Some` ends the quest
    pub(crate) fn handle(&mut self, ev: &InputEvent, layout: &QuestLayout) -> Option<QuestOutcome> {
        match *ev {
            InputEvent::Quit => {
                debug!(level = self.level, "quest cancelled");
                return Some(QuestOutcome::Cancelled);
            }
            InputEvent::PointerDown { col, row } => match layout.hit_test(col, row) {
                Some(Target::Field(slot)) => self.select(slot),
                Some(Target::Confirm) => {
                    return self.confirm().map(QuestOutcome::Confirmed);
                }
                Some(Target::Arrow(aff)) => {
                    self.pressed = Some(aff);
                    self.step(aff);
                }
                None => {}
            },
            InputEvent::PointerUp { .. } => self.pressed = None,
            InputEvent::PointerMoved { .. } => {}
            InputEvent::Key(code) => return self.handle_key(code),
        }
        None
    }

    fn handle_key(&mut self, code: KeyCode) -> Option<QuestOutcome> {
        match code {
            KeyCode::Char(c) => {
                if let Some(d) = c.to_digit(10) {
                    self.enter_digit(d);
                }
            }
            KeyCode::Backspace => self.erase(),
            KeyCode::Tab => self.select(self.active.map_or(Slot::Own, Slot::next)),
            KeyCode::BackTab => self.select(self.active.map_or(Slot::Other, Slot::prev)),
            KeyCode::Enter => return self.confirm().map(QuestOutcome::Confirmed),
            _ => {}
        }
        None
    }

    pub(crate) fn tick(&mut self, dt: Duration, pointer: &Pointer, layout: &QuestLayout) {
        if !pointer.down {
            self.hold.reset();
            return;
        }
        let Some(aff) = layout.arrow_at(pointer.col, pointer.row) else {
            self.hold.reset();
            return;
        };
        if self
            .hold
            .advance(dt, self.rules.hold_delay, self.rules.hold_interval)
        {
            debug!(held = ?self.hold.held(), ?aff, "hold repeat");
            self.step(aff);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn quest() -> AllocationQuest {
        AllocationQuest::new(Rules::default(), 2)
    }

    fn with(own: u32, group: u32, other: u32) -> AllocationQuest {
        let mut q = quest();
        q.allocation = Allocation::new(own, group, other);
        q
    }

    fn layout() -> QuestLayout {
        QuestLayout::new(80, 24)
    }

    fn click(q: &mut AllocationQuest, l: &QuestLayout, col: u16, row: u16) -> Option<QuestOutcome> {
        let down = q.handle(&InputEvent::PointerDown { col, row }, l);
        q.handle(&InputEvent::PointerUp { col, row }, l);
        down
    }

    fn key(q: &mut AllocationQuest, l: &QuestLayout, code: KeyCode) -> Option<QuestOutcome> {
        q.handle(&InputEvent::Key(code), l)
    }

    fn up(slot: Slot) -> Affordance {
        Affordance {
            slot,
            step: Step::Up,
        }
    }

    fn down(slot: Slot) -> Affordance {
        Affordance {
            slot,
            step: Step::Down,
        }
    }

    #[test]
    fn starts_empty() {
        let q = quest();
        assert_eq!(q.allocation().as_array(), [0, 0, 0]);
        assert_eq!(q.active(), None);
        assert_eq!(q.pressed(), None);
        assert!(!q.is_complete());
        assert_eq!(q.remaining(), 50);
        assert_eq!(q.confirm(), None);
    }

    #[test]
    fn clicking_a_field_makes_it_active() {
        let l = layout();
        let mut q = quest();
        let f = l.row(Slot::Group).field;
        click(&mut q, &l, f.x, f.y);
        assert_eq!(q.active(), Some(Slot::Group));
        let f = l.row(Slot::Other).field;
        click(&mut q, &l, f.x + 3, f.y + 1);
        assert_eq!(q.active(), Some(Slot::Other));
    }

    #[test]
    fn digits_ignored_without_active_field() {
        let l = layout();
        let mut q = quest();
        key(&mut q, &l, KeyCode::Char('7'));
        key(&mut q, &l, KeyCode::Backspace);
        assert_eq!(q.allocation().as_array(), [0, 0, 0]);
    }

    #[test]
    fn digit_entry_appends_and_drops_leading_zero() {
        let mut q = quest();
        q.select(Slot::Own);
        q.enter_digit(0);
        assert_eq!(q.allocation().get(Slot::Own), 0);
        q.enter_digit(5);
        assert_eq!(q.allocation().get(Slot::Own), 5);
        q.enter_digit(2);
        assert_eq!(q.allocation().get(Slot::Own), 50);
    }

    #[test]
    fn digit_entry_clamps_to_max() {
        let mut q = quest();
        q.select(Slot::Group);
        q.enter_digit(9);
        q.enter_digit(9);
        assert_eq!(q.allocation().get(Slot::Group), 50);
    }

    #[test]
    fn overflow_is_absorbed_by_active_slot_only() {
        let mut q = with(40, 5, 5);
        q.select(Slot::Own);
        q.enter_digit(9);
        assert_eq!(q.allocation().as_array(), [40, 5, 5]);

        let mut q = with(10, 30, 0);
        q.select(Slot::Other);
        q.enter_digit(4);
        q.enter_digit(2);
        assert_eq!(q.allocation().as_array(), [10, 30, 10]);
        assert!(q.is_complete());
    }

    #[test]
    fn non_digit_characters_are_ignored() {
        let l = layout();
        let mut q = with(3, 0, 0);
        q.select(Slot::Own);
        for c in ['a', '-', ' ', '+'] {
            key(&mut q, &l, KeyCode::Char(c));
        }
        assert_eq!(q.allocation().as_array(), [3, 0, 0]);
    }

    #[test]
    fn erase_drops_last_digit() {
        let mut q = with(7, 42, 0);
        q.select(Slot::Own);
        q.erase();
        assert_eq!(q.allocation().get(Slot::Own), 0);
        q.erase();
        assert_eq!(q.allocation().get(Slot::Own), 0);
        q.select(Slot::Group);
        q.erase();
        assert_eq!(q.allocation().as_array(), [0, 4, 0]);
    }

    #[test]
    fn increment_refused_at_total() {
        let mut q = with(20, 20, 10);
        assert!(!q.increment(Slot::Own));
        assert_eq!(q.allocation().as_array(), [20, 20, 10]);
        assert!(q.decrement(Slot::Other));
        assert!(q.increment(Slot::Own));
        assert_eq!(q.allocation().as_array(), [21, 20, 9]);
    }

    #[test]
    fn decrement_always_allowed_down_to_zero() {
        let mut q = with(25, 25, 0);
        assert!(q.decrement(Slot::Own));
        assert_eq!(q.allocation().get(Slot::Own), 24);
        assert!(!q.decrement(Slot::Other));
        assert_eq!(q.allocation().get(Slot::Other), 0);
    }

    #[test]
    fn arrow_click_steps_and_marks_pressed() {
        let l = layout();
        let mut q = quest();
        let r = l.row(Slot::Group);
        q.handle(&InputEvent::PointerDown { col: r.up.x, row: r.up.y }, &l);
        assert_eq!(q.pressed(), Some(up(Slot::Group)));
        assert_eq!(q.allocation().get(Slot::Group), 1);
        // release anywhere clears the pressed state
        q.handle(&InputEvent::PointerUp { col: 0, row: 0 }, &l);
        assert_eq!(q.pressed(), None);

        click(&mut q, &l, r.down.x, r.down.y);
        click(&mut q, &l, r.down.x, r.down.y);
        assert_eq!(q.allocation().get(Slot::Group), 0);
    }

    #[test]
    fn confirm_is_a_no_op_until_exact() {
        let l = layout();
        let mut q = with(20, 20, 9);
        let c = l.confirm;
        assert_eq!(click(&mut q, &l, c.x, c.y), None);
        assert_eq!(key(&mut q, &l, KeyCode::Enter), None);
        assert_eq!(q.allocation().as_array(), [20, 20, 9]);

        q.increment(Slot::Other);
        assert_eq!(
            click(&mut q, &l, c.x, c.y),
            Some(QuestOutcome::Confirmed(Allocation::new(20, 20, 10)))
        );
    }

    #[test]
    fn enter_confirms_when_complete() {
        let l = layout();
        let mut q = with(12, 20, 18);
        assert_eq!(
            key(&mut q, &l, KeyCode::Enter),
            Some(QuestOutcome::Confirmed(Allocation::new(12, 20, 18)))
        );
    }

    #[test]
    fn quit_cancels() {
        let l = layout();
        let mut q = with(12, 20, 18);
        assert_eq!(q.handle(&InputEvent::Quit, &l), Some(QuestOutcome::Cancelled));
    }

    #[test]
    fn tab_cycles_active_field() {
        let l = layout();
        let mut q = quest();
        key(&mut q, &l, KeyCode::Tab);
        assert_eq!(q.active(), Some(Slot::Own));
        key(&mut q, &l, KeyCode::Tab);
        assert_eq!(q.active(), Some(Slot::Group));
        key(&mut q, &l, KeyCode::BackTab);
        key(&mut q, &l, KeyCode::BackTab);
        assert_eq!(q.active(), Some(Slot::Other));
    }

    fn held_over(l: &QuestLayout, aff: Affordance) -> Pointer {
        let r = l.arrow(aff);
        Pointer {
            col: r.x,
            row: r.y,
            down: true,
        }
    }

    #[test]
    fn holding_an_arrow_repeats_after_delay() {
        let l = layout();
        let mut q = quest();
        let p = held_over(&l, up(Slot::Own));
        let frame = Duration::from_millis(10);
        for _ in 0..50 {
            q.tick(frame, &p, &l);
        }
        assert_eq!(q.allocation().get(Slot::Own), 0);
        q.tick(frame, &p, &l);
        assert_eq!(q.allocation().get(Slot::Own), 1);
        for _ in 0..30 {
            q.tick(frame, &p, &l);
        }
        assert_eq!(q.allocation().get(Slot::Own), 4);
    }

    #[test]
    fn huge_frame_delta_fires_once() {
        let l = layout();
        let mut q = quest();
        let p = held_over(&l, up(Slot::Group));
        q.tick(Duration::MAX, &p, &l);
        q.tick(Duration::MAX, &p, &l);
        assert_eq!(q.allocation().get(Slot::Group), 1);
    }

    #[test]
    fn hold_repeat_respects_total_gate() {
        let l = layout();
        let mut q = with(0, 25, 24);
        let p = held_over(&l, up(Slot::Own));
        for _ in 0..200 {
            q.tick(Duration::from_millis(10), &p, &l);
        }
        assert_eq!(q.allocation().as_array(), [1, 25, 24]);
    }

    #[test]
    fn hold_repeat_decrements_to_floor() {
        let l = layout();
        let mut q = with(0, 3, 0);
        let p = held_over(&l, down(Slot::Group));
        for _ in 0..200 {
            q.tick(Duration::from_millis(10), &p, &l);
        }
        assert_eq!(q.allocation().get(Slot::Group), 0);
    }

    #[test]
    fn leaving_the_arrow_resets_the_hold() {
        let l = layout();
        let mut q = quest();
        let on = held_over(&l, up(Slot::Own));
        let off = Pointer { col: 0, row: 0, down: true };
        let frame = Duration::from_millis(100);
        for _ in 0..4 {
            q.tick(frame, &on, &l);
        }
        q.tick(frame, &off, &l);
        for _ in 0..5 {
            q.tick(frame, &on, &l);
        }
        assert_eq!(q.allocation().get(Slot::Own), 0);
        q.tick(frame, &on, &l);
        assert_eq!(q.allocation().get(Slot::Own), 1);
    }

    #[test]
    fn releasing_resets_the_hold() {
        let l = layout();
        let mut q = quest();
        let mut p = held_over(&l, up(Slot::Own));
        let frame = Duration::from_millis(100);
        for _ in 0..5 {
            q.tick(frame, &p, &l);
        }
        p.down = false;
        q.tick(frame, &p, &l);
        p.down = true;
        q.tick(frame, &p, &l);
        assert_eq!(q.allocation().get(Slot::Own), 0);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Select(usize),
        Digit(u32),
        Erase,
        Up(usize),
        Down(usize),
        Hold(usize, bool, u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..3usize).prop_map(Op::Select),
            (0..10u32).prop_map(Op::Digit),
            Just(Op::Erase),
            (0..3usize).prop_map(Op::Up),
            (0..3usize).prop_map(Op::Down),
            (0..3usize, any::<bool>(), 0..700u64).prop_map(|(s, u, ms)| Op::Hold(s, u, ms)),
        ]
    }

    fn apply(q: &mut AllocationQuest, l: &QuestLayout, op: &Op) {
        match *op {
            Op::Select(i) => q.select(Slot::ALL[i]),
            Op::Digit(d) => {
                key(q, l, KeyCode::Char(char::from_digit(d, 10).unwrap()));
            }
            Op::Erase => {
                key(q, l, KeyCode::Backspace);
            }
            Op::Up(i) => {
                let r = l.row(Slot::ALL[i]).up;
                click(q, l, r.x, r.y);
            }
            Op::Down(i) => {
                let r = l.row(Slot::ALL[i]).down;
                click(q, l, r.x, r.y);
            }
            Op::Hold(i, is_up, ms) => {
                let aff = if is_up { up(Slot::ALL[i]) } else { down(Slot::ALL[i]) };
                let p = held_over(l, aff);
                q.tick(Duration::from_millis(ms), &p, l);
            }
        }
    }

    proptest! {
        #[test]
        fn slots_stay_bounded_and_sum_never_exceeds_total(ops in prop::collection::vec(op(), 0..200)) {
            let l = layout();
            let mut q = quest();
            for o in &ops {
                apply(&mut q, &l, o);
                for v in q.allocation().as_array() {
                    prop_assert!(v <= 50);
                }
                prop_assert!(q.allocated() <= 50);
                prop_assert_eq!(q.confirm().is_some(), q.allocated() == 50);
            }
        }

        #[test]
        fn digit_entry_never_touches_inactive_slots(ops in prop::collection::vec(op(), 0..100), active in 0..3usize, digit in 0..10u32) {
            let l = layout();
            let mut q = quest();
            for o in &ops {
                apply(&mut q, &l, o);
            }
            let slot = Slot::ALL[active];
            q.select(slot);
            let before = q.allocation();
            q.enter_digit(digit);
            for other in Slot::ALL.into_iter().filter(|s| *s != slot) {
                prop_assert_eq!(q.allocation().get(other), before.get(other));
            }
        }
    }
}
