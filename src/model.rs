use std::fmt;
use std::time::Duration;

pub(crate) const TOTAL_ITEMS: u32 = 50;
pub(crate) const MIN_ALLOCATION: u32 = 0;
pub(crate) const MAX_ALLOCATION: u32 = 50;

// index order is the order of the triple in the result log
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Slot {
    Own,
    Group,
    Other,
}

impl Slot {
    pub(crate) const ALL: [Slot; 3] = [Slot::Own, Slot::Group, Slot::Other];

    pub(crate) fn index(self) -> usize {
        match self {
            Slot::Own => 0,
            Slot::Group => 1,
            Slot::Other => 2,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Slot::Own => "self",
            Slot::Group => "group",
            Slot::Other => "other",
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Slot::Own => "My own inventory:",
            Slot::Group => "My group's inventory:",
            Slot::Other => "Other group's inventory:",
        }
    }

    pub(crate) fn next(self) -> Slot {
        Slot::ALL[(self.index() + 1) % 3]
    }

    pub(crate) fn prev(self) -> Slot {
        Slot::ALL[(self.index() + 2) % 3]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Allocation {
    slots: [u32; 3],
}

impl Allocation {
    pub(crate) fn new(own: u32, group: u32, other: u32) -> Self {
        Self {
            slots: [own, group, other],
        }
    }

    pub(crate) fn get(&self, slot: Slot) -> u32 {
        self.slots[slot.index()]
    }

    pub(crate) fn set(&mut self, slot: Slot, value: u32) {
        self.slots[slot.index()] = value;
    }

    pub(crate) fn sum(&self) -> u32 {
        self.slots.iter().sum()
    }

    pub(crate) fn as_array(&self) -> [u32; 3] {
        self.slots
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.as_array();
        write!(f, "[{a}, {b}, {c}]")
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct LevelCounter(u64);

impl LevelCounter {
    pub(crate) fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn advance(&mut self) -> u64 {
        self.0 = self.0.saturating_add(1);
        self.0
    }

    pub(crate) fn qualifies(self) -> bool {
        self.0 % 2 == 0
    }
}

pub(crate) fn resource_for(level: u64) -> &'static str {
    if level % 4 == 0 {
        "candy bars"
    } else {
        "blankets"
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Rules {
    pub(crate) total_items: u32,
    pub(crate) min_allocation: u32,
    pub(crate) max_allocation: u32,
    pub(crate) hold_delay: Duration,
    pub(crate) hold_interval: Duration,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            total_items: TOTAL_ITEMS,
            min_allocation: MIN_ALLOCATION,
            max_allocation: MAX_ALLOCATION,
            hold_delay: Duration::from_millis(500),
            hold_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum QuestOutcome {
    Confirmed(Allocation),
    Cancelled,
}
