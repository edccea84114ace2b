//! Bounded action queue between the scan step and the application.

use crate::keypad::KeyAction;

/// Fixed-capacity FIFO of [KeyAction]s that overwrites the oldest entry when full.
///
/// One slot is kept free to tell a full queue from an empty one, so a queue of capacity `N`
/// holds at most `N - 1` actions.
#[derive(Clone, Debug)]
pub struct ActionQueue {
    slots: Box<[KeyAction]>,
    head: usize,
    tail: usize,
}

impl ActionQueue {
    /// Capacity used when none is configured.
    pub const DEFAULT_CAPACITY: usize = 9;

    /// Creates a queue with `capacity` slots. Capacities below 2 are raised to 2.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![KeyAction::default(); capacity.max(2)].into_boxed_slice(),
            head: 0,
            tail: 0,
        }
    }

    /// Number of slots, including the one kept free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        (self.head + self.slots.len() - self.tail) % self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Appends an action.
    ///
    /// Returns `true` if the queue was full and the oldest action was dropped to make room.
    pub fn put(&mut self, action: KeyAction) -> bool {
        self.slots[self.head] = action;
        self.head = (self.head + 1) % self.slots.len();
        if self.head == self.tail {
            self.tail = (self.tail + 1) % self.slots.len();
            return true;
        }
        false
    }

    /// Removes and returns the oldest action.
    pub fn get(&mut self) -> Option<KeyAction> {
        if self.is_empty() {
            return None;
        }
        let action = self.slots[self.tail];
        self.tail = (self.tail + 1) % self.slots.len();
        Some(action)
    }

    /// Discards all pending actions.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
