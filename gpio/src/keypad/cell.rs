//! Per-key debounce and auto-repeat state machine.
//!
//! Presses are reported optimistically on the first closed reading; the debounce window then
//! only guards the settle time after the press and after the release.
//! Deadlines accumulate (`+=`) instead of restarting from the current tick, so the repeat cadence
//! does not drift when scans arrive at irregular intervals.

use crate::tick::deadline_reached;

/// The state of a single key in the matrix.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum KeyState {
    #[default]
    Released,
    /// Pressed was reported; waiting for contacts to settle.
    PressDebounce,
    /// Held; waiting for the initial repeat delay.
    Pressed,
    /// Held past the repeat delay; repeating at the repeat interval.
    Repeating,
    /// Release was reported; waiting for contacts to settle.
    ReleaseDebounce,
}

impl KeyState {
    /// Whether the key is considered held down.
    pub fn is_down(&self) -> bool {
        matches!(self, KeyState::PressDebounce | KeyState::Pressed | KeyState::Repeating)
    }
}

/// The kind of a [KeyAction].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ActionKind {
    #[default]
    Press,
    Release,
    Repeat,
}

/// A discrete key event, produced by a scan and consumed by the application.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct KeyAction {
    /// Flattened (row-major) key index.
    pub index: usize,
    /// Whether the shift latch was active when the scan produced this action.
    pub shifted: bool,
    pub kind: ActionKind,
}

/// Timing parameters of the state machine, in milliseconds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct KeyTiming {
    pub debounce: u32,
    pub repeat_delay: u32,
    pub repeat: u32,
}

/// One entry of the key state table.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct KeyCell {
    state: KeyState,
    next_event: u32,
}

impl KeyCell {
    pub const fn new() -> Self {
        Self {
            state: KeyState::Released,
            next_event: 0,
        }
    }

    /// A cell for a key that was already closed when the keypad was built.
    ///
    /// It starts in [KeyState::Pressed] without ever reporting a press; the first release
    /// is reported as usual.
    pub const fn held() -> Self {
        Self {
            state: KeyState::Pressed,
            next_event: 0,
        }
    }

    pub fn state(&self) -> KeyState {
        self.state
    }

    /// Deadline of the pending transition. Always `0` while [KeyState::Released].
    pub fn next_event(&self) -> u32 {
        self.next_event
    }

    /// Advances the state machine with the current reading.
    ///
    /// Returns the action the transition produced, if any.
    pub fn update(&mut self, pressed: bool, now: u32, timing: &KeyTiming) -> Option<ActionKind> {
        match self.state {
            KeyState::Released => {
                if pressed {
                    self.state = KeyState::PressDebounce;
                    self.next_event = now.wrapping_add(timing.debounce);
                    return Some(ActionKind::Press);
                }
            }
            KeyState::PressDebounce => {
                if deadline_reached(now, self.next_event) {
                    self.state = KeyState::Pressed;
                    self.next_event = self.next_event.wrapping_add(timing.repeat_delay);
                }
            }
            KeyState::Pressed | KeyState::Repeating => {
                if !pressed {
                    // Accumulates onto whatever the repeat deadline was.
                    self.state = KeyState::ReleaseDebounce;
                    self.next_event = self.next_event.wrapping_add(timing.debounce);
                    return Some(ActionKind::Release);
                }
                if deadline_reached(now, self.next_event) {
                    self.state = KeyState::Repeating;
                    self.next_event = self.next_event.wrapping_add(timing.repeat);
                    return Some(ActionKind::Repeat);
                }
            }
            KeyState::ReleaseDebounce => {
                if deadline_reached(now, self.next_event) {
                    self.state = KeyState::Released;
                    self.next_event = 0;
                }
            }
        }
        None
    }
}
