//! Shift modifier policies.

use std::fmt::Display;
use std::str::FromStr;
use crate::keypad::{ActionKind, KeyAction, KeyMap, KeypadConfigError};

/// How the shift key affects the keys resolved after it.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ShiftPolicy {
    /// The shift key is an ordinary key.
    #[default]
    Off,
    /// Shift applies to the next key only. Pressing shift again cancels it.
    OneShot,
    /// Shift toggles on and off with each press of the shift key.
    Lock,
    /// Shift is active while the shift key is held.
    Hold,
}

impl FromStr for ShiftPolicy {
    type Err = KeypadConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(ShiftPolicy::Off),
            "one_shot" | "oneshot" | "one-shot" => Ok(ShiftPolicy::OneShot),
            "lock" => Ok(ShiftPolicy::Lock),
            "hold" => Ok(ShiftPolicy::Hold),
            _ => Err(KeypadConfigError::UnknownShiftPolicy(s.to_string())),
        }
    }
}

impl Display for ShiftPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            ShiftPolicy::Off => "off",
            ShiftPolicy::OneShot => "one_shot",
            ShiftPolicy::Lock => "lock",
            ShiftPolicy::Hold => "hold",
        };
        write!(f, "{}", str)
    }
}

/// State of the shift latch.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ShiftLatch {
    #[default]
    Unshifted,
    /// [ShiftPolicy::OneShot]: the next key is shifted.
    ShiftedPending,
    /// [ShiftPolicy::Lock]: shifted until shift is pressed again.
    ShiftedLocked,
    /// [ShiftPolicy::Hold]: shifted until the shift key is released.
    ShiftedHeld,
}

impl ShiftLatch {
    pub fn is_shifted(&self) -> bool {
        !matches!(self, ShiftLatch::Unshifted)
    }
}

/// Turns dequeued [KeyAction]s into characters, tracking the shift latch.
#[derive(Copy, Clone, Debug)]
pub struct ShiftResolver {
    policy: ShiftPolicy,
    shift_key: Option<char>,
    latch: ShiftLatch,
}

impl ShiftResolver {
    pub fn new(policy: ShiftPolicy, shift_key: Option<char>) -> Self {
        Self {
            policy,
            shift_key,
            latch: ShiftLatch::Unshifted,
        }
    }

    pub fn policy(&self) -> ShiftPolicy {
        self.policy
    }

    pub fn shift_key(&self) -> Option<char> {
        self.shift_key
    }

    pub fn latch(&self) -> ShiftLatch {
        self.latch
    }

    /// Whether `code` is the shift key under the current policy.
    pub fn is_shift_key(&self, code: char) -> bool {
        self.policy != ShiftPolicy::Off && self.shift_key == Some(code)
    }

    /// Resolves one action against `keymap`.
    ///
    /// Returns the character to emit, or `None` for releases and for the shift key itself.
    /// Repeats of the shift key act like presses, so holding it under [ShiftPolicy::Lock]
    /// toggles the latch once per repeat.
    pub fn resolve(&mut self, action: &KeyAction, keymap: &KeyMap) -> Option<char> {
        let raw = keymap.unshifted(action.index)?;
        let is_shift = self.is_shift_key(raw);

        match action.kind {
            ActionKind::Release => {
                if is_shift && self.policy == ShiftPolicy::Hold {
                    self.latch = ShiftLatch::Unshifted;
                }
                None
            }
            ActionKind::Press | ActionKind::Repeat if is_shift => {
                self.latch = self.shift_pressed();
                None
            }
            ActionKind::Press | ActionKind::Repeat => {
                let c = keymap.lookup(action.index, self.latch.is_shifted());
                if self.latch == ShiftLatch::ShiftedPending {
                    self.latch = ShiftLatch::Unshifted;
                }
                c
            }
        }
    }

    fn shift_pressed(&self) -> ShiftLatch {
        match (self.policy, self.latch) {
            (ShiftPolicy::Off, latch) => latch,
            (ShiftPolicy::OneShot, ShiftLatch::Unshifted) => ShiftLatch::ShiftedPending,
            (ShiftPolicy::OneShot, _) => ShiftLatch::Unshifted,
            (ShiftPolicy::Lock, ShiftLatch::Unshifted) => ShiftLatch::ShiftedLocked,
            (ShiftPolicy::Lock, _) => ShiftLatch::Unshifted,
            (ShiftPolicy::Hold, _) => ShiftLatch::ShiftedHeld,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = "123A456B789C*0#D";
    const SHIFTED: &str = "!@#a$%^b&*(c.)=d";
    const SHIFT_INDEX: usize = 3;

    fn keymap() -> KeyMap {
        KeyMap::new(16, MAP, Some(SHIFTED)).unwrap()
    }

    fn action(index: usize, kind: ActionKind) -> KeyAction {
        KeyAction {
            index,
            shifted: false,
            kind,
        }
    }

    fn tap(resolver: &mut ShiftResolver, map: &KeyMap, index: usize) -> Option<char> {
        let c = resolver.resolve(&action(index, ActionKind::Press), map);
        assert_eq!(resolver.resolve(&action(index, ActionKind::Release), map), None);
        c
    }

    #[test]
    fn policy_parse_and_display() {
        for policy in [ShiftPolicy::Off, ShiftPolicy::OneShot, ShiftPolicy::Lock, ShiftPolicy::Hold] {
            assert_eq!(policy.to_string().parse::<ShiftPolicy>(), Ok(policy));
        }
        assert_eq!("OneShot".parse::<ShiftPolicy>(), Ok(ShiftPolicy::OneShot));
        assert_eq!(
            "sticky".parse::<ShiftPolicy>(),
            Err(KeypadConfigError::UnknownShiftPolicy("sticky".to_string())),
        );
    }

    #[test]
    fn off_emits_shift_key() {
        let map = keymap();
        let mut resolver = ShiftResolver::new(ShiftPolicy::Off, Some('A'));
        assert_eq!(tap(&mut resolver, &map, SHIFT_INDEX), Some('A'));
        assert_eq!(tap(&mut resolver, &map, 0), Some('1'));
        assert_eq!(resolver.latch(), ShiftLatch::Unshifted);
    }

    #[test]
    fn one_shot_shifts_next_key_only() {
        let map = keymap();
        let mut resolver = ShiftResolver::new(ShiftPolicy::OneShot, Some('A'));
        assert_eq!(tap(&mut resolver, &map, SHIFT_INDEX), None);
        assert_eq!(resolver.latch(), ShiftLatch::ShiftedPending);
        assert_eq!(tap(&mut resolver, &map, 0), Some('!'));
        assert_eq!(tap(&mut resolver, &map, 0), Some('1'));
        assert_eq!(resolver.latch(), ShiftLatch::Unshifted);
    }

    #[test]
    fn one_shot_double_shift_cancels() {
        let map = keymap();
        let mut resolver = ShiftResolver::new(ShiftPolicy::OneShot, Some('A'));
        assert_eq!(tap(&mut resolver, &map, SHIFT_INDEX), None);
        assert_eq!(tap(&mut resolver, &map, SHIFT_INDEX), None);
        assert_eq!(resolver.latch(), ShiftLatch::Unshifted);
        assert_eq!(tap(&mut resolver, &map, 4), Some('4'));
    }

    #[test]
    fn lock_toggles() {
        let map = keymap();
        let mut resolver = ShiftResolver::new(ShiftPolicy::Lock, Some('A'));
        assert_eq!(tap(&mut resolver, &map, SHIFT_INDEX), None);
        assert_eq!(tap(&mut resolver, &map, 1), Some('@'));
        assert_eq!(tap(&mut resolver, &map, 2), Some('#'));
        assert_eq!(resolver.latch(), ShiftLatch::ShiftedLocked);
        assert_eq!(tap(&mut resolver, &map, SHIFT_INDEX), None);
        assert_eq!(tap(&mut resolver, &map, 1), Some('2'));
        assert_eq!(tap(&mut resolver, &map, 2), Some('3'));
    }

    #[test]
    fn hold_follows_shift_key() {
        let map = keymap();
        let mut resolver = ShiftResolver::new(ShiftPolicy::Hold, Some('A'));
        assert_eq!(resolver.resolve(&action(SHIFT_INDEX, ActionKind::Press), &map), None);
        assert_eq!(resolver.latch(), ShiftLatch::ShiftedHeld);
        assert_eq!(tap(&mut resolver, &map, 7), Some('b'));
        assert_eq!(tap(&mut resolver, &map, 8), Some('&'));
        assert_eq!(resolver.resolve(&action(SHIFT_INDEX, ActionKind::Repeat), &map), None);
        assert_eq!(resolver.latch(), ShiftLatch::ShiftedHeld);
        assert_eq!(resolver.resolve(&action(SHIFT_INDEX, ActionKind::Release), &map), None);
        assert_eq!(resolver.latch(), ShiftLatch::Unshifted);
        assert_eq!(tap(&mut resolver, &map, 7), Some('B'));
    }

    #[test]
    fn repeats_resolve_like_presses() {
        let map = keymap();
        let mut resolver = ShiftResolver::new(ShiftPolicy::Lock, Some('A'));
        resolver.resolve(&action(SHIFT_INDEX, ActionKind::Press), &map);
        assert_eq!(resolver.resolve(&action(13, ActionKind::Repeat), &map), Some(')'));
        assert_eq!(resolver.resolve(&action(SHIFT_INDEX, ActionKind::Repeat), &map), None);
        assert_eq!(resolver.latch(), ShiftLatch::Unshifted);
        assert_eq!(resolver.resolve(&action(13, ActionKind::Repeat), &map), Some('0'));
        assert_eq!(resolver.resolve(&action(SHIFT_INDEX, ActionKind::Repeat), &map), None);
        assert_eq!(resolver.latch(), ShiftLatch::ShiftedLocked);
    }

    #[test]
    fn one_shot_shift_repeat_toggles() {
        let map = keymap();
        let mut resolver = ShiftResolver::new(ShiftPolicy::OneShot, Some('A'));
        resolver.resolve(&action(SHIFT_INDEX, ActionKind::Press), &map);
        assert_eq!(resolver.latch(), ShiftLatch::ShiftedPending);
        resolver.resolve(&action(SHIFT_INDEX, ActionKind::Repeat), &map);
        assert_eq!(resolver.latch(), ShiftLatch::Unshifted);
        assert_eq!(tap(&mut resolver, &map, 0), Some('1'));
    }

    #[test]
    fn out_of_range_index_is_ignored() {
        let map = keymap();
        let mut resolver = ShiftResolver::new(ShiftPolicy::OneShot, Some('A'));
        assert_eq!(resolver.resolve(&action(99, ActionKind::Press), &map), None);
    }
}
