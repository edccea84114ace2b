use std::fmt::{Debug, Formatter};
use crate::keypad::KeypadConfigError;

/// Character lookup tables indexed by flattened key index.
#[derive(Clone, Eq, PartialEq)]
pub struct KeyMap {
    unshifted: Box<[char]>,
    shifted: Option<Box<[char]>>,
}

impl KeyMap {
    /// Builds a key map for `keys` keys, one character per key.
    ///
    /// # Errors
    /// - [KeypadConfigError::KeyMapLength] if `unshifted` does not have exactly `keys` characters.
    /// - [KeypadConfigError::ShiftedKeyMapLength] likewise for `shifted`.
    pub fn new(keys: usize, unshifted: &str, shifted: Option<&str>) -> Result<Self, KeypadConfigError> {
        let unshifted: Box<[char]> = unshifted.chars().collect();
        if unshifted.len() != keys {
            return Err(KeypadConfigError::KeyMapLength {
                expected: keys,
                actual: unshifted.len(),
            });
        }

        let shifted = match shifted {
            Some(map) => {
                let map: Box<[char]> = map.chars().collect();
                if map.len() != keys {
                    return Err(KeypadConfigError::ShiftedKeyMapLength {
                        expected: keys,
                        actual: map.len(),
                    });
                }
                Some(map)
            }
            None => None,
        };

        Ok(Self { unshifted, shifted })
    }

    pub fn len(&self) -> usize {
        self.unshifted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unshifted.is_empty()
    }

    pub fn has_shifted(&self) -> bool {
        self.shifted.is_some()
    }

    /// Gets the unshifted character of the key at `index`.
    pub fn unshifted(&self, index: usize) -> Option<char> {
        self.unshifted.get(index).copied()
    }

    /// Gets the shifted character of the key at `index`.
    ///
    /// Keys fall back to their unshifted character when there is no shifted map.
    pub fn shifted(&self, index: usize) -> Option<char> {
        match &self.shifted {
            Some(map) => map.get(index).copied(),
            None => self.unshifted(index),
        }
    }

    pub fn lookup(&self, index: usize, shifted: bool) -> Option<char> {
        if shifted {
            self.shifted(index)
        } else {
            self.unshifted(index)
        }
    }

    /// Finds the index of the first key whose unshifted character is `c`.
    pub fn position_of(&self, c: char) -> Option<usize> {
        self.unshifted.iter().position(|&k| k == c)
    }
}

impl Debug for KeyMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let unshifted: String = self.unshifted.iter().collect();
        match &self.shifted {
            Some(map) => write!(f, "KeyMap({:?}, {:?})", unshifted, map.iter().collect::<String>()),
            None => write!(f, "KeyMap({:?})", unshifted),
        }
    }
}
