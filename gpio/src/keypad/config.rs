use std::time::Duration;
use thiserror::Error;
use crate::GpioError;
use crate::keypad::{ActionQueue, KeyMap, KeyTiming, ShiftPolicy};

/// Errors detected once, when a keypad is built.
#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum KeypadConfigError {
    #[error("the matrix needs at least one row and one column")]
    EmptyMatrix,
    #[error("key map has {actual} keys, expected {expected}")]
    KeyMapLength { expected: usize, actual: usize },
    #[error("shifted key map has {actual} keys, expected {expected}")]
    ShiftedKeyMapLength { expected: usize, actual: usize },
    #[error("shift policy {0} needs a shift key")]
    MissingShiftKey(ShiftPolicy),
    #[error("shift key {0:?} is not on the key map")]
    ShiftKeyNotMapped(char),
    #[error("hold shift policy needs release events")]
    HoldWithoutReleases,
    #[error("action queue capacity must be at least 2, got {0}")]
    QueueCapacity(usize),
    #[error("repeat interval must not be zero")]
    ZeroRepeatTime,
    #[error("{0} does not fit in a millisecond tick")]
    TimingOverflow(&'static str),
    #[error("unknown shift policy: {0}")]
    UnknownShiftPolicy(String),
}

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum KeypadError {
    #[error("invalid keypad configuration: {0}")]
    Config(#[from] KeypadConfigError),
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),
}

pub type KeypadResult<T> = Result<T, KeypadError>;

/// Construction parameters of a [MatrixKeypad](crate::keypad::MatrixKeypad).
///
/// Matrix dimensions come from the pins; everything else is set here.
#[derive(Clone, Debug)]
pub struct KeypadConfig {
    /// One character per key, row-major.
    pub keymap: String,
    pub shifted_keymap: Option<String>,
    pub shift_key: Option<char>,
    pub shift_policy: ShiftPolicy,
    pub debounce_time: Duration,
    /// Time a key must be held before it starts repeating.
    pub repeat_delay: Duration,
    /// Time between repeats.
    pub repeat_time: Duration,
    pub queue_capacity: usize,
    /// Whether release actions are queued.
    pub report_releases: bool,
}

impl KeypadConfig {
    pub fn new(keymap: impl Into<String>) -> Self {
        Self {
            keymap: keymap.into(),
            shifted_keymap: None,
            shift_key: None,
            shift_policy: ShiftPolicy::Off,
            debounce_time: Duration::from_millis(20),
            repeat_delay: Duration::from_millis(300),
            repeat_time: Duration::from_millis(20),
            queue_capacity: ActionQueue::DEFAULT_CAPACITY,
            report_releases: true,
        }
    }

    pub fn with_shifted_keymap(mut self, keymap: impl Into<String>) -> Self {
        self.shifted_keymap = Some(keymap.into());
        self
    }

    pub fn with_shift(mut self, key: char, policy: ShiftPolicy) -> Self {
        self.shift_key = Some(key);
        self.shift_policy = policy;
        self
    }

    pub fn with_debounce_time(mut self, debounce_time: Duration) -> Self {
        self.debounce_time = debounce_time;
        self
    }

    pub fn with_repeat(mut self, delay: Duration, interval: Duration) -> Self {
        self.repeat_delay = delay;
        self.repeat_time = interval;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn report_releases(mut self, report: bool) -> Self {
        self.report_releases = report;
        self
    }

    /// Checks the configuration against a `rows` x `cols` matrix.
    ///
    /// Returns the key map and the state machine timing on success.
    pub(crate) fn validate(&self, rows: usize, cols: usize) -> Result<(KeyMap, KeyTiming), KeypadConfigError> {
        if rows == 0 || cols == 0 {
            return Err(KeypadConfigError::EmptyMatrix);
        }

        let keymap = KeyMap::new(rows * cols, &self.keymap, self.shifted_keymap.as_deref())?;

        if self.shift_policy != ShiftPolicy::Off {
            let key = self.shift_key.ok_or(KeypadConfigError::MissingShiftKey(self.shift_policy))?;
            if keymap.position_of(key).is_none() {
                return Err(KeypadConfigError::ShiftKeyNotMapped(key));
            }
            if self.shift_policy == ShiftPolicy::Hold && !self.report_releases {
                return Err(KeypadConfigError::HoldWithoutReleases);
            }
        }

        if self.queue_capacity < 2 {
            return Err(KeypadConfigError::QueueCapacity(self.queue_capacity));
        }

        let timing = KeyTiming {
            debounce: to_millis(self.debounce_time, "debounce time")?,
            repeat_delay: to_millis(self.repeat_delay, "repeat delay")?,
            repeat: to_millis(self.repeat_time, "repeat interval")?,
        };
        if timing.repeat == 0 {
            return Err(KeypadConfigError::ZeroRepeatTime);
        }

        Ok((keymap, timing))
    }
}

/// Converts a duration to whole milliseconds, keeping it under half the tick range.
fn to_millis(duration: Duration, what: &'static str) -> Result<u32, KeypadConfigError> {
    u32::try_from(duration.as_millis())
        .ok()
        .filter(|&ms| ms <= i32::MAX as u32)
        .ok_or(KeypadConfigError::TimingOverflow(what))
}
