pub mod keypad;
pub mod sim;
pub mod tick;

use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("error: {0}")]
    Other(String),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// Specifies the active level of a GPIO line.
///
/// By default, the active level is high.
/// Matrix keyboards usually pull their columns up and drive rows low, making both sides active-low.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioActiveLevel {
    #[default] High,
    Low,
}

impl GpioActiveLevel {
    /// Gets the electrical state for the logical `value` based on the active level.
    ///
    /// The mapping is symmetric, so it also turns an electrical reading back into a logical one.
    pub fn get_state(&self, value: bool) -> bool {
        match self {
            GpioActiveLevel::High => value,
            GpioActiveLevel::Low => !value,
        }
    }
}

pub trait GpioInput: Debug {
    /// Reads the logical state of the GPIO pin.
    fn read(&self) -> GpioResult<bool>;
}

pub trait GpioOutput: Debug {
    /// Writes the logical state of the GPIO pin.
    fn write(&self, value: bool) -> GpioResult<()>;
}

/// An analog-capable input, such as an ADC channel sharing a pin with a matrix column.
pub trait AnalogInput: Debug {
    /// Reads the raw converter value.
    fn read_raw(&self) -> GpioResult<u16>;
}

/// An analog input turned into a digital one by comparing against a threshold.
///
/// With [GpioActiveLevel::Low] (the usual pulled-up column), readings below the threshold are active.
/// With [GpioActiveLevel::High], readings at or above it are.
pub struct ThresholdInput<'a> {
    input: &'a dyn AnalogInput,
    pub threshold: u16,
    pub active_level: GpioActiveLevel,
}

impl <'a> ThresholdInput<'a> {
    pub fn new(input: &'a dyn AnalogInput, threshold: u16) -> Self {
        Self {
            input,
            threshold,
            active_level: GpioActiveLevel::Low,
        }
    }

    pub fn with_active_level(mut self, level: GpioActiveLevel) -> Self {
        self.active_level = level;
        self
    }
}

impl Debug for ThresholdInput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}(threshold {})", self.input, self.threshold)
    }
}

impl GpioInput for ThresholdInput<'_> {
    fn read(&self) -> GpioResult<bool> {
        let high = self.input.read_raw()? >= self.threshold;
        Ok(self.active_level.get_state(high))
    }
}
