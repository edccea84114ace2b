//! Matrix keypad scanning.
//!
//! Every key of the matrix runs its own debounce/repeat state machine ([KeyCell]).
//! A scan sweeps the matrix once and queues the resulting [KeyAction]s, which the application
//! drains later, either raw or resolved into characters through the [ShiftPolicy].

mod cell;
mod config;
mod gpio;
mod keymap;
mod queue;
mod scan;
mod shift;

use std::fmt::Debug;
use crate::GpioResult;
pub use cell::*;
pub use config::*;
pub use gpio::*;
pub use keymap::*;
pub use queue::*;
pub use scan::*;
pub use shift::*;

/// The lines of a key matrix, as seen by the scanner.
///
/// Implementations must let a row settle electrically before [read_column](Self::read_column)
/// is called for it.
pub trait MatrixPins: Debug {
    fn rows(&self) -> usize;
    fn cols(&self) -> usize;

    /// Activates or deactivates `row`.
    fn set_row(&mut self, row: usize, active: bool) -> GpioResult<()>;

    /// Reads whether the key at `col` of the active row is pressed.
    fn read_column(&mut self, col: usize) -> GpioResult<bool>;
}

/// The `Keypad` trait defines the interface for cooperatively scanned keypads.
///
/// Several keypads can be driven from one loop by keeping them in a collection and calling
/// [scan](Keypad::scan) on each.
pub trait Keypad: Debug {
    /// Scans the whole matrix once, using the keypad's own tick source.
    fn scan(&mut self) -> GpioResult<()>;

    /// Scans the whole matrix once at tick `now` (milliseconds).
    fn scan_at(&mut self, now: u32) -> GpioResult<()>;

    /// Takes the oldest unresolved action.
    fn next_action(&mut self) -> Option<KeyAction>;

    /// Resolves queued actions until one yields a character.
    ///
    /// Releases and shift key presses are consumed without producing one.
    fn next_key(&mut self) -> GpioResult<Option<char>>;
}
