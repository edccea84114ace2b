use std::fmt::{Debug, Formatter};
use crate::{GpioError, GpioInput, GpioOutput, GpioResult};
use crate::keypad::MatrixPins;

/// Matrix lines backed by GPIO pins: one output per row, one input per column.
///
/// Active levels, pull-ups and analog thresholds are configured on the pins themselves;
/// an analog column is passed in as a [ThresholdInput](crate::ThresholdInput).
pub struct GpioMatrix<'a> {
    rows: Vec<&'a dyn GpioOutput>,
    cols: Vec<&'a dyn GpioInput>,
}

impl Debug for GpioMatrix<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpioMatrix({:?}, {:?})", self.rows, self.cols)
    }
}

impl <'a> GpioMatrix<'a> {
    /// Creates a new `GpioMatrix` with the specified row outputs and column inputs.
    ///
    /// Rows are written to select the active row, columns are read to find the pressed keys
    /// in it.
    pub fn new(rows: Vec<&'a dyn GpioOutput>, cols: Vec<&'a dyn GpioInput>) -> Self {
        GpioMatrix { rows, cols }
    }
}

impl MatrixPins for GpioMatrix<'_> {
    fn rows(&self) -> usize {
        self.rows.len()
    }

    fn cols(&self) -> usize {
        self.cols.len()
    }

    fn set_row(&mut self, row: usize, active: bool) -> GpioResult<()> {
        self.rows.get(row).ok_or(GpioError::InvalidArgument)?.write(active)
    }

    fn read_column(&mut self, col: usize) -> GpioResult<bool> {
        self.cols.get(col).ok_or(GpioError::InvalidArgument)?.read()
    }
}
