//! Simulated GPIO backend for a wired key matrix.
//!
//! The matrix hands out row outputs and column inputs the same way a real driver hands out pins:
//! each line can be claimed once and is released again when the handle is dropped.
//! Switches are opened and closed through shared references, so a test or the application can
//! press keys while the keypad holds the pins.

use crate::{AnalogInput, GpioError, GpioInput, GpioOutput, GpioResult};
use bitvec::vec::BitVec;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// An in-memory key matrix with `rows` driven lines and `cols` sensed lines.
pub struct SimKeyMatrix {
    rows: usize,
    cols: usize,
    diodes: bool,
    driven: BitVec<AtomicU8>,
    closed: BitVec<AtomicU8>,
    used_rows: BitVec<AtomicU8>,
    used_cols: BitVec<AtomicU8>,
}

impl SimKeyMatrix {
    /// Full-scale reading of an idle (pulled-up) analog column.
    pub const ANALOG_IDLE: u16 = 1023;

    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            diodes: true,
            driven: BitVec::repeat(false, rows),
            closed: BitVec::repeat(false, rows * cols),
            used_rows: BitVec::repeat(false, rows),
            used_cols: BitVec::repeat(false, cols),
        }
    }

    /// Removes the per-switch diodes, so current can flow backwards through closed switches.
    ///
    /// Three closed switches on the corners of a rectangle then make the fourth corner read as
    /// pressed too (ghosting).
    pub fn without_diodes(mut self) -> Self {
        self.diodes = false;
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Claims the output driving `row`.
    pub fn row_output(&self, row: usize) -> GpioResult<SimRowOutput<'_>> {
        if row >= self.rows {
            return Err(GpioError::InvalidArgument);
        }
        if self.used_rows[row] {
            return Err(GpioError::AlreadyInUse);
        }
        self.used_rows.set_aliased(row, true);
        Ok(SimRowOutput { matrix: self, row })
    }

    /// Claims the digital input sensing `col`.
    pub fn column_input(&self, col: usize) -> GpioResult<SimColumnInput<'_>> {
        self.claim_column(col)?;
        Ok(SimColumnInput { matrix: self, col })
    }

    /// Claims `col` as an analog channel.
    ///
    /// Reads [Self::ANALOG_IDLE] while the column floats high and `0` while it is pulled down.
    pub fn analog_column(&self, col: usize) -> GpioResult<SimAnalogColumn<'_>> {
        self.claim_column(col)?;
        Ok(SimAnalogColumn { matrix: self, col })
    }

    fn claim_column(&self, col: usize) -> GpioResult<()> {
        if col >= self.cols {
            return Err(GpioError::InvalidArgument);
        }
        if self.used_cols[col] {
            return Err(GpioError::AlreadyInUse);
        }
        self.used_cols.set_aliased(col, true);
        Ok(())
    }

    /// Opens or closes the switch at (`row`, `col`). Out-of-range positions are ignored.
    pub fn set_key(&self, row: usize, col: usize, pressed: bool) {
        if row < self.rows && col < self.cols {
            self.closed.set_aliased(row * self.cols + col, pressed);
        }
    }

    pub fn press(&self, row: usize, col: usize) {
        self.set_key(row, col, true);
    }

    pub fn release(&self, row: usize, col: usize) {
        self.set_key(row, col, false);
    }

    /// Opens or closes the switch at a flattened (row-major) index.
    pub fn set_index(&self, index: usize, pressed: bool) {
        if self.cols > 0 {
            self.set_key(index / self.cols, index % self.cols, pressed);
        }
    }

    pub fn release_all(&self) {
        for index in 0..self.closed.len() {
            self.closed.set_aliased(index, false);
        }
    }

    pub fn is_driven(&self, row: usize) -> bool {
        row < self.rows && self.driven[row]
    }

    fn is_closed(&self, row: usize, col: usize) -> bool {
        self.closed[row * self.cols + col]
    }

    /// Whether `col` is connected to any driven row through closed switches.
    fn column_active(&self, col: usize) -> bool {
        if self.diodes {
            return (0..self.rows).any(|row| self.driven[row] && self.is_closed(row, col));
        }

        // Without diodes every closed switch is a bidirectional short, so walk the graph of
        // rows and columns starting from the driven rows.
        let mut row_seen: Vec<bool> = (0..self.rows).map(|row| self.driven[row]).collect();
        let mut col_seen = vec![false; self.cols];
        let mut changed = true;
        while changed {
            changed = false;
            for row in 0..self.rows {
                for c in 0..self.cols {
                    if !self.is_closed(row, c) || row_seen[row] == col_seen[c] {
                        continue;
                    }
                    row_seen[row] = true;
                    col_seen[c] = true;
                    changed = true;
                }
            }
        }
        col_seen[col]
    }
}

impl Debug for SimKeyMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimKeyMatrix({}x{})", self.rows, self.cols)
    }
}

/// Output driving one row of a [SimKeyMatrix]. Writing `true` activates the row.
pub struct SimRowOutput<'a> {
    matrix: &'a SimKeyMatrix,
    row: usize,
}

impl Debug for SimRowOutput<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[row {}][output]", self.matrix, self.row)
    }
}

impl GpioOutput for SimRowOutput<'_> {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.matrix.driven.set_aliased(self.row, value);
        Ok(())
    }
}

impl Drop for SimRowOutput<'_> {
    fn drop(&mut self) {
        self.matrix.driven.set_aliased(self.row, false);
        self.matrix.used_rows.set_aliased(self.row, false);
    }
}

/// Digital input sensing one column of a [SimKeyMatrix]. Reads `true` while a key pulls it.
pub struct SimColumnInput<'a> {
    matrix: &'a SimKeyMatrix,
    col: usize,
}

impl Debug for SimColumnInput<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[col {}][input]", self.matrix, self.col)
    }
}

impl GpioInput for SimColumnInput<'_> {
    fn read(&self) -> GpioResult<bool> {
        Ok(self.matrix.column_active(self.col))
    }
}

impl Drop for SimColumnInput<'_> {
    fn drop(&mut self) {
        self.matrix.used_cols.set_aliased(self.col, false);
    }
}

/// Analog channel on one column of a [SimKeyMatrix].
pub struct SimAnalogColumn<'a> {
    matrix: &'a SimKeyMatrix,
    col: usize,
}

impl Debug for SimAnalogColumn<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[col {}][analog]", self.matrix, self.col)
    }
}

impl AnalogInput for SimAnalogColumn<'_> {
    fn read_raw(&self) -> GpioResult<u16> {
        if self.matrix.column_active(self.col) {
            Ok(0)
        } else {
            Ok(SimKeyMatrix::ANALOG_IDLE)
        }
    }
}

impl Drop for SimAnalogColumn<'_> {
    fn drop(&mut self) {
        self.matrix.used_cols.set_aliased(self.col, false);
    }
}

/// A standalone output pin, e.g. an indicator LED.
#[derive(Debug, Default)]
pub struct SimOutputPin {
    level: AtomicBool,
}

impl SimOutputPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.level.load(Ordering::Relaxed)
    }
}

impl GpioOutput for SimOutputPin {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.level.store(value, Ordering::Relaxed);
        Ok(())
    }
}
