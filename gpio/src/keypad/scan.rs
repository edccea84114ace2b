use std::fmt::{Debug, Formatter};
use log::{debug, info, trace, warn};
use crate::{GpioOutput, GpioResult};
use crate::keypad::{
    ActionKind, ActionQueue, KeyAction, KeyCell, KeyMap, KeyState, KeyTiming, Keypad,
    KeypadConfig, KeypadResult, MatrixPins, ShiftLatch, ShiftPolicy, ShiftResolver,
};
use crate::tick::{MonotonicTicks, TickSource};

/// A scanned matrix keypad with debounce, auto-repeat and a shift modifier.
///
/// Call [scan](Keypad::scan) once per control loop iteration and drain the results with
/// [next_key](Keypad::next_key) or [next_action](Keypad::next_action).
/// Nothing blocks and nothing allocates after construction.
pub struct MatrixKeypad<'a> {
    pins: Box<dyn MatrixPins + 'a>,
    rows: usize,
    cols: usize,
    cells: Box<[KeyCell]>,
    timing: KeyTiming,
    keymap: KeyMap,
    queue: ActionQueue,
    report_releases: bool,
    shift: ShiftResolver,
    shift_indicator: Option<&'a dyn GpioOutput>,
    ticks: Box<dyn TickSource + 'a>,
}

impl Debug for MatrixKeypad<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MatrixKeypad({}x{}, {:?})", self.rows, self.cols, self.pins)
    }
}

impl <'a> MatrixKeypad<'a> {
    /// Builds a keypad on `pins`, validating `config` against the matrix dimensions.
    ///
    /// The matrix is swept once: keys already closed start out [KeyState::Pressed] and never
    /// report a press. All rows are driven inactive before this returns.
    pub fn new(pins: impl MatrixPins + 'a, config: &KeypadConfig) -> KeypadResult<Self> {
        let mut pins: Box<dyn MatrixPins + 'a> = Box::new(pins);
        let (rows, cols) = (pins.rows(), pins.cols());
        let (keymap, timing) = config.validate(rows, cols)?;

        for row in 0..rows {
            pins.set_row(row, false)?;
        }
        let cells = Self::sweep_held(pins.as_mut(), rows, cols)?;
        let held = cells.iter().filter(|cell| cell.state().is_down()).count();
        if held > 0 {
            debug!("{} keys held at startup", held);
        }

        info!(
            "Keypad {}x{} ready, shift {} on {:?}, timing {:?}",
            rows, cols, config.shift_policy, config.shift_key, timing,
        );

        Ok(MatrixKeypad {
            pins,
            rows,
            cols,
            cells,
            timing,
            keymap,
            queue: ActionQueue::new(config.queue_capacity),
            report_releases: config.report_releases,
            shift: ShiftResolver::new(config.shift_policy, config.shift_key),
            shift_indicator: None,
            ticks: Box::new(MonotonicTicks::new()),
        })
    }

    /// Drives `pin` high whenever the shift latch is active. The pin is updated right away.
    pub fn with_shift_indicator(mut self, pin: &'a dyn GpioOutput) -> KeypadResult<Self> {
        pin.write(self.shift.latch().is_shifted())?;
        self.shift_indicator = Some(pin);
        Ok(self)
    }

    /// Replaces the tick source used by [scan](Keypad::scan).
    pub fn with_tick_source(mut self, ticks: impl TickSource + 'a) -> Self {
        self.ticks = Box::new(ticks);
        self
    }

    /// Gets the matrix dimensions as `(rows, cols)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Gets the flattened index of the key at (`row`, `col`).
    pub fn key_index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn key_state(&self, index: usize) -> Option<KeyState> {
        self.cells.get(index).map(KeyCell::state)
    }

    /// Whether the key at `index` is currently held down, as far as the last scan knows.
    pub fn is_pressed(&self, index: usize) -> bool {
        self.key_state(index).is_some_and(|state| state.is_down())
    }

    pub fn shift_policy(&self) -> ShiftPolicy {
        self.shift.policy()
    }

    pub fn shift_latch(&self) -> ShiftLatch {
        self.shift.latch()
    }

    /// Number of queued actions.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Discards all queued actions. Key states are kept.
    pub fn clear_actions(&mut self) {
        self.queue.clear();
    }

    fn sweep_held(pins: &mut dyn MatrixPins, rows: usize, cols: usize) -> GpioResult<Box<[KeyCell]>> {
        let mut cells = vec![KeyCell::new(); rows * cols].into_boxed_slice();
        for row in 0..rows {
            pins.set_row(row, true)?;
            let result = Self::sweep_row(pins, &mut cells[row * cols..(row + 1) * cols]);
            pins.set_row(row, false)?;
            result?;
        }
        Ok(cells)
    }

    fn sweep_row(pins: &mut dyn MatrixPins, cells: &mut [KeyCell]) -> GpioResult<()> {
        for (col, cell) in cells.iter_mut().enumerate() {
            if pins.read_column(col)? {
                *cell = KeyCell::held();
            }
        }
        Ok(())
    }

    fn scan_row(&mut self, row: usize, now: u32) -> GpioResult<()> {
        for col in 0..self.cols {
            let pressed = self.pins.read_column(col)?;
            let index = row * self.cols + col;
            let cell = &mut self.cells[index];
            let before = cell.state();
            let Some(kind) = cell.update(pressed, now, &self.timing) else {
                if cell.state() != before {
                    trace!("Key {} {:?} -> {:?} at {}", index, before, cell.state(), now);
                }
                continue;
            };
            trace!("Key {} {:?} -> {:?} at {}: {:?}", index, before, cell.state(), now, kind);

            if kind == ActionKind::Release && !self.report_releases {
                continue;
            }
            let action = KeyAction {
                index,
                shifted: self.shift.latch().is_shifted(),
                kind,
            };
            if self.queue.put(action) {
                warn!("Action queue full, dropped the oldest action for {:?}", action);
            }
        }
        Ok(())
    }

    fn update_shift_indicator(&self, before: ShiftLatch) -> GpioResult<()> {
        let after = self.shift.latch();
        if after == before {
            return Ok(());
        }
        debug!("Shift {:?} -> {:?}", before, after);
        if let Some(pin) = self.shift_indicator {
            pin.write(after.is_shifted())?;
        }
        Ok(())
    }
}

impl Keypad for MatrixKeypad<'_> {
    fn scan(&mut self) -> GpioResult<()> {
        let now = self.ticks.now_ms();
        self.scan_at(now)
    }

    fn scan_at(&mut self, now: u32) -> GpioResult<()> {
        for row in 0..self.rows {
            self.pins.set_row(row, true)?;
            let result = self.scan_row(row, now);
            self.pins.set_row(row, false)?;
            result?;
        }
        Ok(())
    }

    fn next_action(&mut self) -> Option<KeyAction> {
        self.queue.get()
    }

    fn next_key(&mut self) -> GpioResult<Option<char>> {
        while let Some(action) = self.queue.get() {
            let before = self.shift.latch();
            let key = self.shift.resolve(&action, &self.keymap);
            self.update_shift_indicator(before)?;
            if key.is_some() {
                return Ok(key);
            }
        }
        Ok(None)
    }
}
