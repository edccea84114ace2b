//! The module for the main app state and logic.

use log::{debug, info, warn};
use keyscan_gpio::GpioResult;
use keyscan_gpio::keypad::Keypad;
use keyscan_gpio::sim::{SimKeyMatrix, SimOutputPin};
use crate::config::ScriptedPress;

/// A switch change to apply to the simulated matrix.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Stimulus {
    pub at_ms: u32,
    pub row: usize,
    pub col: usize,
    pub pressed: bool,
}

impl Stimulus {
    /// Turns scripted presses into press/release pairs on matrix lines, ordered by time.
    ///
    /// `locate` maps a key character to its `(row line, column line)`; unknown keys are skipped.
    pub fn from_script(
        script: &[ScriptedPress],
        locate: impl Fn(char) -> Option<(usize, usize)>,
    ) -> Vec<Stimulus> {
        let mut stimuli = Vec::with_capacity(script.len() * 2);
        for press in script {
            let Some((row, col)) = locate(press.key) else {
                warn!("Scripted key {:?} is not on the keypad, skipping", press.key);
                continue;
            };
            stimuli.push(Stimulus { at_ms: press.at_ms, row, col, pressed: true });
            stimuli.push(Stimulus {
                at_ms: press.at_ms.saturating_add(press.hold_ms),
                row,
                col,
                pressed: false,
            });
        }
        stimuli.sort_by_key(|s| s.at_ms);
        stimuli
    }
}

/// The main app state struct.
pub struct App<'a> {
    /// The simulated matrix the keypads are wired to.
    matrix: &'a SimKeyMatrix,
    /// The keypads, scanned in order every update.
    keypads: Vec<&'a mut dyn Keypad>,
    /// The shift indicator, if one is configured.
    shift_led: Option<&'a SimOutputPin>,
    stimuli: Vec<Stimulus>,
    next_stimulus: usize,
    prev_led_state: bool,
    /// Everything typed so far.
    typed: String,
}

impl <'a> App<'a> {
    /// Creates a new instance of the App.
    pub fn new(
        matrix: &'a SimKeyMatrix,
        keypads: Vec<&'a mut dyn Keypad>,
        shift_led: Option<&'a SimOutputPin>,
        stimuli: Vec<Stimulus>,
    ) -> App<'a> {
        App {
            matrix,
            keypads,
            shift_led,
            stimuli,
            next_stimulus: 0,
            prev_led_state: false,
            typed: String::new(),
        }
    }

    /// Runs one loop iteration at tick `now`: replays due stimuli, scans, then drains the keys.
    pub fn update(&mut self, now: u32) -> GpioResult<()> {
        while let Some(stimulus) = self.stimuli.get(self.next_stimulus) {
            if stimulus.at_ms > now {
                break;
            }
            debug!("{:?}", stimulus);
            self.matrix.set_key(stimulus.row, stimulus.col, stimulus.pressed);
            self.next_stimulus += 1;
        }

        for keypad in self.keypads.iter_mut() {
            keypad.scan_at(now)?;
            while let Some(key) = keypad.next_key()? {
                info!("Key {:?} at {} ms", key, now);
                self.typed.push(key);
            }
        }

        if let Some(led) = self.shift_led {
            let state = led.is_high();
            if state != self.prev_led_state {
                info!("Shift indicator {}", if state { "on" } else { "off" });
                self.prev_led_state = state;
            }
        }

        Ok(())
    }

    /// Whether every scripted stimulus has been applied.
    pub fn script_done(&self) -> bool {
        self.next_stimulus >= self.stimuli.len()
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }
}
