mod app;
mod config;

use std::env::var;
use std::thread;
use dotenv::dotenv;
use log::{debug, info};
use sysinfo::System;
use keyscan_gpio::{GpioInput, GpioOutput};
use keyscan_gpio::keypad::{GpioMatrix, Keypad, MatrixKeypad};
use keyscan_gpio::sim::{SimKeyMatrix, SimOutputPin};
use keyscan_gpio::tick::{MonotonicTicks, TickSource, deadline_reached};
use crate::app::{App, Stimulus};
use crate::config::Config;

fn parse_pin_list(pin_str: &str) -> eyre::Result<Vec<usize>> {
    let pins = pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect::<Result<Vec<_>, _>>()?;
    if pins.is_empty() {
        return Err(eyre::eyre!("Empty pin list"));
    }
    Ok(pins)
}

/// Reads a pin list from `name`, falling back to `0..default_len`.
fn pin_list_from_env(name: &str, default_len: usize) -> eyre::Result<Vec<usize>> {
    match var(name) {
        Ok(pins) => parse_pin_list(&pins),
        Err(_) => Ok((0..default_len).collect()),
    }
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!(
        "keyscan v{} on {} ({})",
        env!("CARGO_PKG_VERSION"),
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR),
        System::cpu_arch(),
    );

    debug!("Trying to load config...");
    let config = if let Some(config) = Config::try_load() {
        info!("Config loaded.");
        config
    } else {
        info!("Config not found. Using default");
        let config = Config::default();
        config.save()?;
        info!("Default config saved.");
        config
    };
    let keypad_config = config.keypad_config()?;

    // Get pin numbers from env
    let row_pins = pin_list_from_env("KEYSCAN_PINS_ROWS", 4)?;
    let col_pins = pin_list_from_env("KEYSCAN_PINS_COLS", 4)?;
    let shift_led_pin = var("KEYSCAN_PIN_SHIFT_LED").ok();

    info!("Keypad @ Rows: {:?}, Cols: {:?}, Shift LED: {:?}", row_pins, col_pins, shift_led_pin);

    debug!("Initializing simulated matrix...");
    let line_count = |pins: &[usize]| pins.iter().max().map_or(0, |&max| max + 1);
    let matrix = SimKeyMatrix::new(line_count(&row_pins), line_count(&col_pins));
    let row_outputs = row_pins
        .iter()
        .map(|&pin| matrix.row_output(pin))
        .collect::<Result<Vec<_>, _>>()?;
    let col_inputs = col_pins
        .iter()
        .map(|&pin| matrix.column_input(pin))
        .collect::<Result<Vec<_>, _>>()?;
    debug!("{:?} initialized.", matrix);

    debug!("Initializing keypad...");
    let shift_led = SimOutputPin::new();
    let pins = GpioMatrix::new(
        row_outputs.iter().map(|pin| pin as &dyn GpioOutput).collect(),
        col_inputs.iter().map(|pin| pin as &dyn GpioInput).collect(),
    );
    let mut keypad = MatrixKeypad::new(pins, &keypad_config)?;
    if shift_led_pin.is_some() {
        keypad = keypad.with_shift_indicator(&shift_led)?;
    }
    debug!("{:?} initialized.", keypad);

    let cols = col_pins.len();
    let stimuli = Stimulus::from_script(&config.script, |key| {
        keypad
            .keymap()
            .position_of(key)
            .map(|index| (row_pins[index / cols], col_pins[index % cols]))
    });

    info!("Starting main loop...");

    let mut app = App::new(
        &matrix,
        vec![&mut keypad as &mut dyn Keypad],
        shift_led_pin.is_some().then_some(&shift_led),
        stimuli,
    );

    let ticks = MonotonicTicks::new();
    let scan_period = config.scan_period();
    loop {
        let now = ticks.now_ms();
        app.update(now)?;

        if let Some(run_for) = config.run_for_ms
            && deadline_reached(now, run_for)
            && app.script_done()
        {
            break;
        }

        thread::sleep(scan_period);
    }

    info!("Typed {:?}", app.typed());

    Ok(())
}
