use std::time::Duration;
use keyscan_gpio::keypad::{
    ActionKind, GpioMatrix, KeyAction, KeyState, Keypad, KeypadConfig, MatrixKeypad, ShiftLatch,
    ShiftPolicy,
};
use keyscan_gpio::sim::{SimColumnInput, SimKeyMatrix, SimRowOutput};
use keyscan_gpio::{GpioInput, GpioOutput, ThresholdInput};

// Init logger for tests
#[ctor::ctor]
fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

const MAP: &str = "123A456B789C*0#D";
const SHIFTED: &str = "!@#a$%^b&*(c.)=d";
const SCAN_PERIOD: u32 = 5;

/// One scripted switch change: at tick `at`, key `index` becomes `pressed`.
#[derive(Copy, Clone, Debug)]
struct Step {
    at: u32,
    index: usize,
    pressed: bool,
}

fn step(at: u32, index: usize, pressed: bool) -> Step {
    Step { at, index, pressed }
}

struct Lines<'a> {
    rows: Vec<SimRowOutput<'a>>,
    cols: Vec<SimColumnInput<'a>>,
}

impl<'a> Lines<'a> {
    fn claim(sim: &'a SimKeyMatrix) -> Self {
        Lines {
            rows: (0..sim.rows()).map(|r| sim.row_output(r).unwrap()).collect(),
            cols: (0..sim.cols()).map(|c| sim.column_input(c).unwrap()).collect(),
        }
    }

    fn matrix(&self) -> GpioMatrix<'_> {
        GpioMatrix::new(
            self.rows.iter().map(|r| r as &dyn GpioOutput).collect(),
            self.cols.iter().map(|c| c as &dyn GpioInput).collect(),
        )
    }
}

fn scenario_config() -> KeypadConfig {
    KeypadConfig::new(MAP)
        .with_shifted_keymap(SHIFTED)
        .with_debounce_time(Duration::from_millis(20))
        .with_repeat(Duration::from_millis(300), Duration::from_millis(20))
}

/// Scans every [SCAN_PERIOD] ms from 0 to `until`, applying `script` and draining raw actions.
fn run_actions(
    sim: &SimKeyMatrix,
    keypad: &mut MatrixKeypad<'_>,
    script: &[Step],
    until: u32,
) -> Vec<(u32, KeyAction)> {
    let mut actions = Vec::new();
    for now in (0..=until).step_by(SCAN_PERIOD as usize) {
        for s in script.iter().filter(|s| s.at == now) {
            sim.set_index(s.index, s.pressed);
        }
        keypad.scan_at(now).unwrap();
        while let Some(action) = keypad.next_action() {
            actions.push((now, action));
        }
    }
    actions
}

/// Same as [run_actions], but resolves characters instead.
fn run_keys(
    sim: &SimKeyMatrix,
    keypad: &mut MatrixKeypad<'_>,
    script: &[Step],
    until: u32,
) -> Vec<(u32, char)> {
    let mut keys = Vec::new();
    for now in (0..=until).step_by(SCAN_PERIOD as usize) {
        for s in script.iter().filter(|s| s.at == now) {
            sim.set_index(s.index, s.pressed);
        }
        keypad.scan_at(now).unwrap();
        while let Some(key) = keypad.next_key().unwrap() {
            keys.push((now, key));
        }
    }
    keys
}

#[test]
fn one_shot_scenario() {
    let sim = SimKeyMatrix::new(4, 4);
    let lines = Lines::claim(&sim);
    let config = scenario_config().with_shift('A', ShiftPolicy::OneShot);
    let mut keypad = MatrixKeypad::new(lines.matrix(), &config).unwrap();

    let script = [
        step(0, 3, true),
        step(30, 3, false),
        step(50, 0, true),
        step(80, 0, false),
        step(400, 0, true),
        step(430, 0, false),
    ];
    let keys = run_keys(&sim, &mut keypad, &script, 800);

    assert_eq!(keys, vec![(50, '!'), (400, '1')]);
    assert_eq!(keypad.shift_latch(), ShiftLatch::Unshifted);
    assert_eq!(keypad.key_state(0), Some(KeyState::Released));
}

#[test]
fn one_shot_double_shift_cancels() {
    let sim = SimKeyMatrix::new(4, 4);
    let lines = Lines::claim(&sim);
    let config = scenario_config().with_shift('A', ShiftPolicy::OneShot);
    let mut keypad = MatrixKeypad::new(lines.matrix(), &config).unwrap();

    let script = [
        step(0, 3, true),
        step(30, 3, false),
        step(400, 3, true),
        step(430, 3, false),
        step(800, 5, true),
        step(830, 5, false),
    ];
    let keys = run_keys(&sim, &mut keypad, &script, 1200);
    assert_eq!(keys, vec![(800, '5')]);
    assert_eq!(keypad.shift_latch(), ShiftLatch::Unshifted);
}

#[test]
fn lock_scenario() {
    let sim = SimKeyMatrix::new(4, 4);
    let lines = Lines::claim(&sim);
    let config = scenario_config().with_shift('A', ShiftPolicy::Lock);
    let mut keypad = MatrixKeypad::new(lines.matrix(), &config).unwrap();

    let script = [
        step(0, 3, true),
        step(30, 3, false),
        step(400, 1, true),
        step(430, 1, false),
        step(800, 3, true),
        step(830, 3, false),
        step(1200, 1, true),
        step(1230, 1, false),
        step(1600, 2, true),
        step(1630, 2, false),
    ];
    let keys = run_keys(&sim, &mut keypad, &script, 2000);
    assert_eq!(keys, vec![(400, '@'), (1200, '2'), (1600, '3')]);
}

#[test]
fn lock_toggles_on_shift_repeat() {
    let sim = SimKeyMatrix::new(4, 4);
    let lines = Lines::claim(&sim);
    let config = scenario_config().with_shift('A', ShiftPolicy::Lock);
    let mut keypad = MatrixKeypad::new(lines.matrix(), &config).unwrap();

    // Press at 0 locks, the repeat at 320 unlocks again.
    let script = [step(0, 3, true), step(330, 3, false), step(800, 1, true), step(830, 1, false)];
    let keys = run_keys(&sim, &mut keypad, &script, 1200);
    assert_eq!(keys, vec![(800, '2')]);
    assert_eq!(keypad.shift_latch(), ShiftLatch::Unshifted);
}

#[test]
fn hold_shifts_while_held() {
    let sim = SimKeyMatrix::new(4, 4);
    let lines = Lines::claim(&sim);
    let config = scenario_config().with_shift('A', ShiftPolicy::Hold);
    let mut keypad = MatrixKeypad::new(lines.matrix(), &config).unwrap();

    let script = [
        step(0, 3, true),
        step(100, 5, true),
        step(130, 5, false),
        step(150, 3, false),
        step(600, 5, true),
        step(630, 5, false),
    ];
    let keys = run_keys(&sim, &mut keypad, &script, 1000);
    assert_eq!(keys, vec![(100, '%'), (600, '5')]);
}

#[test]
fn press_hold_release_sequence() {
    let sim = SimKeyMatrix::new(4, 4);
    let lines = Lines::claim(&sim);
    let mut keypad = MatrixKeypad::new(lines.matrix(), &scenario_config()).unwrap();

    let script = [step(0, 9, true), step(400, 9, false)];
    let actions = run_actions(&sim, &mut keypad, &script, 600);

    let kinds: Vec<(u32, ActionKind)> = actions.iter().map(|(t, a)| (*t, a.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (0, ActionKind::Press),
            (320, ActionKind::Repeat),
            (340, ActionKind::Repeat),
            (360, ActionKind::Repeat),
            (380, ActionKind::Repeat),
            (400, ActionKind::Release),
        ],
    );
    assert!(actions.iter().all(|(_, a)| a.index == 9 && !a.shifted));
    assert_eq!(keypad.key_state(9), Some(KeyState::Released));
}

#[test]
fn short_press_reports_press_and_release() {
    let sim = SimKeyMatrix::new(4, 4);
    let lines = Lines::claim(&sim);
    let mut keypad = MatrixKeypad::new(lines.matrix(), &scenario_config()).unwrap();

    let script = [step(0, 6, true), step(100, 6, false)];
    let actions = run_actions(&sim, &mut keypad, &script, 200);
    let kinds: Vec<(u32, ActionKind)> = actions.iter().map(|(t, a)| (*t, a.kind)).collect();
    assert_eq!(kinds, vec![(0, ActionKind::Press), (100, ActionKind::Release)]);
    assert_eq!(keypad.key_state(6), Some(KeyState::ReleaseDebounce));

    // Settles once the accumulated deadline (20 + 300 + 20) passes.
    keypad.scan_at(339).unwrap();
    assert_eq!(keypad.key_state(6), Some(KeyState::ReleaseDebounce));
    keypad.scan_at(340).unwrap();
    assert_eq!(keypad.key_state(6), Some(KeyState::Released));
}

#[test]
fn simultaneous_keys_interleave_in_scan_order() {
    let sim = SimKeyMatrix::new(4, 4);
    let lines = Lines::claim(&sim);
    let mut keypad = MatrixKeypad::new(lines.matrix(), &scenario_config()).unwrap();

    // (2, 3) and (0, 1) share no row or column.
    let script = [
        step(0, 11, true),
        step(0, 1, true),
        step(350, 11, false),
        step(350, 1, false),
    ];
    let actions = run_actions(&sim, &mut keypad, &script, 500);
    let seq: Vec<(u32, usize, ActionKind)> = actions.iter().map(|(t, a)| (*t, a.index, a.kind)).collect();
    assert_eq!(
        seq,
        vec![
            (0, 1, ActionKind::Press),
            (0, 11, ActionKind::Press),
            (320, 1, ActionKind::Repeat),
            (320, 11, ActionKind::Repeat),
            (340, 1, ActionKind::Repeat),
            (340, 11, ActionKind::Repeat),
            (350, 1, ActionKind::Release),
            (350, 11, ActionKind::Release),
        ],
    );
}

#[test]
fn analog_columns_scan_like_digital_ones() {
    let sim = SimKeyMatrix::new(2, 2);
    let rows: Vec<_> = (0..2).map(|r| sim.row_output(r).unwrap()).collect();
    let digital = sim.column_input(0).unwrap();
    let adc = sim.analog_column(1).unwrap();
    let analog = ThresholdInput::new(&adc, 512);
    let cols: [&dyn GpioInput; 2] = [&digital, &analog];
    let pins = GpioMatrix::new(rows.iter().map(|r| r as &dyn GpioOutput).collect(), cols.to_vec());
    let mut keypad = MatrixKeypad::new(pins, &KeypadConfig::new("abcd")).unwrap();

    let script = [step(0, 3, true), step(50, 3, false), step(600, 2, true)];
    let keys = run_keys(&sim, &mut keypad, &script, 650);
    assert_eq!(keys, vec![(0, 'd'), (600, 'c')]);
}

#[test]
fn ghosting_is_reported_as_pressed() {
    let sim = SimKeyMatrix::new(2, 2).without_diodes();
    let lines = Lines::claim(&sim);
    let mut keypad = MatrixKeypad::new(lines.matrix(), &KeypadConfig::new("abcd")).unwrap();

    sim.press(0, 0);
    sim.press(1, 0);
    sim.press(1, 1);
    keypad.scan_at(0).unwrap();
    let pressed: Vec<usize> = std::iter::from_fn(|| keypad.next_action()).map(|a| a.index).collect();
    assert_eq!(pressed, vec![0, 1, 2, 3]);
}

#[test]
fn keypads_in_a_collection() {
    let left = SimKeyMatrix::new(1, 2);
    let right = SimKeyMatrix::new(1, 2);
    let left_lines = Lines::claim(&left);
    let right_lines = Lines::claim(&right);

    let mut keypads: Vec<Box<dyn Keypad + '_>> = vec![
        Box::new(MatrixKeypad::new(left_lines.matrix(), &KeypadConfig::new("ab")).unwrap()),
        Box::new(MatrixKeypad::new(right_lines.matrix(), &KeypadConfig::new("yz")).unwrap()),
    ];

    left.press(0, 1);
    right.press(0, 0);
    let mut keys = String::new();
    for keypad in keypads.iter_mut() {
        keypad.scan_at(0).unwrap();
        while let Some(key) = keypad.next_key().unwrap() {
            keys.push(key);
        }
    }
    assert_eq!(keys, "by");
}
