use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use dotenv::var;
use serde::{Serialize, Deserialize};
use keyscan_gpio::keypad::{KeypadConfig, KeypadConfigError, ShiftPolicy};

/// A scripted key press replayed into the simulated matrix.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
pub struct ScriptedPress {
    /// The key, by its unshifted character.
    pub key: char,
    pub at_ms: u32,
    pub hold_ms: u32,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    pub keymap: String,
    pub shifted_keymap: Option<String>,
    pub shift_key: Option<char>,
    pub shift_policy: String,
    pub debounce_ms: u64,
    pub repeat_delay_ms: u64,
    pub repeat_ms: u64,
    pub queue_capacity: usize,
    pub scan_period_ms: u64,
    /// Stops the loop after this long. Runs forever if unset.
    pub run_for_ms: Option<u32>,
    pub script: Vec<ScriptedPress>,
}

impl Config {
    pub fn try_load() -> Option<Self> {
        let config_str = var_os("KEYSCAN_CONFIG");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("keyscan.json"));
        let config_path = Path::new(config_str);
        if config_path.exists() {
            let file = std::fs::File::open(config_path).ok()?;
            let reader = std::io::BufReader::new(file);
            serde_json::from_reader(reader).ok()
        } else {
            None
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let config_str = var("KEYSCAN_CONFIG").unwrap_or_else(|_| "keyscan.json".to_string());
        let config_path = Path::new(&config_str);
        let file = std::fs::File::create(config_path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Builds the keypad configuration. Matrix dimensions are checked later, against the pins.
    pub fn keypad_config(&self) -> Result<KeypadConfig, KeypadConfigError> {
        let policy: ShiftPolicy = self.shift_policy.parse()?;
        let mut config = KeypadConfig::new(self.keymap.as_str())
            .with_debounce_time(Duration::from_millis(self.debounce_ms))
            .with_repeat(
                Duration::from_millis(self.repeat_delay_ms),
                Duration::from_millis(self.repeat_ms),
            )
            .with_queue_capacity(self.queue_capacity);
        if let Some(shifted) = &self.shifted_keymap {
            config = config.with_shifted_keymap(shifted.as_str());
        }
        config.shift_key = self.shift_key;
        config.shift_policy = policy;
        Ok(config)
    }

    pub fn scan_period(&self) -> Duration {
        Duration::from_millis(self.scan_period_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            keymap: "123A456B789C*0#D".to_string(),
            shifted_keymap: Some("!@#a$%^b&*(c.)=d".to_string()),
            shift_key: Some('A'),
            shift_policy: ShiftPolicy::OneShot.to_string(),
            debounce_ms: 20,
            repeat_delay_ms: 300,
            repeat_ms: 20,
            queue_capacity: 9,
            scan_period_ms: 5,
            run_for_ms: Some(2000),
            script: vec![
                ScriptedPress { key: 'A', at_ms: 0, hold_ms: 30 },
                ScriptedPress { key: '1', at_ms: 50, hold_ms: 30 },
                ScriptedPress { key: '1', at_ms: 400, hold_ms: 30 },
                ScriptedPress { key: '5', at_ms: 800, hold_ms: 450 },
            ],
        }
    }
}
