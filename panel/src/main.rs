mod config;
mod entry;

use crate::config::Config;
use crate::entry::{CodeEntry, Entry};
use dotenv::dotenv;
use hearth_gpio::LineDriver;
use hearth_gpio::buzzer::Buzzer;
use hearth_gpio::gpiod::GpiodLines;
use hearth_gpio::keypad::{
    KeyScanner, KeypadConfig, MatrixKeypad, SimConfig, SimMatrixKeypad, labels_from_rows,
};
use hearth_gpio::led::Led;
use hearth_gpio::mock::MockLines;
use log::{debug, info};
use std::env::var;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use sysinfo::System;

// Classic 4x3 phone pad.
const KEYPAD_LABELS: [&str; 4] = ["123", "456", "789", "*0#"];

const UNLOCK_TIME: Duration = Duration::from_secs(5);
const CHIRP_TIME: Duration = Duration::from_millis(200);

// Line assignments on the in-memory board when simulating.
const SIM_ROWS: [usize; 4] = [0, 1, 2, 3];
const SIM_COLS: [usize; 3] = [4, 5, 6];
const SIM_LED_PIN: usize = 30;
const SIM_BUZZER_PIN: usize = 31;

fn parse_pin_bus(pin_str: &str) -> eyre::Result<Vec<usize>> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().map_err(Into::into))
        .collect()
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!(
        "Panel starting on {} ({})...",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR),
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
    );

    let simulate = var("HEARTH_SIM").is_ok();
    let labels = labels_from_rows(&KEYPAD_LABELS);

    let (driver, mut keypad, led_pin, buzzer_pin): (Box<dyn LineDriver>, Box<dyn KeyScanner>, usize, usize) = if simulate {
        info!("`HEARTH_SIM` is set, all devices will be simulated.");
        let keypad = SimMatrixKeypad::new(&SIM_ROWS, &SIM_COLS, Some(labels), SimConfig::default())?;
        (
            Box::new(MockLines::new(32)),
            Box::new(keypad),
            SIM_LED_PIN,
            SIM_BUZZER_PIN,
        )
    } else {
        let chip = var("HEARTH_GPIO_CHIP").unwrap_or_else(|_| "/dev/gpiochip0".to_string());
        let rows = parse_pin_bus(&var("HEARTH_KEYPAD_PINS_ROWS")?)?;
        let cols = parse_pin_bus(&var("HEARTH_KEYPAD_PINS_COLS")?)?;
        info!("Keypad @ rows: {rows:?}, cols: {cols:?}");

        debug!("Initializing GPIO driver...");
        let gpio = GpiodLines::open(&chip)?;
        debug!("{gpio:?} initialized.");

        let keypad = MatrixKeypad::new(&gpio, &rows, &cols, Some(labels), KeypadConfig::default())?;
        (
            Box::new(gpio),
            Box::new(keypad),
            var("HEARTH_LED_PIN")?.parse()?,
            var("HEARTH_BUZZER_PIN")?.parse()?,
        )
    };

    let mut led = Led::new(&*driver, led_pin)?;
    let mut buzzer = Buzzer::new(&*driver, buzzer_pin)?;

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

    let (keys_tx, keys_rx) = mpsc::channel::<String>();
    keypad.set_when_key(Some(Box::new(move |key| {
        let _ = keys_tx.send(key.to_string());
    })));

    let mut entry = CodeEntry::new(config.code.chars().collect());
    let mut relock_at: Option<Instant> = None;
    let mut hush_at: Option<Instant> = None;

    info!("Panel ready.");

    loop {
        match keys_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(key) => {
                debug!("key: {key:?}");
                match entry.push(&key) {
                    Entry::Accepted => {
                        info!("Code accepted, unlocking.");
                        led.on()?;
                        buzzer.on()?;
                        relock_at = Some(Instant::now() + UNLOCK_TIME);
                        hush_at = Some(Instant::now() + CHIRP_TIME);
                    }
                    Entry::Rejected => {
                        info!("Code rejected.");
                        buzzer.on()?;
                        hush_at = Some(Instant::now() + CHIRP_TIME);
                    }
                    Entry::Pending => {}
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        if hush_at.is_some_and(|at| Instant::now() >= at) {
            buzzer.off()?;
            hush_at = None;
        }
        if relock_at.is_some_and(|at| Instant::now() >= at) {
            info!("Relocking.");
            led.off()?;
            relock_at = None;
        }
    }

    keypad.close();
    Ok(())
}
