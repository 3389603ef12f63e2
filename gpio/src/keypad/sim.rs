use crate::keypad::{KeyCallback, KeyScanner, KeypadLayout};
use crate::mock::MockLines;
use crate::worker::{StopFlag, Worker};
use crate::{ActiveLevel, Bias, GpioResult, InputLine, LineDriver, OutputLine, lock};
use log::{debug, warn};
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Timing and scripting knobs for the simulated keypad.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Delay before the first event.
    pub initial_delay: Duration,
    /// Delay after each delivered key.
    pub key_delay: Duration,
    /// Delay inserted for each no-key marker.
    pub idle_delay: Duration,
    /// Explicit key sequence, `None` entries being no-key markers. When
    /// absent, keys are drawn by repeatedly shuffling the label set, with
    /// roughly one in five replaced by a no-key marker.
    pub script: Option<Vec<Option<String>>>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            key_delay: Duration::from_millis(700),
            idle_delay: Duration::from_secs(20),
            script: None,
        }
    }
}

/// Keypad that substitutes synthetic key events for physical scanning.
///
/// Lines are claimed from a private in-memory driver, so no hardware access
/// occurs; everything else — topology, labels, the callback contract,
/// `close` — matches [`MatrixKeypad`](crate::keypad::MatrixKeypad). One
/// deliberate difference: a key delivered while no callback is set is logged
/// at warning level instead of being dropped silently.
///
/// A scripted key source ends the task once exhausted; the shuffled source
/// runs until the keypad is closed.
pub struct SimMatrixKeypad {
    layout: Arc<KeypadLayout>,
    when_key: Arc<Mutex<Option<KeyCallback>>>,
    worker: Option<Worker>,
    lines: Option<(Vec<Box<dyn OutputLine>>, Vec<Box<dyn InputLine>>)>,
}

const CLOSE_GRACE: Duration = Duration::from_secs(1);

impl SimMatrixKeypad {
    pub fn new(
        rows: &[usize],
        cols: &[usize],
        labels: Option<Vec<Vec<String>>>,
        config: SimConfig,
    ) -> GpioResult<Self> {
        let layout = Arc::new(KeypadLayout::new(rows, cols, labels)?);

        let line_count = rows.iter().chain(cols).map(|&o| o + 1).max().unwrap_or(0);
        let mock = MockLines::new(line_count);
        let mut row_lines = Vec::with_capacity(rows.len());
        for &offset in rows {
            row_lines.push(mock.output_line(offset, ActiveLevel::High)?);
        }
        let mut col_lines = Vec::with_capacity(cols.len());
        for &offset in cols {
            col_lines.push(mock.input_line(offset, Bias::PullUp, ActiveLevel::Low)?);
        }

        let when_key: Arc<Mutex<Option<KeyCallback>>> = Arc::new(Mutex::new(None));

        let worker = {
            let layout = layout.clone();
            let when_key = when_key.clone();
            Worker::spawn("keypad-sim", move |stop| {
                simulate(stop, &layout, &when_key, config)
            })?
        };

        Ok(Self {
            layout,
            when_key,
            worker: Some(worker),
            lines: Some((row_lines, col_lines)),
        })
    }
}

fn simulate(
    stop: &StopFlag,
    layout: &KeypadLayout,
    when_key: &Mutex<Option<KeyCallback>>,
    config: SimConfig,
) {
    debug!("keypad simulation started");

    if stop.wait(config.initial_delay) {
        debug!("keypad simulation stopped");
        return;
    }

    match &config.script {
        Some(script) => {
            for item in script {
                if !emit(stop, &config, when_key, item.as_deref()) {
                    break;
                }
            }
        }
        None => {
            let mut labels = layout.all_labels();
            if labels.is_empty() {
                while !stop.wait(config.idle_delay) {}
            } else {
                let mut rng = rand::thread_rng();
                'typing: loop {
                    labels.shuffle(&mut rng);
                    for label in &labels {
                        let item = (!rng.gen_bool(0.2)).then_some(label.as_str());
                        if !emit(stop, &config, when_key, item) {
                            break 'typing;
                        }
                    }
                }
            }
        }
    }

    debug!("keypad simulation stopped");
}

/// Delivers one item from the key source. Returns false once a stop request
/// arrives during the follow-up wait.
fn emit(
    stop: &StopFlag,
    config: &SimConfig,
    when_key: &Mutex<Option<KeyCallback>>,
    item: Option<&str>,
) -> bool {
    let Some(key) = item else {
        return !stop.wait(config.idle_delay);
    };

    match &mut *lock(when_key) {
        Some(callback) => {
            debug!("key pressed: {key:?}");
            callback(key);
        }
        None => warn!("key pressed: {key:?} [no handler attached]"),
    }

    !stop.wait(config.key_delay)
}

impl KeyScanner for SimMatrixKeypad {
    fn layout(&self) -> &KeypadLayout {
        &self.layout
    }

    fn set_when_key(&self, callback: Option<KeyCallback>) {
        *lock(&self.when_key) = callback;
    }

    fn close(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown(CLOSE_GRACE);
        }
        self.lines.take();
    }
}

impl Drop for SimMatrixKeypad {
    fn drop(&mut self) {
        self.close();
    }
}

impl Debug for SimMatrixKeypad {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SimMatrixKeypad({}x{})",
            self.layout.row_count(),
            self.layout.col_count()
        )
    }
}
