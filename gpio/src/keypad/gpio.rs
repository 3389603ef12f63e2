use crate::keypad::{KeyCallback, KeyScanner, KeypadConfig, KeypadLayout};
use crate::worker::{StopFlag, Worker};
use crate::{ActiveLevel, Bias, GpioResult, InputLine, LineDriver, OutputLine, lock};
use log::{error, warn};
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Matrix keypad scanner driving real lines.
///
/// One row is activated at a time while every column is sampled, so N+M
/// lines read an N×M key grid and a single column read pins down the
/// row/column intersection. Detected keys are reported immediately, one
/// callback per active column; two keys sharing a row can therefore ghost
/// when pressed together, which is an accepted limit of this scan.
///
/// Construction claims the lines and starts the scan task. A key detected
/// while no callback is set is dropped silently. [`close`](KeyScanner::close)
/// stops the task and releases the lines; dropping the keypad closes it too.
pub struct MatrixKeypad {
    layout: Arc<KeypadLayout>,
    lines: Option<Arc<ScanLines>>,
    when_key: Arc<Mutex<Option<KeyCallback>>>,
    worker: Option<Worker>,
    config: KeypadConfig,
}

struct ScanLines {
    rows: Vec<Box<dyn OutputLine>>,
    cols: Vec<Box<dyn InputLine>>,
}

impl MatrixKeypad {
    pub fn new(
        driver: &dyn LineDriver,
        rows: &[usize],
        cols: &[usize],
        labels: Option<Vec<Vec<String>>>,
        config: KeypadConfig,
    ) -> GpioResult<Self> {
        // Validated before any line is claimed.
        let layout = Arc::new(KeypadLayout::new(rows, cols, labels)?);

        let (row_level, col_bias, col_level) = if config.pull_up {
            (ActiveLevel::High, Bias::PullUp, ActiveLevel::Low)
        } else {
            (ActiveLevel::Low, Bias::PullDown, ActiveLevel::High)
        };

        let mut row_lines = Vec::with_capacity(rows.len());
        for &offset in rows {
            let line = driver.output_line(offset, row_level)?;
            line.deactivate()?;
            row_lines.push(line);
        }
        let mut col_lines = Vec::with_capacity(cols.len());
        for &offset in cols {
            col_lines.push(driver.input_line(offset, col_bias, col_level)?);
        }

        let lines = Arc::new(ScanLines {
            rows: row_lines,
            cols: col_lines,
        });
        let when_key: Arc<Mutex<Option<KeyCallback>>> = Arc::new(Mutex::new(None));

        let worker = {
            let lines = lines.clone();
            let layout = layout.clone();
            let when_key = when_key.clone();
            Worker::spawn("keypad-scan", move |stop| {
                scan_matrix(stop, &lines, &layout, &when_key, config)
            })?
        };

        Ok(Self {
            layout,
            lines: Some(lines),
            when_key,
            worker: Some(worker),
            config,
        })
    }
}

fn scan_matrix(
    stop: &StopFlag,
    lines: &ScanLines,
    layout: &KeypadLayout,
    when_key: &Mutex<Option<KeyCallback>>,
    config: KeypadConfig,
) {
    while !stop.wait(config.scan_interval) {
        for (i, row) in lines.rows.iter().enumerate() {
            if let Err(err) = row.activate() {
                error!("keypad scan: activating row {} failed: {err}", row.offset());
                return;
            }

            if !config.row_interval.is_zero() && stop.wait(config.row_interval) {
                break;
            }

            for (j, col) in lines.cols.iter().enumerate() {
                match col.is_active() {
                    Ok(true) => {
                        // A key with no callback attached is dropped silently.
                        if let Some(callback) = &mut *lock(when_key) {
                            callback(layout.label(i, j));
                        }
                    }
                    Ok(false) => {}
                    Err(err) => {
                        error!("keypad scan: reading column {} failed: {err}", col.offset());
                        return;
                    }
                }
            }

            // Once a stop request is in, the hardware is left alone; the row
            // is picked up by the deactivation pass in `close`.
            if !stop.is_raised() {
                if let Err(err) = row.deactivate() {
                    error!("keypad scan: deactivating row {} failed: {err}", row.offset());
                    return;
                }
            }
        }
    }
}

impl KeyScanner for MatrixKeypad {
    fn layout(&self) -> &KeypadLayout {
        &self.layout
    }

    fn set_when_key(&self, callback: Option<KeyCallback>) {
        *lock(&self.when_key) = callback;
    }

    fn close(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            let grace = self.config.scan_interval + self.config.row_interval + Duration::from_millis(100);
            worker.shutdown(grace);
        }
        if let Some(lines) = self.lines.take() {
            // A stop racing the row hold can leave a row activated.
            for row in &lines.rows {
                if let Err(err) = row.deactivate() {
                    warn!("releasing keypad: row {} stays driven: {err}", row.offset());
                }
            }
        }
    }
}

impl Drop for MatrixKeypad {
    fn drop(&mut self) {
        self.close();
    }
}

impl Debug for MatrixKeypad {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MatrixKeypad({}x{})",
            self.layout.row_count(),
            self.layout.col_count()
        )
    }
}
