mod sim;

pub use sim::*;

use crate::debounce::Debounce;
use crate::worker::{StopFlag, Worker};
use crate::{ActiveLevel, Bias, GpioResult, LineDriver, lock};
use log::{debug, error};
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type ButtonCallback = Box<dyn FnMut() + Send>;

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Debounced push button.
///
/// A background task polls the line and fires the `when_pressed` /
/// `when_released` callbacks on edges, synchronously from that task.
/// Construction starts the task; [`close`](Button::close) (or dropping the
/// button) stops it.
pub struct Button {
    pin: usize,
    slots: Arc<Slots>,
    worker: Option<Worker>,
}

#[derive(Default)]
struct Slots {
    when_pressed: Mutex<Option<ButtonCallback>>,
    when_released: Mutex<Option<ButtonCallback>>,
    pressed: AtomicBool,
}

impl Button {
    pub fn new(driver: &dyn LineDriver, pin: usize) -> GpioResult<Self> {
        Self::with_options(driver, pin, true, Duration::from_millis(50))
    }

    /// `pull_up` selects the wiring polarity: pulled up and active-low, or
    /// pulled down and active-high.
    pub fn with_options(
        driver: &dyn LineDriver,
        pin: usize,
        pull_up: bool,
        bounce_time: Duration,
    ) -> GpioResult<Self> {
        let (bias, active_level) = if pull_up {
            (Bias::PullUp, ActiveLevel::Low)
        } else {
            (Bias::PullDown, ActiveLevel::High)
        };
        let line = driver.input_line(pin, bias, active_level)?;

        let slots = Arc::new(Slots::default());
        let worker = {
            let slots = slots.clone();
            let mut input = Debounce::new(line, bounce_time);
            Worker::spawn(&format!("button-{pin}"), move |stop| {
                poll(stop, pin, &mut input, &slots)
            })?
        };

        Ok(Self {
            pin,
            slots,
            worker: Some(worker),
        })
    }

    pub fn set_when_pressed(&self, callback: Option<ButtonCallback>) {
        *lock(&self.slots.when_pressed) = callback;
    }

    pub fn set_when_released(&self, callback: Option<ButtonCallback>) {
        *lock(&self.slots.when_released) = callback;
    }

    pub fn is_pressed(&self) -> bool {
        self.slots.pressed.load(Ordering::Relaxed)
    }

    /// Stops the poll task and releases the line. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown(CLOSE_GRACE);
        }
    }
}

fn poll(stop: &StopFlag, pin: usize, input: &mut Debounce, slots: &Slots) {
    while !stop.wait(POLL_INTERVAL) {
        let pressed = match input.read() {
            Ok(pressed) => pressed,
            Err(err) => {
                error!("button {pin}: read failed: {err}");
                return;
            }
        };

        let was_pressed = slots.pressed.swap(pressed, Ordering::Relaxed);
        if pressed == was_pressed {
            continue;
        }

        if pressed {
            debug!("Button@{pin} pressed");
            if let Some(callback) = &mut *lock(&slots.when_pressed) {
                callback();
            }
        } else {
            debug!("Button@{pin} released");
            if let Some(callback) = &mut *lock(&slots.when_released) {
                callback();
            }
        }
    }
}

impl Drop for Button {
    fn drop(&mut self) {
        self.close();
    }
}

impl Debug for Button {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Button@{}", self.pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLines;
    use std::sync::mpsc;

    const RX_TIMEOUT: Duration = Duration::from_secs(2);

    #[test]
    fn fires_on_press_and_release() {
        let mock = MockLines::new(1);
        let mut button =
            Button::with_options(&mock, 0, true, Duration::from_millis(1)).unwrap();

        let (tx, rx) = mpsc::channel();
        let pressed_tx = tx.clone();
        button.set_when_pressed(Some(Box::new(move || pressed_tx.send("press").unwrap())));
        button.set_when_released(Some(Box::new(move || tx.send("release").unwrap())));

        mock.drive(0, true);
        assert_eq!(rx.recv_timeout(RX_TIMEOUT).unwrap(), "press");
        assert!(button.is_pressed());

        mock.drive(0, false);
        assert_eq!(rx.recv_timeout(RX_TIMEOUT).unwrap(), "release");
        assert!(!button.is_pressed());

        button.close();
    }

    #[test]
    fn close_twice_is_fine() {
        let mock = MockLines::new(1);
        let mut button = Button::new(&mock, 0).unwrap();
        button.close();
        button.close();
    }

    #[test]
    fn line_is_released_after_close() {
        let mock = MockLines::new(1);
        let mut button = Button::new(&mock, 0).unwrap();
        assert_eq!(mock.lines_in_use(), 1);
        button.close();
        assert_eq!(mock.lines_in_use(), 0);
    }
}
