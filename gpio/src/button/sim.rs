use crate::button::{Button, ButtonCallback};
use crate::mock::MockLines;
use crate::worker::{StopFlag, Worker};
use crate::GpioResult;
use log::debug;
use rand::Rng;
use std::fmt::{Debug, Formatter};
use std::time::Duration;

const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Button with nobody at it: a background task presses it at random.
///
/// The line comes from a private in-memory driver, so this works anywhere.
/// By default a press lands after 2–10 s and is held for 0.5–2 s, drawn
/// uniformly; [`with_ranges`](SimButton::with_ranges) tightens that for
/// tests. Event delivery goes through the same [`Button`] contract as the
/// real device.
pub struct SimButton {
    inner: Button,
    worker: Option<Worker>,
}

impl SimButton {
    pub fn new() -> GpioResult<Self> {
        Self::with_ranges(
            Duration::from_secs(2)..Duration::from_secs(10),
            Duration::from_millis(500)..Duration::from_secs(2),
        )
    }

    pub fn with_ranges(
        press_after: std::ops::Range<Duration>,
        hold_for: std::ops::Range<Duration>,
    ) -> GpioResult<Self> {
        let mock = MockLines::new(1);
        let inner = Button::with_options(&mock, 0, true, Duration::from_millis(1))?;

        let worker = Worker::spawn("button-sim", move |stop| {
            simulate(stop, &mock, press_after, hold_for)
        })?;

        Ok(Self {
            inner,
            worker: Some(worker),
        })
    }

    pub fn set_when_pressed(&self, callback: Option<ButtonCallback>) {
        self.inner.set_when_pressed(callback);
    }

    pub fn set_when_released(&self, callback: Option<ButtonCallback>) {
        self.inner.set_when_released(callback);
    }

    pub fn is_pressed(&self) -> bool {
        self.inner.is_pressed()
    }

    /// Stops the simulator and the underlying button. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown(CLOSE_GRACE);
        }
        self.inner.close();
    }
}

fn simulate(
    stop: &StopFlag,
    mock: &MockLines,
    press_after: std::ops::Range<Duration>,
    hold_for: std::ops::Range<Duration>,
) {
    debug!("button simulation started");

    let mut rng = rand::thread_rng();
    loop {
        let delay = random_in(&mut rng, &press_after);
        if stop.wait(delay) {
            break;
        }
        mock.drive(0, true);

        let hold = random_in(&mut rng, &hold_for);
        if stop.wait(hold) {
            break;
        }
        mock.drive(0, false);
    }

    debug!("button simulation stopped");
}

fn random_in(rng: &mut impl Rng, range: &std::ops::Range<Duration>) -> Duration {
    Duration::from_secs_f64(rng.gen_range(range.start.as_secs_f64()..range.end.as_secs_f64()))
}

impl Drop for SimButton {
    fn drop(&mut self) {
        self.close();
    }
}

impl Debug for SimButton {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimButton({:?})", self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn presses_on_its_own() {
        let mut button = SimButton::with_ranges(
            Duration::from_millis(1)..Duration::from_millis(5),
            Duration::from_millis(30)..Duration::from_millis(60),
        )
        .unwrap();

        let (tx, rx) = mpsc::channel();
        button.set_when_pressed(Some(Box::new(move || tx.send(()).unwrap())));

        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        button.close();
    }

    #[test]
    fn close_is_idempotent() {
        let mut button = SimButton::new().unwrap();
        button.close();
        button.close();
    }
}
