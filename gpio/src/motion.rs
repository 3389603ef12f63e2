//! PIR motion sensor.

use crate::{ActiveLevel, Bias, GpioError, GpioResult, InputLine, LineDriver};
use std::fmt::{Debug, Formatter};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Motion sensor on a single active-high input, read on demand.
pub struct MotionSensor {
    line: Box<dyn InputLine>,
}

impl MotionSensor {
    pub fn new(driver: &dyn LineDriver, pin: usize) -> GpioResult<Self> {
        let line = driver.input_line(pin, Bias::PullDown, ActiveLevel::High)?;
        Ok(Self { line })
    }

    pub fn motion_detected(&self) -> GpioResult<bool> {
        self.line.is_active()
    }

    /// Polls until motion is reported, giving up with `Timeout` after
    /// `timeout`.
    pub fn wait_for_motion(&self, timeout: Duration) -> GpioResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.line.is_active()? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(GpioError::Timeout);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Debug for MotionSensor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MotionSensor@{}", self.line.offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLines;

    #[test]
    fn reads_the_line() {
        let mock = MockLines::new(1);
        let sensor = MotionSensor::new(&mock, 0).unwrap();

        assert!(!sensor.motion_detected().unwrap());
        mock.drive(0, true);
        assert!(sensor.motion_detected().unwrap());
    }

    #[test]
    fn wait_times_out_without_motion() {
        let mock = MockLines::new(1);
        let sensor = MotionSensor::new(&mock, 0).unwrap();

        assert_eq!(
            sensor.wait_for_motion(Duration::from_millis(30)).err(),
            Some(GpioError::Timeout)
        );
    }
}
