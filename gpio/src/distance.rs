//! Ultrasonic distance sensor (HC-SR04 wiring: trigger out, echo in).

use crate::{ActiveLevel, Bias, GpioError, GpioResult, InputLine, LineDriver, OutputLine};
use std::fmt::{Debug, Formatter};
use std::time::{Duration, Instant};

const SPEED_OF_SOUND: f32 = 343.0; // m/s in air at ~20°C

const TRIGGER_PULSE: Duration = Duration::from_micros(10);
// Far beyond the sensor's range; a later echo edge means no reading.
const ECHO_TIMEOUT: Duration = Duration::from_millis(100);

pub struct DistanceSensor {
    trigger: Box<dyn OutputLine>,
    echo: Box<dyn InputLine>,
}

impl DistanceSensor {
    pub fn new(driver: &dyn LineDriver, trigger_pin: usize, echo_pin: usize) -> GpioResult<Self> {
        let trigger = driver.output_line(trigger_pin, ActiveLevel::High)?;
        let echo = driver.input_line(echo_pin, Bias::None, ActiveLevel::High)?;
        trigger.deactivate()?;
        Ok(Self { trigger, echo })
    }

    /// Fires one ping and returns the measured distance in meters.
    ///
    /// The echo pulse width is timed by busy-polling the echo line, so this
    /// blocks for the duration of the round trip (or `Timeout` when the
    /// sensor never answers).
    pub fn distance(&self) -> GpioResult<f32> {
        self.trigger.activate()?;
        spin_for(TRIGGER_PULSE);
        self.trigger.deactivate()?;

        self.wait_for_echo(true)?;
        let start = Instant::now();
        self.wait_for_echo(false)?;
        let width = start.elapsed();

        Ok(width.as_secs_f32() * SPEED_OF_SOUND / 2.0)
    }

    fn wait_for_echo(&self, active: bool) -> GpioResult<()> {
        let deadline = Instant::now() + ECHO_TIMEOUT;
        while self.echo.is_active()? != active {
            if Instant::now() >= deadline {
                return Err(GpioError::Timeout);
            }
            std::hint::spin_loop();
        }
        Ok(())
    }
}

fn spin_for(duration: Duration) {
    let end = Instant::now() + duration;
    while Instant::now() < end {
        std::hint::spin_loop();
    }
}

impl Debug for DistanceSensor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DistanceSensor@(trigger: {}, echo: {})",
            self.trigger.offset(),
            self.echo.offset()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLines;

    #[test]
    fn missing_echo_times_out() {
        let mock = MockLines::new(2);
        let sensor = DistanceSensor::new(&mock, 0, 1).unwrap();
        assert_eq!(sensor.distance().err(), Some(GpioError::Timeout));
    }

    #[test]
    fn held_echo_yields_a_width() {
        let mock = MockLines::new(2);
        let sensor = DistanceSensor::new(&mock, 0, 1).unwrap();

        // Echo already high: the pulse "starts" immediately and "ends" once
        // the line is released from another thread.
        mock.drive(1, true);
        let mock2 = mock.clone();
        let release = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            mock2.drive(1, false);
        });

        let distance = sensor.distance().unwrap();
        release.join().unwrap();

        // 20 ms of pulse ≈ 3.43 m; allow generous scheduling slack.
        assert!(distance > 2.0 && distance < 20.0);
    }
}
