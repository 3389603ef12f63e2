//! Time-based input debouncing.

use crate::{GpioResult, InputLine};
use std::time::{Duration, Instant};

/// Filters contact bounce out of an input line.
///
/// A change in the raw reading is reflected only once it has stayed put for
/// the bounce time; shorter glitches are absorbed.
pub struct Debounce {
    input: Box<dyn InputLine>,
    state: bool,
    changed_since: Option<Instant>,
    bounce_time: Duration,
}

impl Debounce {
    pub fn new(input: Box<dyn InputLine>, bounce_time: Duration) -> Self {
        Self {
            input,
            state: false,
            changed_since: None,
            bounce_time,
        }
    }

    pub fn read(&mut self) -> GpioResult<bool> {
        let raw = self.input.is_active()?;

        if let Some(since) = self.changed_since {
            if since.elapsed() < self.bounce_time {
                if raw == self.state {
                    // The glitch settled back before the bounce time ran out.
                    self.changed_since = None;
                }
                return Ok(self.state);
            }
            self.changed_since = None;
            self.state = raw;
            return Ok(raw);
        }

        if raw != self.state {
            self.changed_since = Some(Instant::now());
        }
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLines;
    use crate::{ActiveLevel, Bias, LineDriver};
    use std::thread;

    fn debounced(mock: &MockLines, bounce: Duration) -> Debounce {
        let line = mock.input_line(0, Bias::PullUp, ActiveLevel::Low).unwrap();
        Debounce::new(line, bounce)
    }

    #[test]
    fn short_glitch_is_absorbed() {
        let mock = MockLines::new(1);
        let mut input = debounced(&mock, Duration::from_millis(50));

        mock.drive(0, true);
        assert!(!input.read().unwrap());

        mock.drive(0, false);
        assert!(!input.read().unwrap());

        thread::sleep(Duration::from_millis(60));
        assert!(!input.read().unwrap());
    }

    #[test]
    fn stable_change_goes_through() {
        let mock = MockLines::new(1);
        let mut input = debounced(&mock, Duration::from_millis(20));

        mock.drive(0, true);
        assert!(!input.read().unwrap());

        thread::sleep(Duration::from_millis(30));
        assert!(input.read().unwrap());
        assert!(input.read().unwrap());
    }
}
