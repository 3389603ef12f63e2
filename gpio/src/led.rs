//! Single-line LED.

use crate::{ActiveLevel, GpioResult, LineDriver, OutputLine};
use log::debug;
use std::fmt::{Debug, Formatter};

pub struct Led {
    line: Box<dyn OutputLine>,
    lit: bool,
}

impl Led {
    pub fn new(driver: &dyn LineDriver, pin: usize) -> GpioResult<Self> {
        Self::with_active_level(driver, pin, ActiveLevel::High)
    }

    /// `ActiveLevel::Low` for an LED wired to sink current into the pin.
    pub fn with_active_level(
        driver: &dyn LineDriver,
        pin: usize,
        active_level: ActiveLevel,
    ) -> GpioResult<Self> {
        let line = driver.output_line(pin, active_level)?;
        line.deactivate()?;
        Ok(Self { line, lit: false })
    }

    pub fn on(&mut self) -> GpioResult<()> {
        self.set(true)
    }

    pub fn off(&mut self) -> GpioResult<()> {
        self.set(false)
    }

    pub fn toggle(&mut self) -> GpioResult<()> {
        self.set(!self.lit)
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    fn set(&mut self, lit: bool) -> GpioResult<()> {
        if lit == self.lit {
            return Ok(());
        }
        if lit {
            self.line.activate()?;
        } else {
            self.line.deactivate()?;
        }
        self.lit = lit;
        debug!("{:?} [{}]", self, if lit { "ON" } else { "OFF" });
        Ok(())
    }
}

impl Debug for Led {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Led@{}", self.line.offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLines;

    #[test]
    fn follows_commands() {
        let mock = MockLines::new(1);
        let mut led = Led::new(&mock, 0).unwrap();
        assert!(!led.is_lit());
        assert!(!mock.output_active(0));

        led.on().unwrap();
        assert!(led.is_lit());
        assert!(mock.output_active(0));

        led.toggle().unwrap();
        assert!(!led.is_lit());
        assert!(!mock.output_active(0));
    }

    #[test]
    fn repeated_on_touches_the_line_once() {
        let mock = MockLines::new(1);
        let mut led = Led::new(&mock, 0).unwrap();
        mock.clear_ops();

        led.on().unwrap();
        led.on().unwrap();
        assert_eq!(mock.output_ops(), vec![(0, true)]);
    }
}
