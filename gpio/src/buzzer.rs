//! Single-line active buzzer.

use crate::{ActiveLevel, GpioResult, LineDriver, OutputLine};
use log::debug;
use std::fmt::{Debug, Formatter};

pub struct Buzzer {
    line: Box<dyn OutputLine>,
    sounding: bool,
}

impl Buzzer {
    pub fn new(driver: &dyn LineDriver, pin: usize) -> GpioResult<Self> {
        Self::with_active_level(driver, pin, ActiveLevel::High)
    }

    pub fn with_active_level(
        driver: &dyn LineDriver,
        pin: usize,
        active_level: ActiveLevel,
    ) -> GpioResult<Self> {
        let line = driver.output_line(pin, active_level)?;
        line.deactivate()?;
        Ok(Self {
            line,
            sounding: false,
        })
    }

    pub fn on(&mut self) -> GpioResult<()> {
        self.set(true)
    }

    pub fn off(&mut self) -> GpioResult<()> {
        self.set(false)
    }

    pub fn toggle(&mut self) -> GpioResult<()> {
        self.set(!self.sounding)
    }

    pub fn is_sounding(&self) -> bool {
        self.sounding
    }

    fn set(&mut self, sounding: bool) -> GpioResult<()> {
        if sounding == self.sounding {
            return Ok(());
        }
        if sounding {
            self.line.activate()?;
        } else {
            self.line.deactivate()?;
        }
        self.sounding = sounding;
        debug!("{:?} [{}]", self, if sounding { "ON" } else { "OFF" });
        Ok(())
    }
}

impl Debug for Buzzer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Buzzer@{}", self.line.offset())
    }
}
