//! Three-line RGB LED.

use crate::{ActiveLevel, GpioResult, LineDriver, OutputLine};
use log::debug;
use std::fmt::{Debug, Formatter};

/// RGB LED with per-channel on/off control.
///
/// Channels are plain digital outputs; intensity mixing needs PWM, which
/// belongs to the line driver underneath, so eight colors is the palette.
pub struct RgbLed {
    channels: [Box<dyn OutputLine>; 3],
    color: (bool, bool, bool),
}

impl RgbLed {
    pub fn new(driver: &dyn LineDriver, red: usize, green: usize, blue: usize) -> GpioResult<Self> {
        let channels = [
            driver.output_line(red, ActiveLevel::High)?,
            driver.output_line(green, ActiveLevel::High)?,
            driver.output_line(blue, ActiveLevel::High)?,
        ];
        for channel in &channels {
            channel.deactivate()?;
        }
        Ok(Self {
            channels,
            color: (false, false, false),
        })
    }

    pub fn set_color(&mut self, red: bool, green: bool, blue: bool) -> GpioResult<()> {
        let color = (red, green, blue);
        if color == self.color {
            return Ok(());
        }
        for (channel, lit) in self.channels.iter().zip([red, green, blue]) {
            if lit {
                channel.activate()?;
            } else {
                channel.deactivate()?;
            }
        }
        self.color = color;
        debug!("{:?} [({}, {}, {})]", self, red as u8, green as u8, blue as u8);
        Ok(())
    }

    pub fn off(&mut self) -> GpioResult<()> {
        self.set_color(false, false, false)
    }

    pub fn color(&self) -> (bool, bool, bool) {
        self.color
    }
}

impl Debug for RgbLed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RgbLed@({}, {}, {})",
            self.channels[0].offset(),
            self.channels[1].offset(),
            self.channels[2].offset()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLines;

    #[test]
    fn channels_follow_the_color() {
        let mock = MockLines::new(3);
        let mut rgb = RgbLed::new(&mock, 0, 1, 2).unwrap();

        rgb.set_color(true, false, true).unwrap();
        assert!(mock.output_active(0));
        assert!(!mock.output_active(1));
        assert!(mock.output_active(2));
        assert_eq!(rgb.color(), (true, false, true));

        rgb.off().unwrap();
        assert!(!mock.output_active(0));
        assert!(!mock.output_active(2));
    }
}
