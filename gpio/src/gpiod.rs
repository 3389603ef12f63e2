//! Physical line driver backed by the Linux GPIO character device.

use crate::{ActiveLevel, Bias, GpioError, GpioResult, InputLine, LineDriver, OutputLine};
use bitvec::vec::BitVec;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::AtomicU8;

/// GPIO line driver over a `/dev/gpiochipN` device, using the gpiod library.
pub struct GpiodLines {
    shared: Arc<Shared>,
}

struct Shared {
    chip: gpiod::Chip,
    used_lines: BitVec<AtomicU8>,
}

impl Shared {
    fn claim(&self, offset: usize) -> GpioResult<()> {
        if offset >= self.used_lines.len() {
            return Err(GpioError::InvalidArgument);
        }
        if self.used_lines[offset] {
            return Err(GpioError::AlreadyInUse);
        }
        self.used_lines.set_aliased(offset, true);
        Ok(())
    }

    fn release(&self, offset: usize) {
        self.used_lines.set_aliased(offset, false);
    }
}

impl GpiodLines {
    pub fn new(chip: gpiod::Chip) -> Self {
        let n = chip.num_lines() as usize;
        Self {
            shared: Arc::new(Shared {
                chip,
                used_lines: BitVec::repeat(false, n),
            }),
        }
    }

    pub fn open(path: &str) -> GpioResult<Self> {
        Ok(Self::new(gpiod::Chip::new(path)?))
    }
}

impl Debug for GpiodLines {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodLines({})", self.shared.chip.name())
    }
}

impl From<ActiveLevel> for gpiod::Active {
    fn from(level: ActiveLevel) -> Self {
        match level {
            ActiveLevel::High => gpiod::Active::High,
            ActiveLevel::Low => gpiod::Active::Low,
        }
    }
}

impl From<Bias> for gpiod::Bias {
    fn from(bias: Bias) -> Self {
        match bias {
            Bias::None => gpiod::Bias::Disable,
            Bias::PullUp => gpiod::Bias::PullUp,
            Bias::PullDown => gpiod::Bias::PullDown,
        }
    }
}

impl LineDriver for GpiodLines {
    fn line_count(&self) -> GpioResult<usize> {
        Ok(self.shared.chip.num_lines() as usize)
    }

    fn output_line(&self, offset: usize, active_level: ActiveLevel) -> GpioResult<Box<dyn OutputLine>> {
        self.shared.claim(offset)?;

        let request = self.shared.chip.request_lines(
            gpiod::Options::output([offset as u32])
                .consumer(env!("CARGO_PKG_NAME"))
                .active(active_level.into()),
        );
        let line = match request {
            Ok(line) => line,
            Err(err) => {
                self.shared.release(offset);
                return Err(err.into());
            }
        };

        Ok(Box::new(GpiodOutput {
            shared: self.shared.clone(),
            offset,
            line,
        }))
    }

    fn input_line(
        &self,
        offset: usize,
        bias: Bias,
        active_level: ActiveLevel,
    ) -> GpioResult<Box<dyn InputLine>> {
        self.shared.claim(offset)?;

        let request = self.shared.chip.request_lines(
            gpiod::Options::input([offset as u32])
                .consumer(env!("CARGO_PKG_NAME"))
                .active(active_level.into())
                .bias(bias.into()),
        );
        let line = match request {
            Ok(line) => line,
            Err(err) => {
                self.shared.release(offset);
                return Err(err.into());
            }
        };

        Ok(Box::new(GpiodInput {
            shared: self.shared.clone(),
            offset,
            line,
        }))
    }
}

struct GpiodOutput {
    shared: Arc<Shared>,
    offset: usize,
    line: gpiod::Lines<gpiod::Output>,
}

impl Debug for GpiodOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodLines({})[{}][output]", self.shared.chip.name(), self.offset)
    }
}

impl OutputLine for GpiodOutput {
    fn activate(&self) -> GpioResult<()> {
        self.line.set_values([true])?;
        Ok(())
    }

    fn deactivate(&self) -> GpioResult<()> {
        self.line.set_values([false])?;
        Ok(())
    }

    fn offset(&self) -> usize {
        self.offset
    }
}

impl Drop for GpiodOutput {
    fn drop(&mut self) {
        self.shared.release(self.offset);
    }
}

struct GpiodInput {
    shared: Arc<Shared>,
    offset: usize,
    line: gpiod::Lines<gpiod::Input>,
}

impl Debug for GpiodInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodLines({})[{}][input]", self.shared.chip.name(), self.offset)
    }
}

impl InputLine for GpiodInput {
    fn is_active(&self) -> GpioResult<bool> {
        let values = self.line.get_values([false])?;
        Ok(values[0])
    }

    fn offset(&self) -> usize {
        self.offset
    }
}

impl Drop for GpiodInput {
    fn drop(&mut self) {
        self.shared.release(self.offset);
    }
}
