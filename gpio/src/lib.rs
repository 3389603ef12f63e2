pub mod button;
pub mod buzzer;
pub mod debounce;
pub mod distance;
pub mod gpiod;
pub mod keypad;
pub mod led;
pub mod mock;
pub mod motion;
pub mod rgb;
pub mod worker;

use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("line already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("label grid is {found_rows}x{found_cols}, expected {rows}x{cols}")]
    LabelShape {
        rows: usize,
        cols: usize,
        found_rows: usize,
        found_cols: usize,
    },
    #[error("timed out")]
    Timeout,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("error: {0}")]
    Other(String),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// Specifies the logical active level of a line.
///
/// An active-low output drives the line low on `activate`; an active-low
/// input reads active while the line is electrically low.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ActiveLevel {
    #[default]
    High,
    Low,
}

/// Specifies the bias of an input line.
///
/// Use this to enable pull-up or pull-down resistors, which decide what an
/// unconnected line reads as.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Bias {
    #[default]
    None,
    PullUp,
    PullDown,
}

/// Hands out GPIO lines, one owner per line.
///
/// Implemented by the physical chip backend ([`gpiod::GpiodLines`]) and the
/// in-memory backend ([`mock::MockLines`]); devices take whichever one the
/// caller passes in. Handles own their line outright and release it when
/// dropped, so a claimed line can move into a background task.
pub trait LineDriver: Debug {
    /// Gets the amount of GPIO lines available.
    fn line_count(&self) -> GpioResult<usize>;

    /// Claims a line for output. `activate` drives the electrical state
    /// chosen by `active_level`.
    fn output_line(&self, offset: usize, active_level: ActiveLevel) -> GpioResult<Box<dyn OutputLine>>;

    /// Claims a line for input.
    fn input_line(
        &self,
        offset: usize,
        bias: Bias,
        active_level: ActiveLevel,
    ) -> GpioResult<Box<dyn InputLine>>;
}

pub trait OutputLine: Debug + Send + Sync {
    fn activate(&self) -> GpioResult<()>;
    fn deactivate(&self) -> GpioResult<()>;
    fn offset(&self) -> usize;
}

pub trait InputLine: Debug + Send + Sync {
    /// Reads the line, interpreted through its active level.
    fn is_active(&self) -> GpioResult<bool>;
    fn offset(&self) -> usize;
}

/// Locks a mutex, recovering the guard if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|err| err.into_inner())
}
