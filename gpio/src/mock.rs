//! In-memory line driver for development and tests.

use crate::{ActiveLevel, Bias, GpioError, GpioResult, InputLine, LineDriver, OutputLine, lock};
use bitvec::vec::BitVec;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::AtomicU8;
use std::sync::{Arc, Mutex};

/// Line driver with no hardware behind it.
///
/// The board state lives in the logical "active" domain: an output is either
/// activated or not, an input reads whatever the test drove it to. An output
/// can also be bridged to an input, which models a held-down key in a matrix:
/// the input reads active exactly while the bridged output is activated.
///
/// Cloning shares the board, so a test can keep a handle while the driver is
/// lent to the device under test. Output operations are recorded until
/// [`clear_ops`](MockLines::clear_ops) is called.
#[derive(Clone)]
pub struct MockLines {
    shared: Arc<Shared>,
}

struct Shared {
    board: Mutex<Board>,
    used_lines: BitVec<AtomicU8>,
}

#[derive(Default)]
struct Board {
    driven: Vec<bool>,
    forced: Vec<Option<bool>>,
    bridges: Vec<(usize, usize)>,
    ops: Vec<(usize, bool)>,
}

impl MockLines {
    pub fn new(line_count: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                board: Mutex::new(Board {
                    driven: vec![false; line_count],
                    forced: vec![None; line_count],
                    bridges: Vec::new(),
                    ops: Vec::new(),
                }),
                used_lines: BitVec::repeat(false, line_count),
            }),
        }
    }

    /// Forces an input line to read `active`, overriding any bridge.
    pub fn drive(&self, offset: usize, active: bool) {
        lock(&self.shared.board).forced[offset] = Some(active);
    }

    /// Removes a forced input level set by [`drive`](MockLines::drive).
    pub fn float(&self, offset: usize) {
        lock(&self.shared.board).forced[offset] = None;
    }

    /// Connects an output line to an input line, like a key held down.
    pub fn bridge(&self, output: usize, input: usize) {
        lock(&self.shared.board).bridges.push((output, input));
    }

    pub fn unbridge(&self, output: usize, input: usize) {
        lock(&self.shared.board)
            .bridges
            .retain(|&pair| pair != (output, input));
    }

    /// Whether an output line is currently activated.
    pub fn output_active(&self, offset: usize) -> bool {
        lock(&self.shared.board).driven[offset]
    }

    /// Every `activate`/`deactivate` call observed so far, in order.
    pub fn output_ops(&self) -> Vec<(usize, bool)> {
        lock(&self.shared.board).ops.clone()
    }

    pub fn clear_ops(&self) {
        lock(&self.shared.board).ops.clear();
    }

    /// How many lines are currently claimed.
    pub fn lines_in_use(&self) -> usize {
        self.shared.used_lines.count_ones()
    }
}

impl Debug for MockLines {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockLines({})", self.shared.used_lines.len())
    }
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

impl LineDriver for MockLines {
    fn line_count(&self) -> GpioResult<usize> {
        Ok(self.shared.used_lines.len())
    }

    fn output_line(&self, offset: usize, _active_level: ActiveLevel) -> GpioResult<Box<dyn OutputLine>> {
        self.shared.claim(offset)?;
        Ok(Box::new(MockOutput {
            shared: self.shared.clone(),
            offset,
        }))
    }

    fn input_line(
        &self,
        offset: usize,
        _bias: Bias,
        _active_level: ActiveLevel,
    ) -> GpioResult<Box<dyn InputLine>> {
        self.shared.claim(offset)?;
        Ok(Box::new(MockInput {
            shared: self.shared.clone(),
            offset,
        }))
    }
}

struct MockOutput {
    shared: Arc<Shared>,
    offset: usize,
}

impl Debug for MockOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockLines[{}][output]", self.offset)
    }
}

impl OutputLine for MockOutput {
    fn activate(&self) -> GpioResult<()> {
        let mut board = lock(&self.shared.board);
        board.driven[self.offset] = true;
        board.ops.push((self.offset, true));
        Ok(())
    }

    fn deactivate(&self) -> GpioResult<()> {
        let mut board = lock(&self.shared.board);
        board.driven[self.offset] = false;
        board.ops.push((self.offset, false));
        Ok(())
    }

    fn offset(&self) -> usize {
        self.offset
    }
}

impl Drop for MockOutput {
    fn drop(&mut self) {
        self.shared.release(self.offset);
    }
}

struct MockInput {
    shared: Arc<Shared>,
    offset: usize,
}

impl Debug for MockInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockLines[{}][input]", self.offset)
    }
}

impl InputLine for MockInput {
    fn is_active(&self) -> GpioResult<bool> {
        let board = lock(&self.shared.board);
        if let Some(forced) = board.forced[self.offset] {
            return Ok(forced);
        }
        Ok(board
            .bridges
            .iter()
            .any(|&(output, input)| input == self.offset && board.driven[output]))
    }

    fn offset(&self) -> usize {
        self.offset
    }
}

impl Drop for MockInput {
    fn drop(&mut self) {
        self.shared.release(self.offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_exclusive() {
        let mock = MockLines::new(4);
        let line = mock.output_line(1, ActiveLevel::High).unwrap();
        assert_eq!(
            mock.output_line(1, ActiveLevel::High).err(),
            Some(GpioError::AlreadyInUse)
        );
        assert_eq!(
            mock.input_line(1, Bias::PullUp, ActiveLevel::Low).err(),
            Some(GpioError::AlreadyInUse)
        );
        assert_eq!(mock.lines_in_use(), 1);

        drop(line);
        assert_eq!(mock.lines_in_use(), 0);
        assert!(mock.output_line(1, ActiveLevel::High).is_ok());
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let mock = MockLines::new(2);
        assert_eq!(
            mock.output_line(2, ActiveLevel::High).err(),
            Some(GpioError::InvalidArgument)
        );
    }

    #[test]
    fn bridged_input_follows_output() {
        let mock = MockLines::new(4);
        let row = mock.output_line(0, ActiveLevel::High).unwrap();
        let col = mock.input_line(2, Bias::PullUp, ActiveLevel::Low).unwrap();

        mock.bridge(0, 2);
        assert!(!col.is_active().unwrap());

        row.activate().unwrap();
        assert!(col.is_active().unwrap());

        row.deactivate().unwrap();
        assert!(!col.is_active().unwrap());

        mock.unbridge(0, 2);
        row.activate().unwrap();
        assert!(!col.is_active().unwrap());
    }

    #[test]
    fn forced_level_overrides_bridge() {
        let mock = MockLines::new(4);
        let row = mock.output_line(0, ActiveLevel::High).unwrap();
        let col = mock.input_line(1, Bias::PullUp, ActiveLevel::Low).unwrap();

        mock.bridge(0, 1);
        row.activate().unwrap();
        mock.drive(1, false);
        assert!(!col.is_active().unwrap());

        mock.float(1);
        assert!(col.is_active().unwrap());
    }

    #[test]
    fn output_ops_are_recorded() {
        let mock = MockLines::new(2);
        let out = mock.output_line(0, ActiveLevel::High).unwrap();
        out.activate().unwrap();
        out.deactivate().unwrap();
        assert_eq!(mock.output_ops(), vec![(0, true), (0, false)]);

        mock.clear_ops();
        assert!(mock.output_ops().is_empty());
    }
}
