mod gpio;
mod sim;

pub use gpio::*;
pub use sim::*;

use crate::{GpioError, GpioResult};
use std::fmt::Debug;
use std::time::Duration;

/// Callback invoked with a key label, synchronously from the scan task.
pub type KeyCallback = Box<dyn FnMut(&str) + Send>;

/// The `KeyScanner` trait is the common surface of the real and simulated
/// keypad scanners. The caller picks an implementation at construction time;
/// both deliver keys through the same callback contract.
pub trait KeyScanner: Debug {
    fn layout(&self) -> &KeypadLayout;

    /// Replaces the key callback; `None` clears it. What happens to a key
    /// detected while no callback is set differs per variant and is
    /// documented there.
    fn set_when_key(&self, callback: Option<KeyCallback>);

    /// Stops the scan task and releases the lines. Idempotent.
    fn close(&mut self);
}

/// Maps the row and column line offsets of a keypad matrix to key labels.
///
/// Immutable once built. When no label grid is given, labels default to
/// `"(row, col)"` built from the line offsets.
pub struct KeypadLayout {
    rows: Vec<usize>,
    cols: Vec<usize>,
    labels: Vec<Vec<String>>,
}

impl KeypadLayout {
    pub fn new(rows: &[usize], cols: &[usize], labels: Option<Vec<Vec<String>>>) -> GpioResult<Self> {
        let labels = match labels {
            Some(labels) => {
                let bad_row = labels.iter().map(Vec::len).find(|&len| len != cols.len());
                if labels.len() != rows.len() || bad_row.is_some() {
                    return Err(GpioError::LabelShape {
                        rows: rows.len(),
                        cols: cols.len(),
                        found_rows: labels.len(),
                        found_cols: bad_row.unwrap_or(cols.len()),
                    });
                }
                labels
            }
            None => rows
                .iter()
                .map(|row| cols.iter().map(|col| format!("({row}, {col})")).collect())
                .collect(),
        };

        Ok(Self {
            rows: rows.to_vec(),
            cols: cols.to_vec(),
            labels,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.cols.len()
    }

    pub fn row_offsets(&self) -> &[usize] {
        &self.rows
    }

    pub fn col_offsets(&self) -> &[usize] {
        &self.cols
    }

    pub fn label(&self, row: usize, col: usize) -> &str {
        &self.labels[row][col]
    }

    /// All labels, row by row.
    pub fn all_labels(&self) -> Vec<String> {
        self.labels.iter().flatten().cloned().collect()
    }
}

impl Debug for KeypadLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeypadLayout({}x{})", self.rows.len(), self.cols.len())
    }
}

/// Builds a label grid from one string per row, one character per key.
pub fn labels_from_rows(rows: &[&str]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.chars().map(String::from).collect())
        .collect()
}

/// Scan cadence of the real keypad.
#[derive(Copy, Clone, Debug)]
pub struct KeypadConfig {
    /// Delay between full scan cycles.
    pub scan_interval: Duration,
    /// How long each row stays activated before its columns are sampled.
    pub row_interval: Duration,
    /// Pull-up wiring: rows drive active-high, columns are pulled up and read
    /// active-low. `false` flips both polarities for pull-down wiring.
    pub pull_up: bool,
}

impl Default for KeypadConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_millis(200),
            row_interval: Duration::from_millis(1),
            pull_up: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_kept_as_given() {
        let labels = labels_from_rows(&["123", "456", "789", "*0#"]);
        let layout = KeypadLayout::new(&[0, 1, 2, 3], &[4, 5, 6], Some(labels)).unwrap();

        assert_eq!(layout.label(0, 0), "1");
        assert_eq!(layout.label(1, 2), "6");
        assert_eq!(layout.label(3, 0), "*");
        assert_eq!(layout.label(3, 2), "#");
    }

    #[test]
    fn default_labels_name_the_line_offsets() {
        let layout = KeypadLayout::new(&[17, 27], &[5, 6], None).unwrap();
        assert_eq!(layout.label(0, 0), "(17, 5)");
        assert_eq!(layout.label(1, 1), "(27, 6)");
    }

    #[test]
    fn wrong_row_count_is_a_shape_error() {
        let labels = labels_from_rows(&["12", "34"]);
        let err = KeypadLayout::new(&[0, 1, 2], &[3, 4], Some(labels)).unwrap_err();
        assert!(matches!(err, GpioError::LabelShape { found_rows: 2, .. }));
    }

    #[test]
    fn ragged_row_is_a_shape_error() {
        let labels = vec![
            vec!["1".to_string(), "2".to_string()],
            vec!["3".to_string()],
        ];
        let err = KeypadLayout::new(&[0, 1], &[2, 3], Some(labels)).unwrap_err();
        assert!(matches!(err, GpioError::LabelShape { found_cols: 1, .. }));
    }
}
