use log::debug;

/// Outcome of feeding one key into the entry buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Entry {
    Pending,
    Accepted,
    Rejected,
}

/// Tracks typed keys against the unlock code.
///
/// Single-character keys accumulate; `*` clears the buffer. Once as many
/// keys as the code has are in, the buffer is compared, reported, and
/// cleared. Multi-character labels (the default `"(row, col)"` kind) don't
/// take part in code entry.
pub struct CodeEntry {
    code: Vec<char>,
    entered: Vec<char>,
}

impl CodeEntry {
    pub fn new(code: Vec<char>) -> Self {
        Self {
            code,
            entered: Vec::new(),
        }
    }

    pub fn push(&mut self, key: &str) -> Entry {
        let mut chars = key.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return Entry::Pending;
        };

        if ch == '*' {
            debug!("entry cleared");
            self.entered.clear();
            return Entry::Pending;
        }

        self.entered.push(ch);
        if self.entered.len() < self.code.len() {
            return Entry::Pending;
        }

        let verdict = if self.entered == self.code {
            Entry::Accepted
        } else {
            Entry::Rejected
        };
        self.entered.clear();
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> CodeEntry {
        CodeEntry::new(vec!['1', '2', '3', '4'])
    }

    #[test]
    fn right_code_is_accepted() {
        let mut entry = entry();
        assert_eq!(entry.push("1"), Entry::Pending);
        assert_eq!(entry.push("2"), Entry::Pending);
        assert_eq!(entry.push("3"), Entry::Pending);
        assert_eq!(entry.push("4"), Entry::Accepted);
    }

    #[test]
    fn wrong_code_is_rejected_and_forgotten() {
        let mut entry = entry();
        for key in ["9", "9", "9"] {
            assert_eq!(entry.push(key), Entry::Pending);
        }
        assert_eq!(entry.push("9"), Entry::Rejected);

        // The buffer restarts clean after a verdict.
        assert_eq!(entry.push("1"), Entry::Pending);
        assert_eq!(entry.push("2"), Entry::Pending);
        assert_eq!(entry.push("3"), Entry::Pending);
        assert_eq!(entry.push("4"), Entry::Accepted);
    }

    #[test]
    fn star_clears_a_typo() {
        let mut entry = entry();
        entry.push("9");
        entry.push("9");
        assert_eq!(entry.push("*"), Entry::Pending);

        entry.push("1");
        entry.push("2");
        entry.push("3");
        assert_eq!(entry.push("4"), Entry::Accepted);
    }

    #[test]
    fn multi_char_labels_are_ignored() {
        let mut entry = entry();
        assert_eq!(entry.push("(0, 4)"), Entry::Pending);
        entry.push("1");
        entry.push("2");
        entry.push("3");
        assert_eq!(entry.push("4"), Entry::Accepted);
    }
}
