//! Monotonic id sequences owned by the signal graph

/// A monotonically increasing counter that can only be advanced or reset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    initial: u64,
    next: u64,
}

impl Sequence {
    /// Creates a sequence whose first value is `initial`
    pub fn starting_at(initial: u64) -> Self {
        Self {
            initial,
            next: initial,
        }
    }

    /// Returns the current value and advances the sequence
    pub fn next(&mut self) -> u64 {
        let value = self.next;
        self.next += 1;
        value
    }

    /// Rewinds the sequence to its initial value
    pub fn reset(&mut self) {
        self.next = self.initial;
    }
}
