//! Type-safe wrappers for decomposition levels and output bits.
//!
//! A [`Level`] is the dependency depth of a function term. Level 0 holds the
//! primary inputs and is never turned into a crossbar; every other level is
//! synthesized into exactly one crossbar, and levels are chained in ascending
//! order.
use std::fmt;

/// A decomposition level (0-indexed dependency depth).
///
/// # Invariants
///
/// - Level 0 is the primary input level
/// - A term at level `d > 0` only references terms at levels `< d`
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Level(usize);

impl Level {
    /// The primary input level.
    pub const INPUTS: Level = Level(0);

    /// Creates a new level with the given depth.
    pub fn new(index: usize) -> Self {
        Level(index)
    }

    /// Returns the raw depth as a `usize`.
    pub fn index(self) -> usize {
        self.0
    }

    /// Returns the previous level, or None if at level 0.
    pub fn prev(self) -> Option<Self> {
        if self.0 > 0 {
            Some(Level(self.0 - 1))
        } else {
            None
        }
    }

    /// Checks if this is the primary input level (level 0).
    pub fn is_inputs(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a crossbar output bit.
///
/// Output bits are numbered `0, 1, 2, ...` in output declaration order. In the
/// device matrix, the sensing device of bit `n` is encoded as the cell value `n + 2`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct OutputBit(u32);

impl OutputBit {
    /// Cell value offset: `0` means no device, `1` a plain device.
    pub const CELL_OFFSET: u32 = 2;

    pub fn new(bit: u32) -> Self {
        OutputBit(bit)
    }

    /// The matrix cell value encoding this bit.
    pub fn cell(self) -> u32 {
        self.0 + Self::CELL_OFFSET
    }
}

impl fmt::Display for OutputBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}
