// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Format version tuple and the record opcodes it gates.

use serde::{Deserialize, Serialize};

/// A `(major, minor)` BAM format version. Ordering is lexicographic.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct FormatVersion {
    /// Major version (6 for every stream this crate writes).
    pub major: u16,
    /// Minor version.
    pub minor: u16,
}

impl FormatVersion {
    /// Version written by default.
    pub const CURRENT: Self = Self::new(6, 41);
    /// First version whose records start with a [`BocOpcode`] byte.
    pub const BOC_OPCODES: Self = Self::new(6, 21);
    /// First version whose header carries the standard-float width flag.
    pub const STDFLOAT_FLAG: Self = Self::new(6, 27);

    /// Construct a version tuple.
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Whether records carry a leading opcode byte and segments close with
    /// a `pop` record.
    pub fn has_boc_opcodes(self) -> bool {
        self >= Self::BOC_OPCODES
    }

    /// Whether the header carries the standard-float width flag.
    pub fn has_stdfloat_flag(self) -> bool {
        self >= Self::STDFLOAT_FLAG
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Opcode byte at the start of each record (format 6.21+).
///
/// The writer only ever emits `Push`, `Adjunct` and `Pop`; the remaining
/// codes belong to the format and are listed for readers sharing this crate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum BocOpcode {
    /// First record of a segment.
    Push = 0,
    /// Closing record of a segment; carries no object.
    Pop = 1,
    /// Any later record of a segment.
    Adjunct = 2,
    /// Removal of previously written objects.
    Remove = 3,
    /// Auxiliary file data.
    FileData = 4,
}

impl From<BocOpcode> for u8 {
    fn from(op: BocOpcode) -> Self {
        op as Self
    }
}
