// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error type for BAM stream writing.

use bam_datagram::DatagramError;
use thiserror::Error;

use crate::FormatVersion;

/// Errors produced while configuring or writing a BAM stream.
///
/// Any error returned from [`BamWriter::write_objects`](crate::BamWriter::write_objects)
/// leaves the stream truncated mid-segment; the writer refuses further writes
/// with [`BamError::Poisoned`].
#[derive(Debug, Error)]
pub enum BamError {
    /// A datagram field could not be encoded (e.g. a string over 65535 bytes).
    #[error(transparent)]
    Datagram(#[from] DatagramError),
    /// The sink failed. Surfaced verbatim; no retry is attempted.
    #[error("sink i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// An earlier write failed or unwound part-way; the stream is unusable.
    #[error("stream is poisoned by an earlier failed write")]
    Poisoned,
    /// More distinct types than a u16 type index can address.
    #[error("type index space exhausted (max {max})")]
    TypeIndexOverflow {
        /// Largest representable type index.
        max: u16,
    },
    /// A type declares more bases than the u8 base count can describe.
    #[error("type {name} declares {count} bases (max 255)")]
    TooManyBases {
        /// Offending type name.
        name: &'static str,
        /// Number of written bases.
        count: usize,
    },
    /// The object or shared-array id counter wrapped.
    #[error("{kind} id space exhausted")]
    IdSpaceExhausted {
        /// Which id kind ran out (`"object"` or `"pta"`).
        kind: &'static str,
    },
    /// An id above `0xFFFF` was about to be written before id `0xFFFF` itself,
    /// which readers need to see first to switch to 32-bit ids.
    #[error("id {id} needs 32 bits but id 0xFFFF has not been written yet")]
    WideIdBeforeSwitch {
        /// The id that could not be encoded.
        id: u32,
    },
    /// A shared array has more elements than its u32 length prefix allows.
    #[error("shared array too large: {len} elements")]
    PtaTooLarge {
        /// Element count that was rejected.
        len: usize,
    },
    /// 64-bit standard floats were requested for a format that cannot flag them.
    #[error("64-bit standard floats need format {min} or newer, got {version}")]
    StdfloatUnsupported {
        /// Configured format version.
        version: FormatVersion,
        /// First version carrying the standard-float flag.
        min: FormatVersion,
    },
    /// Writer configuration could not be parsed or rendered.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}
