// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Datagram builder for BAM object-graph streams.
//!
//! Every unit of a BAM stream (the header and each object record) is built in
//! a [`Datagram`]: an append-only byte buffer of little-endian scalars and
//! u16-length-prefixed strings. When a datagram is complete it is framed with
//! a u32 length prefix via [`Datagram::to_framed`] and handed to the sink.
//!
//! # Byte order
//!
//! All multi-byte values are little-endian regardless of the host. The host
//! byte order is only ever *recorded* in the stream header, never used to
//! pick an encoding.
//!
//! # Standard floats
//!
//! Catalog types write most of their float fields as "standard floats" whose
//! width (32 or 64 bits) is a stream-wide setting. The width is fixed when the
//! datagram is constructed; [`Datagram::write_stdfloat`] and the vector
//! writers honour it.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod datagram;
pub use datagram::Datagram;

/// Largest byte length a length-prefixed string may have (u16 prefix).
pub const MAX_STRING_LEN: usize = 0xFFFF;

/// Errors produced while building a datagram.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatagramError {
    /// A string or blob does not fit the 16-bit length prefix.
    #[error("string too long: {len} bytes exceeds max {MAX_STRING_LEN}")]
    StringTooLong {
        /// Encoded byte length that was rejected.
        len: usize,
    },
    /// The datagram body does not fit the 32-bit frame prefix.
    #[error("datagram too large to frame: {len} bytes")]
    DatagramTooLarge {
        /// Body length that was rejected.
        len: usize,
    },
}
