// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for BAM writer crates.
//!
//! # Modules
//!
//! - [`catalog`] - Fixture writable types with simple, documented bodies
//! - [`inspect`] - Splits a written stream into header, frames and record headers
//! - [`sinks`] - Sinks that fail after a byte budget or on flush
#![forbid(unsafe_code)]

pub mod catalog;
pub mod inspect;
pub mod sinks;

pub use catalog::{
    Empty, Node, Transform, MODEL_NODE, MODEL_ROOT, PANDA_NODE, RENDER_STATE, TRANSFORM_STATE,
};
pub use inspect::{
    object_records, parse_stream, Descriptor, InspectError, ParsedRecord, Record, RecordParser,
    StreamHeader, StreamParts,
};
pub use sinks::FailingSink;

use bam_writer::{BamError, BamWriter, ObjectRef, WriterConfig};

/// Open a file stream on a `Vec`, write `roots` as one segment and return the
/// bytes.
pub fn write_graph(roots: &[ObjectRef], config: WriterConfig) -> Result<Vec<u8>, BamError> {
    let mut writer = BamWriter::open(Vec::new(), config)?;
    writer.write_objects(roots)?;
    writer.into_inner()
}
