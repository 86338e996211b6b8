// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Writer for self-describing BAM object-graph streams.
//!
//! A stream reconstructs an arbitrary directed graph of typed objects,
//! cycles included, with no schema shipped alongside it: each type's name and
//! base chain is embedded the first time the type is used.
//!
//! # Stream layout
//!
//! ```text
//! stream   = magic(6)? frame(header) segment*
//! frame(x) = u32 LE len(x) || x
//! segment  = frame(record)+ frame(pop)?
//! record   = opcode(u8)? type-index(u16) descriptor? object-id body?
//! descriptor = name(u16-prefixed) base-count(u8) (type-index descriptor?)*
//! ```
//!
//! Opcodes and the closing `pop` frame are present from format 6.21. Object
//! and PTA ids are u16 until id `0xFFFF` has been written, then u32. A record
//! with type index 0 is a back-reference to an object already described.
//!
//! # Writing
//!
//! Objects implement [`TypedWritable`]. [`BamWriter::write_objects`] assigns
//! each root an id, queues it, and drains the queue; while an object writes
//! its fields it references others through [`Manager`], which assigns ids and
//! queues anything new. Traversal is an explicit FIFO queue, so deep or
//! cyclic graphs never recurse.
//!
//! ```
//! use std::rc::Rc;
//! use bam_writer::{BamWriter, InternalName, WriterConfig};
//!
//! let mut writer = BamWriter::open(Vec::new(), WriterConfig::default()).unwrap();
//! writer.write_object(&Rc::new(InternalName::new("root"))).unwrap();
//! let bytes = writer.into_inner().unwrap();
//! assert_eq!(&bytes[..6], b"pbj\0\n\r");
//! ```
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
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod config;
mod error;
pub mod header;
mod manager;
mod pta;
pub mod registry;
mod type_handle;
mod version;
mod writable;
mod writer;

pub use bam_datagram::{Datagram, DatagramError, MAX_STRING_LEN};
pub use config::WriterConfig;
pub use error::BamError;
pub use manager::Manager;
pub use pta::{Pta, PtaData};
pub use type_handle::{
    TypeHandle, IMPLICIT_ROOT, INTERNAL_NAME, TYPED_OBJECT, TYPED_WRITABLE,
    TYPED_WRITABLE_REFERENCE_COUNT,
};
pub use version::{BocOpcode, FormatVersion};
pub use writable::{AsObjectRef, InternalName, ModifiedFlag, ObjectRef, TypedWritable};
pub use writer::BamWriter;
