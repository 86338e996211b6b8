// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Splits written streams back into parts for assertions.
//!
//! Only the framing and record headers are understood. Bodies stay opaque
//! bytes, so ids written inside bodies do not advance the parser's id width;
//! tests that cross the 0xFFFF boundary switch it with
//! [`RecordParser::set_wide_ids`].

use std::collections::HashSet;

use bam_writer::header::MAGIC;
use thiserror::Error;

/// Errors produced while inspecting a stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InspectError {
    /// Attempted to read beyond the end of the buffer.
    #[error("buffer too short")]
    OutOfBounds,
    /// The stream does not start with the BAM magic.
    #[error("missing magic")]
    BadMagic,
    /// UTF-8 decoding of a type name failed.
    #[error("invalid utf-8")]
    InvalidUtf8,
    /// A record frame was empty where an opcode was expected.
    #[error("empty record")]
    EmptyRecord,
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], InspectError> {
        let end = self
            .offset
            .checked_add(len)
            .ok_or(InspectError::OutOfBounds)?;
        if end > self.bytes.len() {
            return Err(InspectError::OutOfBounds);
        }
        let out = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8, InspectError> {
        Ok(self.take(1)?[0])
    }

    fn read_u16_le(&mut self) -> Result<u16, InspectError> {
        let raw: [u8; 2] = self
            .take(2)?
            .try_into()
            .map_err(|_| InspectError::OutOfBounds)?;
        Ok(u16::from_le_bytes(raw))
    }

    fn read_u32_le(&mut self) -> Result<u32, InspectError> {
        let raw: [u8; 4] = self
            .take(4)?
            .try_into()
            .map_err(|_| InspectError::OutOfBounds)?;
        Ok(u32::from_le_bytes(raw))
    }

    fn read_string(&mut self) -> Result<String, InspectError> {
        let len = usize::from(self.read_u16_le()?);
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| InspectError::InvalidUtf8)
    }

    fn rest(&mut self) -> &'a [u8] {
        let out = &self.bytes[self.offset..];
        self.offset = self.bytes.len();
        out
    }

    fn is_at_end(&self) -> bool {
        self.offset == self.bytes.len()
    }
}

/// Decoded header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    /// Major version.
    pub major: u16,
    /// Minor version.
    pub minor: u16,
    /// Endian descriptor byte.
    pub endian: u8,
    /// Standard-float flag, when the header carries one.
    pub stdfloat_double: Option<bool>,
}

/// A stream split into its header and record frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamParts {
    /// Whether the stream started with the magic marker.
    pub has_magic: bool,
    /// Header fields.
    pub header: StreamHeader,
    /// Frame bodies after the header, length prefixes removed.
    pub frames: Vec<Vec<u8>>,
}

/// Split `bytes` into magic, header and frames.
pub fn parse_stream(bytes: &[u8], expect_magic: bool) -> Result<StreamParts, InspectError> {
    let mut r = Reader::new(bytes);
    if expect_magic && r.take(MAGIC.len())? != MAGIC {
        return Err(InspectError::BadMagic);
    }
    let header_len = r.read_u32_le()? as usize;
    let mut h = Reader::new(r.take(header_len)?);
    let major = h.read_u16_le()?;
    let minor = h.read_u16_le()?;
    let endian = h.read_u8()?;
    let stdfloat_double = if h.is_at_end() {
        None
    } else {
        Some(h.read_u8()? != 0)
    };
    let mut frames = Vec::new();
    while !r.is_at_end() {
        let len = r.read_u32_le()? as usize;
        frames.push(r.take(len)?.to_vec());
    }
    Ok(StreamParts {
        has_magic: expect_magic,
        header: StreamHeader {
            major,
            minor,
            endian,
            stdfloat_double,
        },
        frames,
    })
}

/// A type descriptor found in a record header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Type index being described.
    pub index: u16,
    /// Type name.
    pub name: String,
    /// Indices of the written bases, in order.
    pub bases: Vec<u16>,
}

/// One object record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Opcode byte, when records are tagged.
    pub opcode: Option<u8>,
    /// Type index; 0 marks a back-reference.
    pub type_index: u16,
    /// Descriptors introduced by this record, outermost first.
    pub descriptors: Vec<Descriptor>,
    /// Object id.
    pub object_id: u32,
    /// Remaining body bytes.
    pub body: Vec<u8>,
}

impl Record {
    /// Whether this record only refers back to an earlier full record.
    pub fn is_back_reference(&self) -> bool {
        self.type_index == 0
    }
}

/// A parsed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRecord {
    /// An object record.
    Object(Record),
    /// The closing `pop` record.
    Pop,
}

/// Stateful record-header parser; remembers which type indices it has seen.
#[derive(Debug)]
pub struct RecordParser {
    tagged: bool,
    wide_ids: bool,
    known_types: HashSet<u16>,
}

impl RecordParser {
    /// Parser for records with (`tagged`) or without a leading opcode byte.
    pub fn new(tagged: bool) -> Self {
        Self {
            tagged,
            wide_ids: false,
            known_types: HashSet::new(),
        }
    }

    /// Read record object ids as u32 from now on.
    pub fn set_wide_ids(&mut self, wide: bool) {
        self.wide_ids = wide;
    }

    /// Parse one frame body.
    pub fn parse(&mut self, frame: &[u8]) -> Result<ParsedRecord, InspectError> {
        let mut r = Reader::new(frame);
        let opcode = if self.tagged {
            let op = r.read_u8().map_err(|_| InspectError::EmptyRecord)?;
            if op == 1 && r.is_at_end() {
                return Ok(ParsedRecord::Pop);
            }
            Some(op)
        } else {
            None
        };
        let mut descriptors = Vec::new();
        let type_index = self.read_handle(&mut r, &mut descriptors)?;
        let object_id = if self.wide_ids {
            r.read_u32_le()?
        } else {
            let id = u32::from(r.read_u16_le()?);
            if id == 0xFFFF {
                self.wide_ids = true;
            }
            id
        };
        Ok(ParsedRecord::Object(Record {
            opcode,
            type_index,
            descriptors,
            object_id,
            body: r.rest().to_vec(),
        }))
    }

    fn read_handle(
        &mut self,
        r: &mut Reader<'_>,
        out: &mut Vec<Descriptor>,
    ) -> Result<u16, InspectError> {
        let index = r.read_u16_le()?;
        if index == 0 || !self.known_types.insert(index) {
            return Ok(index);
        }
        let name = r.read_string()?;
        let count = r.read_u8()?;
        let slot = out.len();
        out.push(Descriptor {
            index,
            name,
            bases: Vec::new(),
        });
        for _ in 0..count {
            let base = self.read_handle(r, out)?;
            out[slot].bases.push(base);
        }
        Ok(index)
    }

    /// Parse every frame of `parts`.
    pub fn parse_all(&mut self, parts: &StreamParts) -> Result<Vec<ParsedRecord>, InspectError> {
        parts.frames.iter().map(|f| self.parse(f)).collect()
    }
}

/// Object records of a narrow-id, tagged stream, with pops dropped.
pub fn object_records(bytes: &[u8]) -> Result<Vec<Record>, InspectError> {
    let parts = parse_stream(bytes, true)?;
    let mut parser = RecordParser::new(true);
    Ok(parser
        .parse_all(&parts)?
        .into_iter()
        .filter_map(|p| match p {
            ParsedRecord::Object(r) => Some(r),
            ParsedRecord::Pop => None,
        })
        .collect())
}
