// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Append-only little-endian datagram.

use crate::{DatagramError, MAX_STRING_LEN};

/// Append-only builder for one BAM datagram.
///
/// The standard-float width is chosen at construction and cannot change
/// afterwards, so every float field of a record is encoded consistently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Datagram {
    buf: Vec<u8>,
    stdfloat_double: bool,
}

impl Datagram {
    /// Create an empty datagram. `stdfloat_double` selects 64-bit standard
    /// floats; otherwise they are written as 32-bit.
    pub fn new(stdfloat_double: bool) -> Self {
        Self {
            buf: Vec::new(),
            stdfloat_double,
        }
    }

    /// Create an empty datagram with a pre-allocated capacity.
    pub fn with_capacity(stdfloat_double: bool, capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            stdfloat_double,
        }
    }

    /// Whether standard floats are written as 64-bit.
    pub fn stdfloat_double(&self) -> bool {
        self.stdfloat_double
    }

    /// Number of body bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// View the body bytes (without the frame prefix).
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append raw bytes with no length prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a boolean as a single `0`/`1` byte.
    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    /// Write a single unsigned byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Write a single signed byte.
    pub fn write_i8(&mut self, value: i8) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian u16.
    pub fn write_u16_le(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian i16.
    pub fn write_i16_le(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian u32.
    pub fn write_u32_le(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian i32.
    pub fn write_i32_le(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian u64.
    pub fn write_u64_le(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian i64.
    pub fn write_i64_le(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian IEEE-754 single.
    pub fn write_f32_le(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian IEEE-754 double.
    pub fn write_f64_le(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a standard float at this datagram's configured width.
    ///
    /// In 32-bit mode the value is rounded to the nearest `f32`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_stdfloat(&mut self, value: f64) {
        if self.stdfloat_double {
            self.write_f64_le(value);
        } else {
            self.write_f32_le(value as f32);
        }
    }

    /// Write a 2-component vector of standard floats.
    pub fn write_vec2(&mut self, v: [f64; 2]) {
        self.write_stdfloats(&v);
    }

    /// Write a 3-component vector of standard floats.
    pub fn write_vec3(&mut self, v: [f64; 3]) {
        self.write_stdfloats(&v);
    }

    /// Write a 4-component vector of standard floats.
    pub fn write_vec4(&mut self, v: [f64; 4]) {
        self.write_stdfloats(&v);
    }

    fn write_stdfloats(&mut self, values: &[f64]) {
        for &value in values {
            self.write_stdfloat(value);
        }
    }

    /// Write a UTF-8 string with a u16 length prefix.
    pub fn write_string(&mut self, value: &str) -> Result<(), DatagramError> {
        self.write_blob(value.as_bytes())
    }

    /// Write an arbitrary byte string with a u16 length prefix.
    pub fn write_blob(&mut self, bytes: &[u8]) -> Result<(), DatagramError> {
        if bytes.len() > MAX_STRING_LEN {
            return Err(DatagramError::StringTooLong { len: bytes.len() });
        }
        let len = u16::try_from(bytes.len())
            .map_err(|_| DatagramError::StringTooLong { len: bytes.len() })?;
        self.write_u16_le(len);
        self.write_raw(bytes);
        Ok(())
    }

    /// Return the body prefixed with its own u32 length, ready for the sink.
    pub fn to_framed(&self) -> Result<Vec<u8>, DatagramError> {
        let len = u32::try_from(self.buf.len())
            .map_err(|_| DatagramError::DatagramTooLarge { len: self.buf.len() })?;
        let mut out = Vec::with_capacity(4 + self.buf.len());
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&self.buf);
        Ok(out)
    }

    /// Consume the datagram and return the unframed body.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}
