// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared numeric arrays ("pointer to array", PTA).
//!
//! A PTA is deduplicated by the identity of its `Rc` allocation, never by
//! content: two arrays with identical elements are each written in full.

use std::rc::Rc;

use bam_datagram::Datagram;

/// A homogeneous numeric array shared between objects.
#[derive(Debug, Clone, PartialEq)]
pub enum PtaData {
    /// Unsigned bytes.
    U8(Vec<u8>),
    /// Signed bytes.
    I8(Vec<i8>),
    /// Unsigned 16-bit integers.
    U16(Vec<u16>),
    /// Signed 16-bit integers.
    I16(Vec<i16>),
    /// Unsigned 32-bit integers.
    U32(Vec<u32>),
    /// Signed 32-bit integers.
    I32(Vec<i32>),
    /// Single-precision floats.
    F32(Vec<f32>),
    /// Double-precision floats.
    F64(Vec<f64>),
}

/// Shared handle to a PTA; identity is the allocation.
pub type Pta = Rc<PtaData>;

macro_rules! pta_from_vec {
    ($($variant:ident => $elem:ty),* $(,)?) => {
        $(
            impl From<Vec<$elem>> for PtaData {
                fn from(values: Vec<$elem>) -> Self {
                    Self::$variant(values)
                }
            }
        )*
    };
}

pta_from_vec! {
    U8 => u8,
    I8 => i8,
    U16 => u16,
    I16 => i16,
    U32 => u32,
    I32 => i32,
    F32 => f32,
    F64 => f64,
}

impl PtaData {
    /// Number of elements (not bytes).
    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::I8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
        }
    }

    /// Returns `true` if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of one element in bytes.
    pub fn element_size(&self) -> usize {
        match self {
            Self::U8(_) | Self::I8(_) => 1,
            Self::U16(_) | Self::I16(_) => 2,
            Self::U32(_) | Self::I32(_) | Self::F32(_) => 4,
            Self::F64(_) => 8,
        }
    }

    /// Append every element, little-endian, with no length prefix.
    pub fn write_elements(&self, dg: &mut Datagram) {
        match self {
            Self::U8(v) => dg.write_raw(v),
            Self::I8(v) => v.iter().for_each(|&x| dg.write_i8(x)),
            Self::U16(v) => v.iter().for_each(|&x| dg.write_u16_le(x)),
            Self::I16(v) => v.iter().for_each(|&x| dg.write_i16_le(x)),
            Self::U32(v) => v.iter().for_each(|&x| dg.write_u32_le(x)),
            Self::I32(v) => v.iter().for_each(|&x| dg.write_i32_le(x)),
            Self::F32(v) => v.iter().for_each(|&x| dg.write_f32_le(x)),
            Self::F64(v) => v.iter().for_each(|&x| dg.write_f64_le(x)),
        }
    }
}
