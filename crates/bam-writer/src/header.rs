// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stream magic and header datagram.
//!
//! ```text
//! magic   6     "pbj\0\n\r"        (file streams only)
//! frame   4     u32 LE header length
//! major   2     u16 LE
//! minor   2     u16 LE
//! endian  1     1 = little-endian host, 0 = big-endian host
//! stdflt  1     bool, only for format >= 6.27
//! ```

use bam_datagram::Datagram;

use crate::WriterConfig;

/// Magic marker at the very start of a BAM file.
pub const MAGIC: [u8; 6] = *b"pbj\0\n\r";

/// Byte-order descriptor of the host: `1` for little-endian, `0` for big.
///
/// Descriptive only; every value in the stream is little-endian.
pub const fn host_endian() -> u8 {
    if cfg!(target_endian = "little") {
        1
    } else {
        0
    }
}

/// Append the header fields for `config` to `dg`.
pub fn write_header(dg: &mut Datagram, config: &WriterConfig) {
    dg.write_u16_le(config.version.major);
    dg.write_u16_le(config.version.minor);
    dg.write_u8(host_endian());
    if config.version.has_stdfloat_flag() {
        dg.write_bool(config.stdfloat_double);
    }
}
