// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Writer configuration.

use serde::{Deserialize, Serialize};

use crate::{BamError, FormatVersion};

/// Stream-wide settings fixed when a [`BamWriter`](crate::BamWriter) is opened.
///
/// Stored as JSON when persisted; missing fields take their defaults:
///
/// ```
/// use bam_writer::{FormatVersion, WriterConfig};
///
/// let cfg = WriterConfig::from_json(br#"{ "stdfloat_double": true }"#).unwrap();
/// assert_eq!(cfg.version, FormatVersion::CURRENT);
/// assert!(cfg.stdfloat_double);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Format version written in the header and consulted for record framing.
    pub version: FormatVersion,
    /// Write standard floats as 64-bit instead of 32-bit.
    pub stdfloat_double: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            version: FormatVersion::CURRENT,
            stdfloat_double: false,
        }
    }
}

impl WriterConfig {
    /// Replace the format version.
    pub fn with_version(mut self, version: FormatVersion) -> Self {
        self.version = version;
        self
    }

    /// Select the standard-float width.
    pub fn with_stdfloat_double(mut self, stdfloat_double: bool) -> Self {
        self.stdfloat_double = stdfloat_double;
        self
    }

    /// Parse a config from JSON bytes. Empty input yields the defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, BamError> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Render the config as pretty JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, BamError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Reject combinations the header cannot describe.
    pub fn validate(&self) -> Result<(), BamError> {
        if self.stdfloat_double && !self.version.has_stdfloat_flag() {
            return Err(BamError::StdfloatUnsupported {
                version: self.version,
                min: FormatVersion::STDFLOAT_FLAG,
            });
        }
        Ok(())
    }
}
