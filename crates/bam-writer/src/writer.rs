// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stream owner: header, segments and the flush loop.

use std::io::Write;

use bam_datagram::Datagram;
use tracing::{debug, instrument, trace, warn};

use crate::header::{write_header, MAGIC};
use crate::{AsObjectRef, BamError, BocOpcode, Manager, ObjectRef, WriterConfig};

/// major, minor, endian, stdfloat flag
const HEADER_CAPACITY: usize = 6;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum WriterState {
    Idle,
    Poisoned,
}

/// Writes object graphs to a BAM stream.
///
/// The sink is opened by the caller and handed over in [`open`](Self::open);
/// the writer owns it until [`into_inner`](Self::into_inner) or
/// [`close`](Self::close). Each [`write_objects`](Self::write_objects) call
/// appends one segment: `push`, `adjunct`*, `pop`.
///
/// Ids, type indices and the width flags are per writer, so independent
/// writers never share numbering.
pub struct BamWriter<W: Write> {
    target: W,
    manager: Manager,
    state: WriterState,
}

impl<W: Write> BamWriter<W> {
    /// Start a file stream: magic marker, then the header.
    pub fn open(target: W, config: WriterConfig) -> Result<Self, BamError> {
        Self::start(target, config, true)
    }

    /// Start a connection stream: header only, no magic marker.
    pub fn open_stream(target: W, config: WriterConfig) -> Result<Self, BamError> {
        Self::start(target, config, false)
    }

    fn start(mut target: W, config: WriterConfig, with_magic: bool) -> Result<Self, BamError> {
        config.validate()?;
        if with_magic {
            target.write_all(&MAGIC)?;
        }
        let mut header = Datagram::with_capacity(config.stdfloat_double, HEADER_CAPACITY);
        write_header(&mut header, &config);
        target.write_all(&header.to_framed()?)?;
        debug!(version = %config.version, stdfloat_double = config.stdfloat_double, "stream opened");
        Ok(Self {
            target,
            manager: Manager::new(config),
            state: WriterState::Idle,
        })
    }

    /// Configuration the stream was opened with.
    pub fn config(&self) -> &WriterConfig {
        self.manager.config()
    }

    /// Read-only view of ids, types and width state.
    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    /// Returns `true` once `object` has an id in this stream.
    pub fn has_object<P: AsObjectRef + ?Sized>(&self, object: &P) -> bool {
        self.manager.has_object(object)
    }

    /// Whether an earlier write failed and the stream is unusable.
    pub fn is_poisoned(&self) -> bool {
        self.state == WriterState::Poisoned
    }

    /// Write one root object and everything it references.
    pub fn write_object<P: AsObjectRef + ?Sized>(&mut self, root: &P) -> Result<(), BamError> {
        self.write_objects(&[root.to_object_ref()])
    }

    /// Write the given roots and everything they reference as one segment.
    ///
    /// Every root is queued even if it was written before, so a modified
    /// root gets a fresh body and an unmodified one a back-reference record.
    /// An empty slice writes nothing.
    ///
    /// On error the segment is left truncated and the writer is poisoned.
    /// The writer counts as poisoned for the whole segment and only returns to
    /// idle once it completes, so a panic unwinding out of an object's
    /// `write_datagram` leaves it poisoned too. Nested writes cannot happen:
    /// objects only ever see `&mut Manager`, never the writer.
    #[instrument(skip_all, fields(roots = roots.len()))]
    pub fn write_objects(&mut self, roots: &[ObjectRef]) -> Result<(), BamError> {
        if self.state == WriterState::Poisoned {
            return Err(BamError::Poisoned);
        }
        if roots.is_empty() {
            return Ok(());
        }
        self.state = WriterState::Poisoned;
        match self.write_segment(roots) {
            Ok(records) => {
                self.state = WriterState::Idle;
                debug!(
                    records,
                    objects = self.manager.object_count(),
                    types = self.manager.type_count(),
                    "segment written"
                );
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "write failed; stream poisoned");
                self.manager.clear_queue();
                Err(err)
            }
        }
    }

    fn write_segment(&mut self, roots: &[ObjectRef]) -> Result<usize, BamError> {
        for root in roots {
            self.manager.enqueue_root(root.clone())?;
        }
        let records = self.flush_queue()?;
        if self.manager.file_version().has_boc_opcodes() {
            let mut dg = Datagram::with_capacity(self.manager.stdfloat_double(), 1);
            dg.write_u8(BocOpcode::Pop.into());
            self.target.write_all(&dg.to_framed()?)?;
        }
        self.target.flush()?;
        Ok(records)
    }

    /// Drain the queue. Objects may queue more objects while being written,
    /// so this runs until the queue is empty rather than a fixed count.
    fn flush_queue(&mut self) -> Result<usize, BamError> {
        let tagged = self.manager.file_version().has_boc_opcodes();
        let mut opcode = BocOpcode::Push;
        let mut records = 0;
        while let Some((object, id)) = self.manager.pop_queued()? {
            let mut dg = self.manager.new_datagram();
            if tagged {
                dg.write_u8(opcode.into());
                opcode = BocOpcode::Adjunct;
            }
            self.manager.write_queued(&object, id, &mut dg)?;
            trace!(
                id,
                ty = object.type_handle().name(),
                len = dg.len(),
                pending = self.manager.queue_len(),
                "record"
            );
            self.target.write_all(&dg.to_framed()?)?;
            records += 1;
        }
        Ok(records)
    }

    /// The sink.
    pub fn get_ref(&self) -> &W {
        &self.target
    }

    /// Flush and hand the sink back to the caller.
    pub fn into_inner(mut self) -> Result<W, BamError> {
        self.target.flush()?;
        Ok(self.target)
    }

    /// Flush and drop the sink.
    pub fn close(self) -> Result<(), BamError> {
        self.into_inner().map(drop)
    }
}

impl<W: Write> std::fmt::Debug for BamWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BamWriter")
            .field("manager", &self.manager)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
