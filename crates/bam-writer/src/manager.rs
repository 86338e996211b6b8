// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph state shared with objects while they serialize themselves.

use std::collections::VecDeque;
use std::rc::Rc;

use bam_datagram::Datagram;
use tracing::{debug, info};

use crate::registry::{IdWidth, ObjectRegistry, PtaRegistry, TypeRegistry, NARROW_ID_MAX};
use crate::{
    AsObjectRef, BamError, FormatVersion, InternalName, ObjectRef, Pta, TypeHandle, WriterConfig,
};

/// Id assignment, type registration and the pending-object queue.
///
/// Objects receive `&mut Manager` in
/// [`TypedWritable::write_datagram`](crate::TypedWritable::write_datagram) and
/// use it to encode references: [`write_pointer`](Self::write_pointer),
/// [`write_pta`](Self::write_pta), [`write_internal_name`](Self::write_internal_name)
/// and [`write_handle`](Self::write_handle). Referencing an unseen object
/// assigns its id immediately and queues it; the body is written later by the
/// flush loop, which is what makes cycles terminate.
pub struct Manager {
    config: WriterConfig,
    objects: ObjectRegistry,
    ptas: PtaRegistry,
    types: TypeRegistry,
    object_width: IdWidth,
    pta_width: IdWidth,
    queue: VecDeque<(ObjectRef, Option<u32>)>,
}

impl Manager {
    pub(crate) fn new(config: WriterConfig) -> Self {
        Self {
            config,
            objects: ObjectRegistry::new(),
            ptas: PtaRegistry::new(),
            types: TypeRegistry::new(),
            object_width: IdWidth::default(),
            pta_width: IdWidth::default(),
            queue: VecDeque::new(),
        }
    }

    /// Configuration the stream was opened with.
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Active format version, for version-gated field layouts.
    pub fn file_version(&self) -> FormatVersion {
        self.config.version
    }

    /// Whether standard floats are 64-bit in this stream.
    pub fn stdfloat_double(&self) -> bool {
        self.config.stdfloat_double
    }

    /// A fresh datagram using this stream's standard-float width.
    pub fn new_datagram(&self) -> Datagram {
        Datagram::new(self.config.stdfloat_double)
    }

    /// Returns `true` once `object` has been written or queued for writing.
    pub fn has_object<P: AsObjectRef + ?Sized>(&self, object: &P) -> bool {
        self.objects.get(&object.to_object_ref()).is_some()
    }

    /// Whether object ids are now encoded as u32.
    pub fn object_ids_wide(&self) -> bool {
        self.object_width.is_wide()
    }

    /// Whether PTA ids are now encoded as u32.
    pub fn pta_ids_wide(&self) -> bool {
        self.pta_width.is_wide()
    }

    /// Number of object ids assigned so far (interned names included).
    pub fn object_count(&self) -> u32 {
        self.objects.assigned()
    }

    /// Number of PTA ids assigned so far.
    pub fn pta_count(&self) -> u32 {
        self.ptas.assigned()
    }

    /// Number of distinct types described so far.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Encode a pointer to `target`, or id 0 for `None`.
    ///
    /// An object seen for the first time gets the next id and is queued for
    /// a full write. A root still waiting in the queue for its id gets the id
    /// here but is not queued a second time.
    pub fn write_pointer<P: AsObjectRef + ?Sized>(
        &mut self,
        dg: &mut Datagram,
        target: Option<&P>,
    ) -> Result<(), BamError> {
        let id = match target {
            None => 0,
            Some(target) => {
                let object = target.to_object_ref();
                match self.objects.get(&object) {
                    Some(id) => id,
                    None if self.objects.is_pending(&object) => self.objects.obtain(&object)?.0,
                    None => self.enqueue(object)?,
                }
            }
        };
        self.write_object_id(dg, id)
    }

    /// Encode a null pointer.
    pub fn write_null_pointer(&mut self, dg: &mut Datagram) -> Result<(), BamError> {
        self.write_object_id(dg, 0)
    }

    /// Encode a shared array.
    ///
    /// - `None`: id 0 followed by a u32 length of 0.
    /// - first sight: u32 element count, the elements, then the new id.
    /// - seen before: the id alone.
    pub fn write_pta(&mut self, dg: &mut Datagram, pta: Option<&Pta>) -> Result<(), BamError> {
        let Some(pta) = pta else {
            self.write_pta_id(dg, 0)?;
            dg.write_u32_le(0);
            return Ok(());
        };
        let (id, is_new) = self.ptas.obtain(pta)?;
        if is_new {
            let len = u32::try_from(pta.len())
                .map_err(|_| BamError::PtaTooLarge { len: pta.len() })?;
            dg.write_u32_le(len);
            pta.write_elements(dg);
        }
        self.write_pta_id(dg, id)
    }

    /// Encode a type index, or 0 for `None`.
    ///
    /// The first time a type appears its descriptor follows the index: the
    /// name, a u8 base count, then each base through this same method, so a
    /// reader learns the base chain before it needs the derived type.
    pub fn write_handle(
        &mut self,
        dg: &mut Datagram,
        handle: Option<&'static TypeHandle>,
    ) -> Result<(), BamError> {
        let Some(handle) = handle else {
            dg.write_u16_le(0);
            return Ok(());
        };
        let (index, is_new) = self.types.obtain(handle)?;
        dg.write_u16_le(index);
        if !is_new {
            return Ok(());
        }
        debug!(index, name = handle.name(), "registered type");
        dg.write_string(handle.name())?;
        let bases: Vec<&'static TypeHandle> = handle.written_bases().collect();
        let count = u8::try_from(bases.len()).map_err(|_| BamError::TooManyBases {
            name: handle.name(),
            count: bases.len(),
        })?;
        dg.write_u8(count);
        for base in bases {
            self.write_handle(dg, Some(base))?;
        }
        Ok(())
    }

    /// Encode a pointer to the interned name `text`.
    ///
    /// Names are deduplicated by value: every call with equal text yields the
    /// same id, and the text is written once, in the body of a queued
    /// [`InternalName`] object.
    pub fn write_internal_name(&mut self, dg: &mut Datagram, text: &str) -> Result<(), BamError> {
        let id = match self.objects.name(text) {
            Some(id) => id,
            None => {
                let object: ObjectRef = Rc::new(InternalName::new(text));
                let id = self.enqueue(object)?;
                self.objects.bind_name(text, id);
                id
            }
        };
        self.write_object_id(dg, id)
    }

    /// Obtain-or-assign the id of `object` and append it to the queue.
    pub(crate) fn enqueue(&mut self, object: ObjectRef) -> Result<u32, BamError> {
        let (id, _) = self.objects.obtain(&object)?;
        self.queue.push_back((object, Some(id)));
        Ok(id)
    }

    /// Queue a root of a top-level write.
    ///
    /// Roots get their id up front while the counter is below `0xFFFF`. From
    /// there on a new root waits for its id until it is dequeued or pointed
    /// at, so no id above `0xFFFF` can be encoded before `0xFFFF` itself.
    pub(crate) fn enqueue_root(&mut self, object: ObjectRef) -> Result<(), BamError> {
        if self.objects.get(&object).is_some() || self.objects.next_id() < NARROW_ID_MAX {
            self.enqueue(object)?;
        } else {
            self.objects.defer(&object);
            self.queue.push_back((object, None));
        }
        Ok(())
    }

    pub(crate) fn pop_queued(&mut self) -> Result<Option<(ObjectRef, u32)>, BamError> {
        let Some((object, id)) = self.queue.pop_front() else {
            return Ok(None);
        };
        let id = match id {
            Some(id) => id,
            None => {
                self.objects.settle(&object);
                self.objects.obtain(&object)?.0
            }
        };
        Ok(Some((object, id)))
    }

    pub(crate) fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn clear_queue(&mut self) {
        self.queue.clear();
        self.objects.clear_pending();
    }

    /// Append the record body for a queued object: a full description if it
    /// was never written or is modified, else type index 0 and the id.
    pub(crate) fn write_queued(
        &mut self,
        object: &ObjectRef,
        id: u32,
        dg: &mut Datagram,
    ) -> Result<(), BamError> {
        if !self.objects.is_written(id) || object.is_modified() {
            self.write_handle(dg, Some(object.type_handle()))?;
            self.write_object_id(dg, id)?;
            object.write_datagram(self, dg)?;
            self.objects.mark_written(id);
            object.clear_modified();
        } else {
            self.write_handle(dg, None)?;
            self.write_object_id(dg, id)?;
        }
        Ok(())
    }

    fn write_object_id(&mut self, dg: &mut Datagram, id: u32) -> Result<(), BamError> {
        if self.object_width.write(dg, id)? {
            info!(id, "object ids escalated to 32-bit");
        }
        Ok(())
    }

    fn write_pta_id(&mut self, dg: &mut Datagram, id: u32) -> Result<(), BamError> {
        if self.pta_width.write(dg, id)? {
            info!(id, "pta ids escalated to 32-bit");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("config", &self.config)
            .field("objects", &self.objects.assigned())
            .field("ptas", &self.ptas.assigned())
            .field("types", &self.types.len())
            .field("object_width", &self.object_width)
            .field("pta_width", &self.pta_width)
            .field("queued", &self.queue.len())
            .finish()
    }
}
