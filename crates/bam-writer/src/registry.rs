// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identity registries: object ids, PTA ids, type indices.
//!
//! Every counter starts at 1; 0 is the null/sentinel value of its kind.
//! Registries hold [`Weak`] references only. A weak reference keeps the
//! allocation (not the value) alive, so an address in a registry can never be
//! reused by a different object while the writer exists.

use std::rc::{Rc, Weak};

use bam_datagram::Datagram;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{BamError, ObjectRef, Pta, PtaData, TypeHandle, TypedWritable};

/// Largest id that is encoded in the narrow (u16) width.
pub const NARROW_ID_MAX: u32 = 0xFFFF;

/// One-way narrow→wide switch for one id kind.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct IdWidth {
    wide: bool,
}

impl IdWidth {
    /// Whether ids of this kind are now written as u32.
    pub fn is_wide(self) -> bool {
        self.wide
    }

    /// Encode `id` at the current width. Returns `true` if this call switched
    /// the kind to wide.
    ///
    /// Id `0xFFFF` is the last one written narrow; everything after it is
    /// wide. Readers switch on reading `0xFFFF`, so an id above it arriving
    /// while still narrow is rejected rather than written in a width the
    /// reader does not expect.
    pub fn write(&mut self, dg: &mut Datagram, id: u32) -> Result<bool, BamError> {
        if self.wide {
            dg.write_u32_le(id);
            return Ok(false);
        }
        let narrow = u16::try_from(id).map_err(|_| BamError::WideIdBeforeSwitch { id })?;
        dg.write_u16_le(narrow);
        self.wide = id == NARROW_ID_MAX;
        Ok(self.wide)
    }
}

fn next_id(counter: &mut u32, kind: &'static str) -> Result<u32, BamError> {
    let id = *counter;
    *counter = id
        .checked_add(1)
        .ok_or(BamError::IdSpaceExhausted { kind })?;
    Ok(id)
}

struct ObjectEntry {
    id: u32,
    _object: Weak<dyn TypedWritable>,
}

/// Object identity → object id, plus interned-name text → object id.
///
/// Roots queued once the counter has reached `0xFFFF` are held as pending
/// instead of receiving an id up front; see [`Self::defer`].
pub(crate) struct ObjectRegistry {
    by_identity: FxHashMap<*const (), ObjectEntry>,
    by_name: FxHashMap<String, u32>,
    written: FxHashSet<u32>,
    pending: FxHashSet<*const ()>,
    next_id: u32,
}

impl ObjectRegistry {
    pub(crate) fn new() -> Self {
        Self {
            by_identity: FxHashMap::default(),
            by_name: FxHashMap::default(),
            written: FxHashSet::default(),
            pending: FxHashSet::default(),
            next_id: 1,
        }
    }

    fn key(object: &ObjectRef) -> *const () {
        Rc::as_ptr(object).cast::<()>()
    }

    pub(crate) fn get(&self, object: &ObjectRef) -> Option<u32> {
        self.by_identity.get(&Self::key(object)).map(|e| e.id)
    }

    /// Look up or assign the id of `object`. The flag is `true` when the id
    /// was assigned by this call.
    pub(crate) fn obtain(&mut self, object: &ObjectRef) -> Result<(u32, bool), BamError> {
        if let Some(id) = self.get(object) {
            return Ok((id, false));
        }
        let id = next_id(&mut self.next_id, "object")?;
        self.by_identity.insert(
            Self::key(object),
            ObjectEntry {
                id,
                _object: Rc::downgrade(object),
            },
        );
        Ok((id, true))
    }

    /// The id the next new object would receive.
    pub(crate) fn next_id(&self) -> u32 {
        self.next_id
    }

    /// Record `object` as a queued root still waiting for its id.
    ///
    /// Its id is assigned when it is dequeued or first pointed at, whichever
    /// comes first, and is encoded right away in both cases. Together with
    /// pointers and names, which are also encoded on assignment, this keeps
    /// ids from `0xFFFF` upwards reaching the stream in ascending order.
    pub(crate) fn defer(&mut self, object: &ObjectRef) {
        self.pending.insert(Self::key(object));
    }

    /// Whether `object` is a deferred root that has not been dequeued yet.
    pub(crate) fn is_pending(&self, object: &ObjectRef) -> bool {
        self.pending.contains(&Self::key(object))
    }

    /// Drop the pending mark of a dequeued root.
    pub(crate) fn settle(&mut self, object: &ObjectRef) {
        self.pending.remove(&Self::key(object));
    }

    /// Forget every pending mark, for a queue that is being discarded.
    pub(crate) fn clear_pending(&mut self) {
        self.pending.clear();
    }

    pub(crate) fn name(&self, text: &str) -> Option<u32> {
        self.by_name.get(text).copied()
    }

    pub(crate) fn bind_name(&mut self, text: &str, id: u32) {
        self.by_name.insert(text.to_owned(), id);
    }

    pub(crate) fn is_written(&self, id: u32) -> bool {
        self.written.contains(&id)
    }

    pub(crate) fn mark_written(&mut self, id: u32) {
        self.written.insert(id);
    }

    pub(crate) fn assigned(&self) -> u32 {
        self.next_id - 1
    }
}

/// PTA identity → PTA id.
pub(crate) struct PtaRegistry {
    by_identity: FxHashMap<*const PtaData, (u32, Weak<PtaData>)>,
    next_id: u32,
}

impl PtaRegistry {
    pub(crate) fn new() -> Self {
        Self {
            by_identity: FxHashMap::default(),
            next_id: 1,
        }
    }

    /// Look up or assign the id of `pta`; `true` when newly assigned.
    pub(crate) fn obtain(&mut self, pta: &Pta) -> Result<(u32, bool), BamError> {
        let key = Rc::as_ptr(pta);
        if let Some((id, _)) = self.by_identity.get(&key) {
            return Ok((*id, false));
        }
        let id = next_id(&mut self.next_id, "pta")?;
        self.by_identity.insert(key, (id, Rc::downgrade(pta)));
        Ok((id, true))
    }

    pub(crate) fn assigned(&self) -> u32 {
        self.next_id - 1
    }
}

/// Type handle → type index.
pub(crate) struct TypeRegistry {
    indices: FxHashMap<*const TypeHandle, u16>,
    next_index: u16,
}

impl TypeRegistry {
    pub(crate) fn new() -> Self {
        Self {
            indices: FxHashMap::default(),
            next_index: 1,
        }
    }

    /// Look up or assign the index of `handle`; `true` when newly assigned,
    /// which is also the one time its descriptor must be written.
    pub(crate) fn obtain(&mut self, handle: &'static TypeHandle) -> Result<(u16, bool), BamError> {
        let key: *const TypeHandle = handle;
        if let Some(index) = self.indices.get(&key) {
            return Ok((*index, false));
        }
        let index = self.next_index;
        if index == 0 {
            return Err(BamError::TypeIndexOverflow { max: u16::MAX });
        }
        // Wraps to 0 after u16::MAX, which the check above then rejects.
        self.next_index = index.wrapping_add(1);
        self.indices.insert(key, index);
        Ok((index, true))
    }

    pub(crate) fn len(&self) -> usize {
        self.indices.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{InternalName, TYPED_WRITABLE};

    #[test]
    fn width_flips_after_narrow_max() {
        let mut width = IdWidth::default();
        let mut dg = Datagram::default();
        assert!(!width.write(&mut dg, 0xFFFE).unwrap());
        assert!(width.write(&mut dg, 0xFFFF).unwrap());
        assert!(!width.write(&mut dg, 0x1_0000).unwrap());
        assert!(!width.write(&mut dg, 3).unwrap());
        assert_eq!(
            hex::encode(dg.as_bytes()),
            "feffffff0000010003000000"
        );
    }

    #[test]
    fn wide_id_before_the_switch_is_rejected() {
        let mut width = IdWidth::default();
        let mut dg = Datagram::default();
        assert!(matches!(
            width.write(&mut dg, 0x1_0001),
            Err(BamError::WideIdBeforeSwitch { id: 0x1_0001 })
        ));
        assert!(!width.is_wide());
        assert!(dg.is_empty());
    }

    #[test]
    fn deferred_roots_stay_unassigned_until_obtained() {
        let mut reg = ObjectRegistry::new();
        let a: ObjectRef = Rc::new(InternalName::new("a"));
        reg.defer(&a);
        assert!(reg.is_pending(&a));
        assert_eq!(reg.get(&a), None);
        assert_eq!(reg.next_id(), 1);
        assert_eq!(reg.obtain(&a).unwrap(), (1, true));
        reg.settle(&a);
        assert!(!reg.is_pending(&a));
    }

    #[test]
    fn object_ids_are_dense_and_identity_keyed() {
        let mut reg = ObjectRegistry::new();
        let a: ObjectRef = Rc::new(InternalName::new("x"));
        let b: ObjectRef = Rc::new(InternalName::new("x"));
        assert_eq!(reg.obtain(&a).unwrap(), (1, true));
        assert_eq!(reg.obtain(&b).unwrap(), (2, true));
        assert_eq!(reg.obtain(&Rc::clone(&a)).unwrap(), (1, false));
        assert_eq!(reg.assigned(), 2);
    }

    #[test]
    fn registry_does_not_keep_objects_alive() {
        let mut reg = ObjectRegistry::new();
        let a: ObjectRef = Rc::new(InternalName::new("x"));
        reg.obtain(&a).unwrap();
        assert_eq!(Rc::strong_count(&a), 1);
        assert_eq!(Rc::weak_count(&a), 1);
    }

    #[test]
    fn pta_ids_ignore_content() {
        let mut reg = PtaRegistry::new();
        let a: Pta = Rc::new(PtaData::from(vec![1u8, 2, 3]));
        let b: Pta = Rc::new(PtaData::from(vec![1u8, 2, 3]));
        assert_eq!(reg.obtain(&a).unwrap(), (1, true));
        assert_eq!(reg.obtain(&b).unwrap(), (2, true));
        assert_eq!(reg.obtain(&a).unwrap(), (1, false));
    }

    #[test]
    fn type_indices_start_at_one() {
        let mut reg = TypeRegistry::new();
        assert_eq!(reg.obtain(&TYPED_WRITABLE).unwrap(), (1, true));
        assert_eq!(reg.obtain(&TYPED_WRITABLE).unwrap(), (1, false));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn type_index_space_is_bounded() {
        let mut reg = TypeRegistry::new();
        reg.next_index = u16::MAX;
        assert_eq!(reg.obtain(&TYPED_WRITABLE).unwrap(), (u16::MAX, true));
        assert!(matches!(
            reg.obtain(&crate::TYPED_OBJECT),
            Err(BamError::TypeIndexOverflow { max: u16::MAX })
        ));
    }
}
