// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The capability interface objects implement to appear in a stream.

use std::cell::Cell;
use std::rc::Rc;

use bam_datagram::Datagram;

use crate::{BamError, Manager, TypeHandle, INTERNAL_NAME};

/// An object that can be written to a BAM stream.
///
/// Identity is the address of the object's `Rc` allocation: two `Rc`s to the
/// same allocation are the same object, two equal values in different
/// allocations are different objects.
pub trait TypedWritable {
    /// Runtime type written in the record's type descriptor.
    fn type_handle(&self) -> &'static TypeHandle;

    /// Append this object's fields to `dg`.
    ///
    /// References to other objects, shared arrays and interned names go
    /// through `manager`, which assigns ids and queues unseen objects.
    fn write_datagram(&self, manager: &mut Manager, dg: &mut Datagram) -> Result<(), BamError>;

    /// Whether the object changed since its last full write. A modified
    /// object is written with a full body again the next time it is queued.
    fn is_modified(&self) -> bool {
        false
    }

    /// Called by the writer right after a full write.
    fn clear_modified(&self) {}
}

/// Shared handle to a writable object.
pub type ObjectRef = Rc<dyn TypedWritable>;

/// Anything that can be viewed as an [`ObjectRef`].
///
/// Lets catalog types pass `&Rc<ConcreteType>` fields straight to
/// [`Manager::write_pointer`] without coercing first.
pub trait AsObjectRef {
    /// Clone out a type-erased handle to the same allocation.
    fn to_object_ref(&self) -> ObjectRef;
}

impl<T: TypedWritable + 'static> AsObjectRef for Rc<T> {
    fn to_object_ref(&self) -> ObjectRef {
        Rc::clone(self) as ObjectRef
    }
}

impl AsObjectRef for ObjectRef {
    fn to_object_ref(&self) -> ObjectRef {
        Rc::clone(self)
    }
}

/// Interior-mutable dirty flag for [`TypedWritable`] implementors.
#[derive(Debug, Default)]
pub struct ModifiedFlag(Cell<bool>);

impl ModifiedFlag {
    /// Create a flag in the given state.
    pub fn new(modified: bool) -> Self {
        Self(Cell::new(modified))
    }

    /// Current state.
    pub fn get(&self) -> bool {
        self.0.get()
    }

    /// Mark the owner as changed.
    pub fn mark(&self) {
        self.0.set(true);
    }

    /// Mark the owner as written.
    pub fn clear(&self) {
        self.0.set(false);
    }
}

/// Text promoted to a shared object by
/// [`Manager::write_internal_name`]. Its body is just the string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalName {
    name: String,
}

impl InternalName {
    /// Wrap a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The wrapped text.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TypedWritable for InternalName {
    fn type_handle(&self) -> &'static TypeHandle {
        &INTERNAL_NAME
    }

    fn write_datagram(&self, _manager: &mut Manager, dg: &mut Datagram) -> Result<(), BamError> {
        dg.write_string(&self.name)?;
        Ok(())
    }
}
