// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fixture writable types.
//!
//! Bodies are deliberately simple so tests can predict every byte:
//!
//! - [`Empty`]: no body.
//! - [`Node`]: `name` string, then three u16-counted lists: child pointers,
//!   PTAs and interned tag names.
//! - [`Transform`]: a `vec3` of standard floats, plus a `u8` flags byte from
//!   format 6.30 onwards.

use std::cell::RefCell;
use std::rc::Rc;

use bam_writer::{
    AsObjectRef, BamError, Datagram, FormatVersion, Manager, ModifiedFlag, ObjectRef, Pta,
    TypeHandle, TypedWritable, TYPED_WRITABLE, TYPED_WRITABLE_REFERENCE_COUNT,
};

/// Scene-graph node base.
pub static PANDA_NODE: TypeHandle = TypeHandle {
    name: "PandaNode",
    bases: &[&TYPED_WRITABLE],
};

/// Node with model semantics.
pub static MODEL_NODE: TypeHandle = TypeHandle {
    name: "ModelNode",
    bases: &[&PANDA_NODE],
};

/// Root of a loaded model.
pub static MODEL_ROOT: TypeHandle = TypeHandle {
    name: "ModelRoot",
    bases: &[&MODEL_NODE],
};

/// Empty render state.
pub static RENDER_STATE: TypeHandle = TypeHandle {
    name: "RenderState",
    bases: &[&TYPED_WRITABLE],
};

/// Positional transform.
pub static TRANSFORM_STATE: TypeHandle = TypeHandle {
    name: "TransformState",
    bases: &[&TYPED_WRITABLE_REFERENCE_COUNT],
};

/// Version from which [`Transform`] appends its flags byte.
pub const TRANSFORM_FLAGS_VERSION: FormatVersion = FormatVersion::new(6, 30);

/// Writable with no fields.
#[derive(Debug)]
pub struct Empty {
    handle: &'static TypeHandle,
}

impl Empty {
    /// An empty object of type [`RENDER_STATE`].
    pub fn new() -> Rc<Self> {
        Self::with_type(&RENDER_STATE)
    }

    /// An empty object of any type.
    pub fn with_type(handle: &'static TypeHandle) -> Rc<Self> {
        Rc::new(Self { handle })
    }
}

impl TypedWritable for Empty {
    fn type_handle(&self) -> &'static TypeHandle {
        self.handle
    }

    fn write_datagram(&self, _manager: &mut Manager, _dg: &mut Datagram) -> Result<(), BamError> {
        Ok(())
    }
}

/// Graph node with children, shared arrays and interned tags.
///
/// Lists use `RefCell` so cycles can be closed after construction.
pub struct Node {
    handle: &'static TypeHandle,
    name: String,
    children: RefCell<Vec<Option<ObjectRef>>>,
    arrays: RefCell<Vec<Option<Pta>>>,
    tags: RefCell<Vec<String>>,
    modified: ModifiedFlag,
}

impl Node {
    /// A [`PANDA_NODE`] with the given name.
    pub fn new(name: &str) -> Rc<Self> {
        Self::with_type(&PANDA_NODE, name)
    }

    /// A node of any type.
    pub fn with_type(handle: &'static TypeHandle, name: &str) -> Rc<Self> {
        Rc::new(Self {
            handle,
            name: name.to_owned(),
            children: RefCell::new(Vec::new()),
            arrays: RefCell::new(Vec::new()),
            tags: RefCell::new(Vec::new()),
            modified: ModifiedFlag::default(),
        })
    }

    /// Node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a child pointer.
    pub fn add_child<P: AsObjectRef + ?Sized>(&self, child: &P) {
        self.children.borrow_mut().push(Some(child.to_object_ref()));
    }

    /// Append a null child pointer.
    pub fn add_null_child(&self) {
        self.children.borrow_mut().push(None);
    }

    /// Append a shared array reference (`None` for a null array).
    pub fn add_array(&self, pta: Option<&Pta>) {
        self.arrays.borrow_mut().push(pta.cloned());
    }

    /// Append an interned tag name.
    pub fn add_tag(&self, tag: &str) {
        self.tags.borrow_mut().push(tag.to_owned());
    }

    /// Mark the node as changed since its last write.
    pub fn mark_modified(&self) {
        self.modified.mark();
    }

    /// Drop every child pointer (breaks cycles so tests do not leak).
    pub fn clear_children(&self) {
        self.children.borrow_mut().clear();
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("type", &self.handle.name())
            .field("name", &self.name)
            .field("children", &self.children.borrow().len())
            .finish_non_exhaustive()
    }
}

fn list_len(len: usize) -> u16 {
    u16::try_from(len).unwrap_or(u16::MAX)
}

impl TypedWritable for Node {
    fn type_handle(&self) -> &'static TypeHandle {
        self.handle
    }

    fn write_datagram(&self, manager: &mut Manager, dg: &mut Datagram) -> Result<(), BamError> {
        dg.write_string(&self.name)?;

        let children = self.children.borrow().clone();
        dg.write_u16_le(list_len(children.len()));
        for child in &children {
            match child {
                Some(child) => manager.write_pointer(dg, Some(child))?,
                None => manager.write_null_pointer(dg)?,
            }
        }

        let arrays = self.arrays.borrow().clone();
        dg.write_u16_le(list_len(arrays.len()));
        for pta in &arrays {
            manager.write_pta(dg, pta.as_ref())?;
        }

        let tags = self.tags.borrow().clone();
        dg.write_u16_le(list_len(tags.len()));
        for tag in &tags {
            manager.write_internal_name(dg, tag)?;
        }
        Ok(())
    }

    fn is_modified(&self) -> bool {
        self.modified.get()
    }

    fn clear_modified(&self) {
        self.modified.clear();
    }
}

/// Transform with a position in standard floats.
#[derive(Debug)]
pub struct Transform {
    /// Position written as a `vec3`.
    pub pos: [f64; 3],
    /// Flags byte, written from [`TRANSFORM_FLAGS_VERSION`] onwards.
    pub flags: u8,
}

impl Transform {
    /// A transform at `pos` with no flags.
    pub fn at(pos: [f64; 3]) -> Rc<Self> {
        Rc::new(Self { pos, flags: 0 })
    }
}

impl TypedWritable for Transform {
    fn type_handle(&self) -> &'static TypeHandle {
        &TRANSFORM_STATE
    }

    fn write_datagram(&self, manager: &mut Manager, dg: &mut Datagram) -> Result<(), BamError> {
        dg.write_vec3(self.pos);
        if manager.file_version() >= TRANSFORM_FLAGS_VERSION {
            dg.write_u8(self.flags);
        }
        Ok(())
    }
}
