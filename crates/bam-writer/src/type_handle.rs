// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Runtime type descriptors.
//!
//! A [`TypeHandle`] is a `'static` record of a type's name and declared base
//! types. Its identity is its address, so each catalog type declares exactly
//! one `static` handle:
//!
//! ```
//! use bam_writer::{TypeHandle, TYPED_WRITABLE};
//!
//! static PANDA_NODE: TypeHandle = TypeHandle {
//!     name: "PandaNode",
//!     bases: &[&TYPED_WRITABLE],
//! };
//! static MODEL_NODE: TypeHandle = TypeHandle {
//!     name: "ModelNode",
//!     bases: &[&PANDA_NODE],
//! };
//!
//! assert_eq!(MODEL_NODE.bases()[0].name(), "PandaNode");
//! ```

use std::ptr;

/// Name and declared bases of a writable type.
#[derive(Debug)]
pub struct TypeHandle {
    /// Name written in the type descriptor.
    pub name: &'static str,
    /// Declared bases, in declaration order.
    pub bases: &'static [&'static TypeHandle],
}

impl TypeHandle {
    /// Declare a type handle. Static handles with a non-empty base list use
    /// the struct literal so the base slice lives for `'static`.
    pub const fn new(name: &'static str, bases: &'static [&'static TypeHandle]) -> Self {
        Self { name, bases }
    }

    /// Name written in the type descriptor.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared bases, in declaration order.
    pub fn bases(&self) -> &'static [&'static TypeHandle] {
        self.bases
    }

    /// Whether this is [`IMPLICIT_ROOT`].
    pub fn is_implicit_root(&self) -> bool {
        ptr::eq(self, &IMPLICIT_ROOT)
    }

    /// Bases that are written into the descriptor: every declared base except
    /// the implicit root.
    pub fn written_bases(&self) -> impl Iterator<Item = &'static TypeHandle> {
        self.bases.iter().copied().filter(|b| !b.is_implicit_root())
    }
}

/// Universal root every hierarchy may end in; never written as a base.
pub static IMPLICIT_ROOT: TypeHandle = TypeHandle::new("object", &[]);

/// Root of the writable hierarchy.
pub static TYPED_OBJECT: TypeHandle = TypeHandle {
    name: "TypedObject",
    bases: &[&IMPLICIT_ROOT],
};

/// Base of every object that can appear in a stream.
pub static TYPED_WRITABLE: TypeHandle = TypeHandle {
    name: "TypedWritable",
    bases: &[&TYPED_OBJECT],
};

/// Base of shared, reference-counted writables.
pub static TYPED_WRITABLE_REFERENCE_COUNT: TypeHandle = TypeHandle {
    name: "TypedWritableReferenceCount",
    bases: &[&TYPED_WRITABLE],
};

/// Type of interned names (see [`InternalName`](crate::InternalName)).
pub static INTERNAL_NAME: TypeHandle = TypeHandle {
    name: "InternalName",
    bases: &[&TYPED_WRITABLE_REFERENCE_COUNT],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implicit_root_is_filtered_from_written_bases() {
        assert_eq!(TYPED_OBJECT.bases().len(), 1);
        assert_eq!(TYPED_OBJECT.written_bases().count(), 0);
        let bases: Vec<_> = TYPED_WRITABLE.written_bases().map(TypeHandle::name).collect();
        assert_eq!(bases, ["TypedObject"]);
    }

    #[test]
    fn identity_is_by_address_not_name() {
        static LOOKALIKE: TypeHandle = TypeHandle::new("object", &[]);
        assert!(IMPLICIT_ROOT.is_implicit_root());
        assert!(!LOOKALIKE.is_implicit_root());
    }
}
