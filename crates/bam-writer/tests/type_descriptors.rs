// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Type descriptors and base-chain emission.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use bam_dry_tests::{
    object_records, write_graph, Descriptor, Empty, Node, MODEL_ROOT, RENDER_STATE,
    TRANSFORM_STATE,
};
use bam_writer::{BamWriter, ObjectRef, TypeHandle, WriterConfig, IMPLICIT_ROOT};

static MULTI: TypeHandle = TypeHandle {
    name: "Multi",
    bases: &[&RENDER_STATE, &IMPLICIT_ROOT, &TRANSFORM_STATE],
};

fn descriptor(index: u16, name: &str, bases: &[u16]) -> Descriptor {
    Descriptor {
        index,
        name: name.to_owned(),
        bases: bases.to_vec(),
    }
}

#[test]
fn base_chain_is_described_before_use() {
    let model = Node::with_type(&MODEL_ROOT, "m");
    let plain = Node::new("p");
    model.add_child(&plain);

    let bytes = write_graph(&[model as ObjectRef], WriterConfig::default()).unwrap();
    let records = object_records(&bytes).unwrap();

    assert_eq!(records[0].type_index, 1);
    assert_eq!(
        records[0].descriptors,
        vec![
            descriptor(1, "ModelRoot", &[2]),
            descriptor(2, "ModelNode", &[3]),
            descriptor(3, "PandaNode", &[4]),
            descriptor(4, "TypedWritable", &[5]),
            descriptor(5, "TypedObject", &[]),
        ]
    );

    // PandaNode was described as a base; its own instance reuses the index.
    assert_eq!(records[1].type_index, 3);
    assert!(records[1].descriptors.is_empty());
}

#[test]
fn multiple_bases_skip_the_implicit_root() {
    let mut writer = BamWriter::open(Vec::new(), WriterConfig::default()).unwrap();
    writer.write_object(&Empty::with_type(&MULTI)).unwrap();
    assert_eq!(writer.manager().type_count(), 6);

    let records = object_records(&writer.into_inner().unwrap()).unwrap();
    assert_eq!(
        records[0].descriptors,
        vec![
            descriptor(1, "Multi", &[2, 5]),
            descriptor(2, "RenderState", &[3]),
            descriptor(3, "TypedWritable", &[4]),
            descriptor(4, "TypedObject", &[]),
            descriptor(5, "TransformState", &[6]),
            descriptor(6, "TypedWritableReferenceCount", &[3]),
        ]
    );
}

#[test]
fn type_indices_persist_across_segments() {
    let mut writer = BamWriter::open(Vec::new(), WriterConfig::default()).unwrap();
    writer.write_object(&Empty::new()).unwrap();
    writer.write_object(&Empty::new()).unwrap();
    let records = object_records(&writer.into_inner().unwrap()).unwrap();
    assert_eq!(records[0].descriptors.len(), 3);
    assert_eq!(records[1].type_index, records[0].type_index);
    assert!(records[1].descriptors.is_empty());
}
