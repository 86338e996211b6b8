// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared arrays and interned names.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::rc::Rc;

use bam_dry_tests::{object_records, write_graph, Node};
use bam_writer::{BamWriter, Datagram, ObjectRef, Pta, PtaData, WriterConfig};

fn pta(values: Vec<u16>) -> Pta {
    Rc::new(PtaData::from(values))
}

#[test]
fn arrays_dedupe_by_identity_not_content() {
    let shared = pta(vec![1, 2, 3]);
    let lookalike = pta(vec![1, 2, 3]);
    let node = Node::new("p");
    node.add_array(Some(&shared));
    node.add_array(Some(&shared));
    node.add_array(None);
    node.add_array(Some(&lookalike));

    let bytes = write_graph(&[node as ObjectRef], WriterConfig::default()).unwrap();
    let records = object_records(&bytes).unwrap();
    let body = hex::encode(&records[0].body);
    let expected = [
        "010070",   // name "p"
        "0000",     // no children
        "0400",     // four arrays
        "03000000", // new array: count, elements, id 1
        "010002000300",
        "0100",
        "0100",     // same array again
        "0000",     // null array: id 0, length 0
        "00000000",
        "03000000", // equal content, new id 2
        "010002000300",
        "0200",
        "0000",     // no tags
    ]
    .concat();
    assert_eq!(body, expected);
}

#[test]
fn array_ids_survive_across_segments() {
    let shared = pta(vec![7]);
    let first = Node::new("a");
    first.add_array(Some(&shared));
    let second = Node::new("b");
    second.add_array(Some(&shared));

    let mut writer = BamWriter::open(Vec::new(), WriterConfig::default()).unwrap();
    writer.write_object(&first).unwrap();
    writer.write_object(&second).unwrap();
    assert_eq!(writer.manager().pta_count(), 1);

    let records = object_records(&writer.into_inner().unwrap()).unwrap();
    assert_eq!(hex::encode(&records[1].body), "0100620000010001000000");
}

#[test]
fn element_types_are_little_endian() {
    let node = Node::new("f");
    node.add_array(Some(&Rc::new(PtaData::from(vec![1.5f32]))));
    node.add_array(Some(&Rc::new(PtaData::from(vec![-2i32]))));
    let bytes = write_graph(&[node as ObjectRef], WriterConfig::default()).unwrap();
    let body = &object_records(&bytes).unwrap()[0].body;
    // name (3), children (2), array count (2)
    assert_eq!(body[7..11], [1, 0, 0, 0]);
    assert_eq!(body[11..15], 1.5f32.to_le_bytes());
    assert_eq!(body[17..21], [1, 0, 0, 0]);
    assert_eq!(body[21..25], (-2i32).to_le_bytes());
}

#[test]
fn names_dedupe_by_value() {
    let a = Node::new("a");
    let b = Node::new("b");
    a.add_child(&b);
    a.add_tag("x");
    a.add_tag("y");
    a.add_tag("x");
    b.add_tag("y");

    let bytes = write_graph(&[a as ObjectRef], WriterConfig::default()).unwrap();
    let records = object_records(&bytes).unwrap();
    assert_eq!(records.len(), 4);

    assert_eq!(
        hex::encode(&records[0].body),
        ["010061", "01000200", "0000", "0300", "0300", "0400", "0300"].concat()
    );
    assert_eq!(
        hex::encode(&records[1].body),
        ["010062", "0000", "0000", "0100", "0400"].concat()
    );

    let x = &records[2];
    assert_eq!(x.object_id, 3);
    assert_eq!(x.body, b"\x01\x00x");
    let names: Vec<&str> = x.descriptors.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["InternalName", "TypedWritableReferenceCount"]);
    assert_eq!(x.descriptors[1].bases, vec![2]);

    let y = &records[3];
    assert_eq!(y.object_id, 4);
    assert_eq!(y.type_index, x.type_index);
    assert!(y.descriptors.is_empty());
    assert_eq!(y.body, b"\x01\x00y");
}

#[test]
fn known_names_are_not_rewritten_in_later_segments() {
    let first = Node::new("a");
    first.add_tag("shared");
    let second = Node::new("b");
    second.add_tag("shared");

    let mut writer = BamWriter::open(Vec::new(), WriterConfig::default()).unwrap();
    writer.write_object(&first).unwrap();
    writer.write_object(&second).unwrap();
    let records = object_records(&writer.into_inner().unwrap()).unwrap();

    let ids: Vec<u32> = records.iter().map(|r| r.object_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    // "b" points at the name written in the first segment
    assert_eq!(records[2].body[9..11], [2, 0]);
}

#[test]
fn array_bodies_scale_with_element_width() {
    let arrays: [Pta; 4] = [
        Rc::new(PtaData::from(vec![1u8, 2, 3])),
        Rc::new(PtaData::from(vec![-1i16, 2])),
        Rc::new(PtaData::from(vec![0.5f32])),
        Rc::new(PtaData::from(vec![0.25f64, 4.0])),
    ];
    for array in &arrays {
        let node = Node::new("w");
        node.add_array(Some(array));
        let bytes = write_graph(&[node as ObjectRef], WriterConfig::default()).unwrap();
        let body = &object_records(&bytes).unwrap()[0].body;
        // name, children, count, then u32 length, elements, id, then tags
        let elements = array.len() * array.element_size();
        assert_eq!(body.len(), 3 + 2 + 2 + 4 + elements + 2 + 2);
        let mut dg = Datagram::new(false);
        array.write_elements(&mut dg);
        assert_eq!(&body[11..11 + elements], &dg.into_vec()[..]);
    }
}
