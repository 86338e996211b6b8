// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Worklist traversal: cycles, sharing and rewrite decisions.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::rc::Rc;

use bam_dry_tests::{object_records, write_graph, Empty, Node, Record};
use bam_writer::{BamWriter, ObjectRef, TypedWritable, WriterConfig};
use proptest::prelude::*;

fn full_ids(records: &[Record]) -> Vec<u32> {
    records
        .iter()
        .filter(|r| !r.is_back_reference())
        .map(|r| r.object_id)
        .collect()
}

#[test]
fn self_reference_terminates() {
    let a = Node::new("self");
    a.add_child(&a);
    let bytes = write_graph(&[a.clone() as ObjectRef], WriterConfig::default()).unwrap();
    a.clear_children();

    let records = object_records(&bytes).unwrap();
    assert_eq!(records.len(), 1);
    // "self" takes bytes 0..6, the child count 6..8, the only child 8..10
    assert_eq!(records[0].body[8..10], [1, 0]);
}

#[test]
fn mutual_reference_writes_each_side_once() {
    let a = Node::new("a");
    let b = Node::new("b");
    a.add_child(&b);
    b.add_child(&a);
    let bytes = write_graph(&[a.clone() as ObjectRef], WriterConfig::default()).unwrap();
    a.clear_children();
    b.clear_children();

    let records = object_records(&bytes).unwrap();
    assert_eq!(full_ids(&records), vec![1, 2]);
    assert_eq!(records[1].body[5..7], [1, 0]);
}

#[test]
fn shared_leaf_is_written_once() {
    let root = Node::new("r");
    let left = Node::new("x");
    let right = Node::new("y");
    let leaf = Empty::new();
    root.add_child(&left);
    root.add_child(&right);
    left.add_child(&leaf);
    right.add_child(&leaf);

    let bytes = write_graph(&[root as ObjectRef], WriterConfig::default()).unwrap();
    let records = object_records(&bytes).unwrap();
    assert_eq!(full_ids(&records), vec![1, 2, 3, 4]);
    assert!(records.iter().all(|r| !r.is_back_reference()));
    // both parents point at id 4
    assert_eq!(records[1].body[5..7], [4, 0]);
    assert_eq!(records[2].body[5..7], [4, 0]);
}

#[test]
fn repeated_clean_root_becomes_back_reference() {
    let a = Node::new("a");
    let roots: [ObjectRef; 2] = [a.clone(), a];
    let bytes = write_graph(&roots, WriterConfig::default()).unwrap();
    let records = object_records(&bytes).unwrap();
    assert_eq!(records.len(), 2);
    assert!(!records[0].is_back_reference());
    assert!(records[1].is_back_reference());
    assert_eq!(records[1].object_id, 1);
    assert!(records[1].body.is_empty());
}

#[test]
fn modified_root_is_rewritten_in_a_later_segment() {
    let a = Node::new("a");
    let b = Empty::new();
    a.add_child(&b);
    let mut writer = BamWriter::open(Vec::new(), WriterConfig::default()).unwrap();

    writer.write_object(&a).unwrap();
    a.mark_modified();
    let twice: [ObjectRef; 2] = [a.clone(), a.clone()];
    writer.write_objects(&twice).unwrap();
    writer.write_object(&a).unwrap();

    let records = object_records(&writer.into_inner().unwrap()).unwrap();
    let shape: Vec<(u32, bool)> = records
        .iter()
        .map(|r| (r.object_id, r.is_back_reference()))
        .collect();
    assert_eq!(
        shape,
        vec![
            (1, false), // first segment: a
            (2, false), // first segment: b
            (1, false), // modified a, full body again
            (1, true),  // same segment, flag already cleared
            (1, true),  // clean root in a later segment
        ]
    );
    // The rewrite keeps the known type and the already-written child.
    assert!(records[2].descriptors.is_empty());
    assert_eq!(records[2].body[5..7], [2, 0]);
    assert!(!a.is_modified());
}

#[test]
fn writers_keep_separate_id_spaces() {
    let shared = Empty::new();
    let mut first = BamWriter::open(Vec::new(), WriterConfig::default()).unwrap();
    let mut second = BamWriter::open(Vec::new(), WriterConfig::default()).unwrap();
    first.write_object(&Empty::new()).unwrap();
    first.write_object(&shared).unwrap();
    second.write_object(&shared).unwrap();

    assert!(first.has_object(&shared));
    assert_eq!(first.manager().object_count(), 2);
    assert_eq!(second.manager().object_count(), 1);
    let records = object_records(&second.into_inner().unwrap()).unwrap();
    assert_eq!(records[0].object_id, 1);
}

/// Nodes reachable from node 0, in breadth-first discovery order.
fn reachable(edges: &[Vec<usize>]) -> Vec<usize> {
    let mut seen = vec![false; edges.len()];
    let mut order = Vec::new();
    let mut queue = VecDeque::from([0]);
    seen[0] = true;
    while let Some(n) = queue.pop_front() {
        order.push(n);
        for &m in &edges[n] {
            if !seen[m] {
                seen[m] = true;
                queue.push_back(m);
            }
        }
    }
    order
}

fn graph() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..24).prop_flat_map(|n| prop::collection::vec(prop::collection::vec(0..n, 0..4), n))
}

proptest! {
    #[test]
    fn every_reachable_object_gets_one_full_record(edges in graph()) {
        let nodes: Vec<Rc<Node>> = (0..edges.len())
            .map(|i| Node::new(&format!("n{i}")))
            .collect();
        for (from, targets) in edges.iter().enumerate() {
            for &to in targets {
                nodes[from].add_child(&nodes[to]);
            }
        }

        let bytes = write_graph(&[nodes[0].clone() as ObjectRef], WriterConfig::default());
        for node in &nodes {
            node.clear_children();
        }
        let records = object_records(&bytes.unwrap()).unwrap();

        let expected = reachable(&edges);
        prop_assert_eq!(records.len(), expected.len());
        // FIFO order means ids come out dense and ascending.
        let ids: Vec<u32> = records.iter().map(|r| r.object_id).collect();
        let dense: Vec<u32> = (1..=u32::try_from(expected.len()).unwrap()).collect();
        prop_assert_eq!(ids, dense);
        for (record, &node) in records.iter().zip(&expected) {
            let name = format!("n{node}");
            prop_assert_eq!(&record.body[2..2 + name.len()], name.as_bytes());
        }
    }
}
