use proptest::prelude::*;

use super::*;

const THREE_NODES: &str = "\
# three node chain
1 1 0.0 0.0 0.0 2.0 -1
2 3 5.0 0.0 0.0 1.0 1
3 3 5.0 5.0 0.0 0.5 2
";

fn ids<'a>(visits: impl Iterator<Item = Visit<'a>>) -> Vec<i64> {
  visits.map(|visit| visit.node.id).collect()
}

#[test]
fn test_parse_three_node_chain() {
  let tree = MorphologyTree::parse(THREE_NODES).unwrap();

  assert_eq!(tree.len(), 3);
  assert_eq!(tree.root().id, 1);
  assert_eq!(tree.root().radius, 2.0);

  let child = tree.get(2).unwrap();
  assert_eq!(child.position, Vec3::new(5.0, 0.0, 0.0));
  assert_eq!(child.type_id, 3);
  assert_eq!(tree.parent_of(child).map(|node| node.id), Some(1));
  assert!(tree.parent_of(tree.root()).is_none());
}

#[test]
fn test_comments_and_blank_lines_skipped() {
  let text = "# header\n\n   \n  # indented comment\n1 1 0 0 0 1 -1\n\n";
  let tree = MorphologyTree::parse(text).unwrap();
  assert_eq!(tree.len(), 1);
}

#[test]
fn test_six_fields_is_malformed_and_names_line() {
  let text = "1 1 0 0 0 1 -1\n2 1 1 0 0 1\n";
  let err = MorphologyTree::parse(text).unwrap_err();

  match err {
    ParseError::MalformedRecord { line, content, .. } => {
      assert_eq!(line, 2);
      assert_eq!(content, "2 1 1 0 0 1");
    }
    other => panic!("expected MalformedRecord, got {other:?}"),
  }
  assert!(MorphologyTree::parse(text)
    .unwrap_err()
    .to_string()
    .contains("2 1 1 0 0 1"));
}

#[test]
fn test_eight_fields_is_malformed() {
  let err = MorphologyTree::parse("1 1 0 0 0 1 -1 9\n").unwrap_err();
  assert!(matches!(err, ParseError::MalformedRecord { line: 1, .. }));
}

#[test]
fn test_non_numeric_field_is_malformed() {
  let err = MorphologyTree::parse("1 1 0 zero 0 1 -1\n").unwrap_err();
  assert!(matches!(err, ParseError::MalformedRecord { .. }));
}

#[test]
fn test_non_finite_values_are_malformed() {
  let cases = [
    ("1 1 nan 0 0 1 -1\n2 1 1 0 0 1 1\n", 1, "x"),
    ("1 1 0 0 0 1 -1\n2 1 1 inf 0 1 1\n", 2, "y"),
    ("1 1 0 0 0 1 -1\n2 1 1 0 -infinity 1 1\n", 2, "z"),
    ("1 1 0 0 0 NaN -1\n", 1, "radius"),
  ];
  for (text, expected_line, field) in cases {
    match MorphologyTree::parse(text).unwrap_err() {
      ParseError::MalformedRecord { line, reason, .. } => {
        assert_eq!(line, expected_line, "{text:?}");
        assert!(reason.starts_with(field), "{reason}");
        assert!(reason.contains("not a finite number"), "{reason}");
      }
      other => panic!("expected MalformedRecord, got {other:?}"),
    }
  }
}

#[test]
fn test_zero_and_negative_radius_accepted() {
  let tree = MorphologyTree::parse("1 1 0 0 0 0 -1\n2 1 1 0 0 -0.5 1\n").unwrap();
  assert_eq!(tree.root().radius, 0.0);
  assert_eq!(tree.get(2).unwrap().radius, -0.5);
}

#[test]
fn test_duplicate_id_is_invalid_topology() {
  let text = "1 1 0 0 0 1 -1\n2 1 1 0 0 1 1\n2 1 2 0 0 1 1\n";
  let err = MorphologyTree::parse(text).unwrap_err();
  assert_eq!(
    err,
    ParseError::InvalidTopology(TopologyError::DuplicateId(2))
  );
}

#[test]
fn test_multiple_roots_is_invalid_topology() {
  let text = "1 1 0 0 0 1 -1\n2 1 1 0 0 1 -1\n";
  let err = MorphologyTree::parse(text).unwrap_err();
  assert_eq!(
    err,
    ParseError::InvalidTopology(TopologyError::MultipleRoots(vec![1, 2]))
  );
}

#[test]
fn test_no_root_is_invalid_topology() {
  // 1 -> 2 -> 1: every parent resolves
  let text = "1 1 0 0 0 1 2\n2 1 1 0 0 1 1\n";
  let err = MorphologyTree::parse(text).unwrap_err();
  assert_eq!(err, ParseError::InvalidTopology(TopologyError::NoRoot));
}

#[test]
fn test_detached_cycle_is_invalid_topology() {
  // 1 is the root; 2 and 3 point at each other
  let text = "1 1 0 0 0 1 -1\n2 1 1 0 0 1 3\n3 1 2 0 0 1 2\n";
  let err = MorphologyTree::parse(text).unwrap_err();
  assert_eq!(
    err,
    ParseError::InvalidTopology(TopologyError::Unreachable(vec![2, 3]))
  );
}

#[test]
fn test_self_parent_is_invalid_topology() {
  let text = "1 1 0 0 0 1 -1\n2 1 1 0 0 1 2\n";
  let err = MorphologyTree::parse(text).unwrap_err();
  assert!(matches!(
    err,
    ParseError::InvalidTopology(TopologyError::Unreachable(_))
  ));
}

#[test]
fn test_empty_trace_is_invalid_topology() {
  let err = MorphologyTree::parse("# nothing\n").unwrap_err();
  assert_eq!(err, ParseError::InvalidTopology(TopologyError::Empty));
}

#[test]
fn test_root_need_not_be_first_record() {
  let text = "2 1 1 0 0 1 1\n1 1 0 0 0 1 -1\n";
  let tree = MorphologyTree::parse(text).unwrap();
  assert_eq!(tree.root().id, 1);
  assert_eq!(ids(tree.preorder()), vec![1, 2]);
}

#[test]
fn test_children_in_record_order() {
  let text = "1 1 0 0 0 1 -1\n5 1 1 0 0 1 1\n3 1 2 0 0 1 1\n4 1 3 0 0 1 1\n";
  let tree = MorphologyTree::parse(text).unwrap();
  let children: Vec<i64> = tree.children_of(tree.root()).map(|node| node.id).collect();
  assert_eq!(children, vec![5, 3, 4]);
}

#[test]
fn test_preorder_is_depth_first() {
  //        1
  //      /   \
  //     2     5
  //    / \
  //   3   4
  let text = "\
1 1 0 0 0 1 -1
2 1 1 0 0 1 1
5 1 0 1 0 1 1
3 1 2 0 0 1 2
4 1 2 1 0 1 2
";
  let tree = MorphologyTree::parse(text).unwrap();
  assert_eq!(ids(tree.preorder()), vec![1, 2, 3, 4, 5]);

  let parents: Vec<Option<i64>> = tree
    .preorder()
    .map(|visit| visit.parent.map(|node| node.id))
    .collect();
  assert_eq!(parents, vec![None, Some(1), Some(2), Some(2), Some(1)]);
}

#[test]
fn test_deep_chain_does_not_overflow() {
  let depth = 200_000;
  let mut text = String::from("1 1 0 0 0 1 -1\n");
  for id in 2..=depth {
    text.push_str(&format!("{id} 3 {id} 0 0 0.5 {}\n", id - 1));
  }

  let tree = MorphologyTree::parse(&text).unwrap();
  assert_eq!(tree.preorder().count(), depth as usize);
}

#[test]
fn test_min_radius_above() {
  let text = "1 1 0 0 0 2.0 -1\n2 1 1 0 0 0.0 1\n3 1 2 0 0 0.25 2\n";
  let tree = MorphologyTree::parse(text).unwrap();
  assert_eq!(tree.min_radius_above(1e-6), Some(0.25));
  assert_eq!(tree.min_radius_above(5.0), None);
}

/// Random valid trace: node `i` (1-based) picks a parent among `1..i`.
fn arb_trace() -> impl Strategy<Value = String> {
  prop::collection::vec(
    (
      any::<prop::sample::Index>(),
      -100.0f32..100.0,
      -100.0f32..100.0,
      -100.0f32..100.0,
      0.0f32..5.0,
    ),
    1..60,
  )
  .prop_map(|records| {
    let mut text = String::from("# generated\n");
    for (i, (parent, x, y, z, r)) in records.into_iter().enumerate() {
      let id = i + 1;
      let parent_id = if id == 1 {
        -1
      } else {
        parent.index(id - 1) as i64 + 1
      };
      text.push_str(&format!("{id} 3 {x} {y} {z} {r} {parent_id}\n"));
    }
    text
  })
}

proptest! {
  #[test]
  fn prop_parse_is_idempotent(text in arb_trace()) {
    let first = MorphologyTree::parse(&text).unwrap();
    let second = MorphologyTree::parse(&text).unwrap();

    prop_assert_eq!(first.nodes(), second.nodes());
    prop_assert_eq!(first.root(), second.root());
  }

  #[test]
  fn prop_preorder_visits_every_node_once(text in arb_trace()) {
    let tree = MorphologyTree::parse(&text).unwrap();
    let mut visited = ids(tree.preorder());

    prop_assert_eq!(visited[0], tree.root().id);
    visited.sort_unstable();
    let mut expected: Vec<i64> = tree.nodes().iter().map(|node| node.id).collect();
    expected.sort_unstable();
    prop_assert_eq!(visited, expected);
  }

  #[test]
  fn prop_parent_visited_before_child(text in arb_trace()) {
    let tree = MorphologyTree::parse(&text).unwrap();
    let mut seen = std::collections::HashSet::new();
    for visit in tree.preorder() {
      if let Some(parent) = visit.parent {
        prop_assert!(seen.contains(&parent.id));
        prop_assert_eq!(parent.id, visit.node.parent_id);
      }
      seen.insert(visit.node.id);
    }
  }
}
