//! Morphology tree: parsed, validated SWC trace.
//!
//! # Record format
//!
//! ```text
//! # comment lines start with '#'
//! id  type  x      y      z      r     parent
//! 1   1     0.0    0.0    0.0    2.0   -1
//! 2   3     5.0    0.0    0.0    1.0   1
//! ```
//!
//! A node whose parent id does not name any node in the trace is a root.
//! Exactly one root must exist, ids must be unique and every node must be
//! reachable from the root.
//!
//! # Traversal
//!
//! [`MorphologyTree::preorder`] is the canonical iteration order for every
//! downstream consumer: depth-first pre-order from the root, children in
//! record order, driven by an explicit work-list so deep traces cannot
//! overflow the call stack.

use std::collections::HashMap;

use glam::Vec3;
use smallvec::SmallVec;

use crate::error::{ParseError, TopologyError};

/// Comment marker for trace lines.
pub const COMMENT_MARKER: char = '#';

/// Number of whitespace-separated fields per record.
pub const FIELD_COUNT: usize = 7;

/// One sample point of the trace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
  pub id: i64,
  /// Structural classification (soma, axon, ...). Unused by geometry.
  pub type_id: i64,
  pub position: Vec3,
  /// Radius as recorded; sign is not validated here.
  pub radius: f32,
  pub parent_id: i64,
}

/// Child index lists are short: most nodes have one child, branch points two.
type Children = SmallVec<[usize; 2]>;

/// Read-only tree built once per conversion run.
#[derive(Clone, Debug)]
pub struct MorphologyTree {
  nodes: Vec<Node>,
  index_by_id: HashMap<i64, usize>,
  children: Vec<Children>,
  root: usize,
}

impl MorphologyTree {
  /// Parse and validate trace text.
  pub fn parse(text: &str) -> Result<Self, ParseError> {
    let mut nodes = Vec::new();

    for (line_index, raw) in text.lines().enumerate() {
      let line = raw.trim();
      if line.is_empty() || line.starts_with(COMMENT_MARKER) {
        continue;
      }
      nodes.push(parse_record(line, line_index + 1)?);
    }

    Self::from_nodes(nodes).map_err(ParseError::from)
  }

  /// Build a tree from already-parsed nodes, checking the topology invariants.
  pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, TopologyError> {
    if nodes.is_empty() {
      return Err(TopologyError::Empty);
    }

    let mut index_by_id = HashMap::with_capacity(nodes.len());
    for (index, node) in nodes.iter().enumerate() {
      if index_by_id.insert(node.id, index).is_some() {
        return Err(TopologyError::DuplicateId(node.id));
      }
    }

    let mut children = vec![Children::new(); nodes.len()];
    let mut roots = Vec::new();
    for (index, node) in nodes.iter().enumerate() {
      match index_by_id.get(&node.parent_id) {
        Some(&parent) => children[parent].push(index),
        None => roots.push(index),
      }
    }

    let root = match roots.as_slice() {
      [] => return Err(TopologyError::NoRoot),
      [root] => *root,
      _ => {
        return Err(TopologyError::MultipleRoots(
          roots.iter().map(|&index| nodes[index].id).collect(),
        ))
      }
    };

    let tree = Self {
      nodes,
      index_by_id,
      children,
      root,
    };
    tree.check_reachable()?;
    Ok(tree)
  }

  /// Every node must hang off the root; anything left over sits on a cycle.
  fn check_reachable(&self) -> Result<(), TopologyError> {
    let mut reached = vec![false; self.nodes.len()];
    let mut stack = vec![self.root];
    while let Some(index) = stack.pop() {
      if std::mem::replace(&mut reached[index], true) {
        continue;
      }
      stack.extend(self.children[index].iter().copied());
    }

    let unreachable: Vec<i64> = reached
      .iter()
      .zip(&self.nodes)
      .filter(|(reached, _)| !**reached)
      .map(|(_, node)| node.id)
      .collect();

    if unreachable.is_empty() {
      Ok(())
    } else {
      Err(TopologyError::Unreachable(unreachable))
    }
  }

  /// Nodes in record order.
  pub fn nodes(&self) -> &[Node] {
    &self.nodes
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn root(&self) -> &Node {
    &self.nodes[self.root]
  }

  pub fn get(&self, id: i64) -> Option<&Node> {
    self.index_by_id.get(&id).map(|&index| &self.nodes[index])
  }

  /// Parent of a node, `None` for the root.
  pub fn parent_of(&self, node: &Node) -> Option<&Node> {
    self.get(node.parent_id)
  }

  /// Children of `node` in record order.
  pub fn children_of<'a>(&'a self, node: &Node) -> impl Iterator<Item = &'a Node> + 'a {
    let indices: &[usize] = match self.index_by_id.get(&node.id) {
      Some(&index) => &self.children[index],
      None => &[],
    };
    indices.iter().map(move |&index| &self.nodes[index])
  }

  /// Smallest radius strictly above `threshold`, if any node has one.
  pub fn min_radius_above(&self, threshold: f32) -> Option<f32> {
    self
      .nodes
      .iter()
      .map(|node| node.radius)
      .filter(|&radius| radius > threshold)
      .reduce(f32::min)
  }

  /// Depth-first pre-order walk from the root.
  pub fn preorder(&self) -> Preorder<'_> {
    Preorder::new(self)
  }
}

/// One step of the canonical traversal.
#[derive(Clone, Copy, Debug)]
pub struct Visit<'a> {
  pub node: &'a Node,
  /// `None` only for the root.
  pub parent: Option<&'a Node>,
}

/// Work-list driven pre-order traversal.
///
/// Each node is yielded once. A node reached a second time is skipped with a
/// warning rather than treated as an error.
pub struct Preorder<'a> {
  tree: &'a MorphologyTree,
  stack: Vec<(usize, Option<usize>)>,
  visited: Vec<bool>,
}

impl<'a> Preorder<'a> {
  fn new(tree: &'a MorphologyTree) -> Self {
    Self {
      tree,
      stack: vec![(tree.root, None)],
      visited: vec![false; tree.nodes.len()],
    }
  }
}

impl<'a> Iterator for Preorder<'a> {
  type Item = Visit<'a>;

  fn next(&mut self) -> Option<Self::Item> {
    let tree = self.tree;
    while let Some((index, parent)) = self.stack.pop() {
      if std::mem::replace(&mut self.visited[index], true) {
        tracing::warn!(
          node = tree.nodes[index].id,
          "node reached twice during traversal, skipping"
        );
        continue;
      }

      // Reverse so the first child is popped first.
      self
        .stack
        .extend(tree.children[index].iter().rev().map(|&child| (child, Some(index))));

      return Some(Visit {
        node: &tree.nodes[index],
        parent: parent.map(|parent| &tree.nodes[parent]),
      });
    }
    None
  }
}

fn parse_record(line: &str, line_number: usize) -> Result<Node, ParseError> {
  let malformed = |reason: String| ParseError::MalformedRecord {
    line: line_number,
    content: line.to_string(),
    reason,
  };

  let fields: SmallVec<[&str; FIELD_COUNT]> = line.split_whitespace().collect();
  if fields.len() != FIELD_COUNT {
    return Err(malformed(format!(
      "expected {FIELD_COUNT} fields, found {}",
      fields.len()
    )));
  }

  let int = |column: usize, name: &str| {
    fields[column]
      .parse::<i64>()
      .map_err(|err| malformed(format!("{name} '{}': {err}", fields[column])))
  };
  let float = |column: usize, name: &str| {
    let value = fields[column]
      .parse::<f32>()
      .map_err(|err| malformed(format!("{name} '{}': {err}", fields[column])))?;
    if !value.is_finite() {
      return Err(malformed(format!("{name} '{}': not a finite number", fields[column])));
    }
    Ok(value)
  };

  Ok(Node {
    id: int(0, "id")?,
    type_id: int(1, "type")?,
    position: Vec3::new(float(2, "x")?, float(3, "y")?, float(4, "z")?),
    radius: float(5, "radius")?,
    parent_id: int(6, "parent id")?,
  })
}

#[cfg(test)]
#[path = "morphology_test.rs"]
mod morphology_test;
