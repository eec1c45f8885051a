use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub mod nodes;

/// Shared pointer to a node in the stylesheet tree.
pub type NodeRef = Rc<RefCell<Node>>;

/// Weak pointer used for parent links so child/parent references never cycle.
pub type WeakNodeRef = Weak<RefCell<Node>>;

/// Strongly-typed payload stored inside each [`Node`].
#[derive(Clone, Debug)]
pub enum NodeData {
  Root(nodes::RootData),
  Rule(nodes::RuleData),
  AtRule(nodes::AtRuleData),
  Declaration(nodes::DeclarationData),
  Comment(nodes::CommentData),
}

impl NodeData {
  pub fn is_container(&self) -> bool {
    matches!(
      self,
      NodeData::Root(_) | NodeData::Rule(_) | NodeData::AtRule(_)
    )
  }

  pub fn type_name(&self) -> &'static str {
    match self {
      NodeData::Root(_) => "root",
      NodeData::Rule(_) => "rule",
      NodeData::AtRule(_) => "atrule",
      NodeData::Declaration(_) => "decl",
      NodeData::Comment(_) => "comment",
    }
  }
}

/// Core mutable node representation. Container nodes own their children in
/// document order; every child holds a weak link back to its parent.
#[derive(Clone, Debug)]
pub struct Node {
  pub data: NodeData,
  pub parent: Option<WeakNodeRef>,
  pub nodes: Vec<NodeRef>,
}

impl Node {
  pub fn new(data: NodeData) -> NodeRef {
    Rc::new(RefCell::new(Self {
      data,
      parent: None,
      nodes: Vec::new(),
    }))
  }

  pub fn parent(&self) -> Option<NodeRef> {
    self.parent.as_ref().and_then(Weak::upgrade)
  }

  pub fn parent_ref(node: &NodeRef) -> Option<NodeRef> {
    node.borrow().parent()
  }

  /// Append `child` to `parent`, rewiring the child's parent link.
  pub fn append(parent: &NodeRef, child: NodeRef) {
    child.borrow_mut().parent = Some(Rc::downgrade(parent));
    parent.borrow_mut().nodes.push(child);
  }

  pub fn index_of(parent: &NodeRef, child: &NodeRef) -> Option<usize> {
    let parent_borrow = parent.borrow();
    parent_borrow
      .nodes
      .iter()
      .position(|node| Rc::ptr_eq(node, child))
  }

  pub fn first_child(parent: &NodeRef) -> Option<NodeRef> {
    parent.borrow().nodes.first().cloned()
  }

  pub fn last_child(parent: &NodeRef) -> Option<NodeRef> {
    parent.borrow().nodes.last().cloned()
  }

  /// Depth-first walk in document order. The callback returns `false` to stop
  /// the traversal early; `walk` reports whether it ran to completion.
  pub fn walk<F>(node: &NodeRef, callback: &mut F) -> bool
  where
    F: FnMut(NodeRef) -> bool,
  {
    let children = node.borrow().nodes.clone();
    for child in children {
      if !callback(child.clone()) {
        return false;
      }
      let descend = child.borrow().data.is_container();
      if descend && !Node::walk(&child, callback) {
        return false;
      }
    }
    true
  }

  /// Deep copy of a subtree. The copy is detached: its parent link is empty.
  pub fn clone_subtree(node: &NodeRef) -> NodeRef {
    let copy = Node::new(node.borrow().data.clone());
    let children = node.borrow().nodes.clone();
    for child in children {
      let child_copy = Node::clone_subtree(&child);
      Node::append(&copy, child_copy);
    }
    copy
  }
}
