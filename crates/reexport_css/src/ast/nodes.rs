use std::fmt;

use super::{Node, NodeData, NodeRef};
use crate::list;
use crate::stringifier;

#[derive(Clone, Debug, Default)]
pub struct RootData;

#[derive(Clone, Debug, Default)]
pub struct RuleData {
  pub selector: String,
}

#[derive(Clone, Debug, Default)]
pub struct AtRuleData {
  pub name: String,
  pub params: String,
}

#[derive(Clone, Debug, Default)]
pub struct DeclarationData {
  pub prop: String,
  pub value: String,
  pub important: bool,
}

#[derive(Clone, Debug, Default)]
pub struct CommentData {
  pub text: String,
}

/// Root container of a parsed or programmatically built stylesheet.
#[derive(Clone, Debug)]
pub struct Root {
  node: NodeRef,
}

impl Root {
  pub fn new() -> Self {
    Root {
      node: Node::new(NodeData::Root(RootData)),
    }
  }

  pub(crate) fn from_node(node: NodeRef) -> Self {
    Root { node }
  }

  pub fn to_node(&self) -> NodeRef {
    self.node.clone()
  }

  pub fn append(&self, child: NodeRef) {
    Node::append(&self.node, child);
  }

  pub fn nodes(&self) -> Vec<NodeRef> {
    self.node.borrow().nodes.clone()
  }

  pub fn is_empty(&self) -> bool {
    self.node.borrow().nodes.is_empty()
  }

  /// Visit every declaration in document order. The callback returns `false`
  /// to stop early.
  pub fn walk_decls<F>(&self, mut callback: F) -> bool
  where
    F: FnMut(Declaration) -> bool,
  {
    Node::walk(&self.node, &mut |node_ref| {
      let is_decl = matches!(node_ref.borrow().data, NodeData::Declaration(_));
      if is_decl {
        callback(Declaration::from_node(node_ref))
      } else {
        true
      }
    })
  }
}

impl Default for Root {
  fn default() -> Self {
    Root::new()
  }
}

impl fmt::Display for Root {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&stringifier::stringify(self))
  }
}

/// A style rule: a selector plus an ordered body of declarations.
#[derive(Clone, Debug)]
pub struct Rule {
  node: NodeRef,
}

impl Rule {
  pub fn new(selector: impl Into<String>) -> Self {
    Rule {
      node: Node::new(NodeData::Rule(RuleData {
        selector: selector.into(),
      })),
    }
  }

  pub(crate) fn from_node(node: NodeRef) -> Self {
    Rule { node }
  }

  pub fn to_node(&self) -> NodeRef {
    self.node.clone()
  }

  pub fn selector(&self) -> String {
    match &self.node.borrow().data {
      NodeData::Rule(data) => data.selector.clone(),
      _ => String::new(),
    }
  }

  /// Comma-separated selector parts, split with quote/escape/function
  /// awareness.
  pub fn selectors(&self) -> Vec<String> {
    list::comma(&self.selector())
  }

  pub fn append(&self, child: NodeRef) {
    Node::append(&self.node, child);
  }

  pub fn nodes(&self) -> Vec<NodeRef> {
    self.node.borrow().nodes.clone()
  }

  pub fn parent(&self) -> Option<NodeRef> {
    Node::parent_ref(&self.node)
  }
}

/// An at-rule (`@media`, `@supports`, ...) owning an ordered body of rules.
#[derive(Clone, Debug)]
pub struct AtRule {
  node: NodeRef,
}

impl AtRule {
  pub fn new(name: impl Into<String>, params: impl Into<String>) -> Self {
    AtRule {
      node: Node::new(NodeData::AtRule(AtRuleData {
        name: name.into(),
        params: params.into(),
      })),
    }
  }

  pub(crate) fn from_node(node: NodeRef) -> Self {
    AtRule { node }
  }

  pub fn to_node(&self) -> NodeRef {
    self.node.clone()
  }

  pub fn name(&self) -> String {
    match &self.node.borrow().data {
      NodeData::AtRule(data) => data.name.clone(),
      _ => String::new(),
    }
  }

  pub fn params(&self) -> String {
    match &self.node.borrow().data {
      NodeData::AtRule(data) => data.params.clone(),
      _ => String::new(),
    }
  }

  pub fn append(&self, child: NodeRef) {
    Node::append(&self.node, child);
  }

  pub fn nodes(&self) -> Vec<NodeRef> {
    self.node.borrow().nodes.clone()
  }

  pub fn parent(&self) -> Option<NodeRef> {
    Node::parent_ref(&self.node)
  }
}

/// A property/value pair belonging to exactly one rule.
#[derive(Clone, Debug)]
pub struct Declaration {
  node: NodeRef,
}

impl Declaration {
  pub fn new(prop: impl Into<String>, value: impl Into<String>) -> Self {
    Declaration {
      node: Node::new(NodeData::Declaration(DeclarationData {
        prop: prop.into(),
        value: value.into(),
        important: false,
      })),
    }
  }

  pub(crate) fn from_node(node: NodeRef) -> Self {
    Declaration { node }
  }

  pub fn to_node(&self) -> NodeRef {
    self.node.clone()
  }

  pub fn prop(&self) -> String {
    match &self.node.borrow().data {
      NodeData::Declaration(data) => data.prop.clone(),
      _ => String::new(),
    }
  }

  pub fn value(&self) -> String {
    match &self.node.borrow().data {
      NodeData::Declaration(data) => data.value.clone(),
      _ => String::new(),
    }
  }

  pub fn important(&self) -> bool {
    matches!(&self.node.borrow().data, NodeData::Declaration(data) if data.important)
  }

  pub fn set_important(&self, important: bool) {
    if let NodeData::Declaration(data) = &mut self.node.borrow_mut().data {
      data.important = important;
    }
  }

  pub fn parent(&self) -> Option<NodeRef> {
    Node::parent_ref(&self.node)
  }

  /// Detached deep copy, ready to be appended into another tree.
  pub fn clone_node(&self) -> Declaration {
    Declaration {
      node: Node::clone_subtree(&self.node),
    }
  }
}

/// A `/* ... */` comment between rules or declarations.
#[derive(Clone, Debug)]
pub struct Comment {
  node: NodeRef,
}

impl Comment {
  pub fn new(text: impl Into<String>) -> Self {
    Comment {
      node: Node::new(NodeData::Comment(CommentData { text: text.into() })),
    }
  }

  pub(crate) fn from_node(node: NodeRef) -> Self {
    Comment { node }
  }

  pub fn to_node(&self) -> NodeRef {
    self.node.clone()
  }

  pub fn text(&self) -> String {
    match &self.node.borrow().data {
      NodeData::Comment(data) => data.text.clone(),
      _ => String::new(),
    }
  }
}

/// Convert a node reference into a [`Rule`] wrapper when it stores rule data.
pub fn as_rule(node: &NodeRef) -> Option<Rule> {
  if matches!(node.borrow().data, NodeData::Rule(_)) {
    Some(Rule::from_node(node.clone()))
  } else {
    None
  }
}

/// Convert a node reference into an [`AtRule`] wrapper when possible.
pub fn as_at_rule(node: &NodeRef) -> Option<AtRule> {
  if matches!(node.borrow().data, NodeData::AtRule(_)) {
    Some(AtRule::from_node(node.clone()))
  } else {
    None
  }
}

/// Convert a node reference into a [`Declaration`] wrapper when possible.
pub fn as_declaration(node: &NodeRef) -> Option<Declaration> {
  if matches!(node.borrow().data, NodeData::Declaration(_)) {
    Some(Declaration::from_node(node.clone()))
  } else {
    None
  }
}

/// Convert a node reference into a [`Comment`] wrapper when possible.
pub fn as_comment(node: &NodeRef) -> Option<Comment> {
  if matches!(node.borrow().data, NodeData::Comment(_)) {
    Some(Comment::from_node(node.clone()))
  } else {
    None
  }
}
