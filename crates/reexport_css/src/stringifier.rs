//! Canonical serialization of a stylesheet tree.
//!
//! Formatting is normalized rather than source-faithful: two-space indent,
//! one declaration per line, a blank line between top-level nodes. Every
//! tree this crate serializes for output is machine-built, so there are no
//! original raws to replay.

use crate::ast::nodes::Root;
use crate::ast::{NodeData, NodeRef};

const INDENT: &str = "  ";

/// Serialize a whole tree to CSS text. An empty tree yields an empty string.
pub fn stringify(root: &Root) -> String {
  let mut out = String::new();
  for (index, node) in root.nodes().iter().enumerate() {
    if index > 0 {
      out.push_str("\n\n");
    }
    stringify_node(node, 0, &mut out);
  }
  if !out.is_empty() {
    out.push('\n');
  }
  out
}

fn push_indent(out: &mut String, depth: usize) {
  for _ in 0..depth {
    out.push_str(INDENT);
  }
}

fn stringify_node(node: &NodeRef, depth: usize, out: &mut String) {
  let data = node.borrow().data.clone();
  match data {
    NodeData::Root(_) => {
      for child in node.borrow().nodes.clone() {
        stringify_node(&child, depth, out);
        out.push('\n');
      }
    }
    NodeData::Rule(rule) => {
      push_indent(out, depth);
      out.push_str(&rule.selector);
      out.push_str(" {\n");
      for child in node.borrow().nodes.clone() {
        stringify_node(&child, depth + 1, out);
        out.push('\n');
      }
      push_indent(out, depth);
      out.push('}');
    }
    NodeData::AtRule(at_rule) => {
      push_indent(out, depth);
      out.push('@');
      out.push_str(&at_rule.name);
      if !at_rule.params.is_empty() {
        out.push(' ');
        out.push_str(&at_rule.params);
      }
      let children = node.borrow().nodes.clone();
      if children.is_empty() {
        out.push(';');
      } else {
        out.push_str(" {\n");
        for child in children {
          stringify_node(&child, depth + 1, out);
          out.push('\n');
        }
        push_indent(out, depth);
        out.push('}');
      }
    }
    NodeData::Declaration(decl) => {
      push_indent(out, depth);
      out.push_str(&decl.prop);
      out.push_str(": ");
      out.push_str(&decl.value);
      if decl.important {
        out.push_str(" !important");
      }
      out.push(';');
    }
    NodeData::Comment(comment) => {
      push_indent(out, depth);
      out.push_str("/* ");
      out.push_str(&comment.text);
      out.push_str(" */");
    }
  }
}
