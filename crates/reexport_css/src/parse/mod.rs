//! Token-stream parser producing the mutable stylesheet tree.

use std::fmt;

use crate::ast::nodes::{AtRuleData, CommentData, DeclarationData, Root, RuleData};
use crate::ast::{Node, NodeData, NodeRef};

mod tokenizer;

pub use tokenizer::{Token, TokenKind, Tokenizer};

/// Error raised for malformed input, with a byte offset into the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
  pub message: String,
  pub offset: usize,
}

impl ParseError {
  pub(crate) fn new(message: impl Into<String>, offset: usize) -> Self {
    Self {
      message: message.into(),
      offset,
    }
  }
}

impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} at offset {}", self.message, self.offset)
  }
}

impl std::error::Error for ParseError {}

/// Parse CSS text into a [`Root`] tree.
pub fn parse(css: &str) -> Result<Root, ParseError> {
  let root = Root::new();
  let mut tokenizer = Tokenizer::new(css);
  parse_nodes(&mut tokenizer, &root.to_node(), true)?;
  Ok(root)
}

fn parse_nodes(
  tokenizer: &mut Tokenizer<'_>,
  container: &NodeRef,
  is_root: bool,
) -> Result<(), ParseError> {
  while let Some(token) = tokenizer.next_token()? {
    match token.kind {
      TokenKind::Space | TokenKind::Semicolon => {}
      TokenKind::Comment => {
        let node = Node::new(NodeData::Comment(CommentData {
          text: comment_text(&token.value),
        }));
        Node::append(container, node);
      }
      TokenKind::CloseCurly => {
        if is_root {
          return Err(ParseError::new("Unexpected }", token.start));
        }
        return Ok(());
      }
      TokenKind::AtWord => parse_at_rule(tokenizer, container, &token)?,
      _ => {
        tokenizer.back(token);
        parse_other(tokenizer, container)?;
      }
    }
  }

  if is_root {
    Ok(())
  } else {
    Err(ParseError::new("Unclosed block", 0))
  }
}

fn parse_at_rule(
  tokenizer: &mut Tokenizer<'_>,
  container: &NodeRef,
  at_token: &Token,
) -> Result<(), ParseError> {
  let name = at_token.value[1..].to_string();
  let mut params = String::new();

  loop {
    let Some(token) = tokenizer.next_token()? else {
      append_at_rule(container, name, params);
      return Ok(());
    };
    match token.kind {
      TokenKind::Semicolon => {
        append_at_rule(container, name, params);
        return Ok(());
      }
      TokenKind::CloseCurly => {
        // Bodyless at-rule terminated by the enclosing block.
        tokenizer.back(token);
        append_at_rule(container, name, params);
        return Ok(());
      }
      TokenKind::OpenCurly => {
        let node = append_at_rule(container, name, params);
        parse_nodes(tokenizer, &node, false)?;
        return Ok(());
      }
      TokenKind::Comment => {}
      _ => params.push_str(&token.value),
    }
  }
}

fn append_at_rule(container: &NodeRef, name: String, params: String) -> NodeRef {
  let node = Node::new(NodeData::AtRule(AtRuleData {
    name,
    params: params.trim().to_string(),
  }));
  Node::append(container, node.clone());
  node
}

/// Parse either a rule or a declaration: tokens are buffered until the
/// terminator decides which one it was (`{` opens a rule body; `;`, `}` or
/// end of input close a declaration).
fn parse_other(tokenizer: &mut Tokenizer<'_>, container: &NodeRef) -> Result<(), ParseError> {
  let mut buffer: Vec<Token> = Vec::new();

  loop {
    let Some(token) = tokenizer.next_token()? else {
      return append_declaration(container, &buffer);
    };
    match token.kind {
      TokenKind::OpenCurly => {
        let node = Node::new(NodeData::Rule(RuleData {
          selector: text_of(&buffer).trim().to_string(),
        }));
        Node::append(container, node.clone());
        return parse_nodes(tokenizer, &node, false);
      }
      TokenKind::Semicolon => {
        return append_declaration(container, &buffer);
      }
      TokenKind::CloseCurly => {
        tokenizer.back(token);
        return append_declaration(container, &buffer);
      }
      TokenKind::Comment => {}
      _ => buffer.push(token),
    }
  }
}

fn append_declaration(container: &NodeRef, buffer: &[Token]) -> Result<(), ParseError> {
  if text_of(buffer).trim().is_empty() {
    return Ok(());
  }

  let mut depth = 0u32;
  let mut colon = None;
  for (index, token) in buffer.iter().enumerate() {
    match token.kind {
      TokenKind::OpenParenthesis => depth += 1,
      TokenKind::CloseParenthesis => depth = depth.saturating_sub(1),
      TokenKind::Colon if depth == 0 => {
        colon = Some(index);
        break;
      }
      _ => {}
    }
  }

  let offset = buffer.first().map(|token| token.start).unwrap_or(0);
  let Some(colon) = colon else {
    return Err(ParseError::new("Unknown word", offset));
  };

  let prop = text_of(&buffer[..colon]).trim().to_string();
  if prop.is_empty() {
    return Err(ParseError::new("Unknown word", offset));
  }

  let (value, important) = take_important(text_of(&buffer[colon + 1..]).trim());
  let node = Node::new(NodeData::Declaration(DeclarationData {
    prop,
    value,
    important,
  }));
  Node::append(container, node);
  Ok(())
}

fn text_of(tokens: &[Token]) -> String {
  tokens.iter().map(|token| token.value.as_str()).collect()
}

fn comment_text(raw: &str) -> String {
  raw
    .strip_prefix("/*")
    .and_then(|rest| rest.strip_suffix("*/"))
    .unwrap_or(raw)
    .trim()
    .to_string()
}

fn take_important(value: &str) -> (String, bool) {
  if let Some(index) = value.rfind('!') {
    if value[index + 1..].trim().eq_ignore_ascii_case("important") {
      return (value[..index].trim_end().to_string(), true);
    }
  }
  (value.to_string(), false)
}
