//! Bracketed labeled-tree notation
//!
//! Reads and writes trees of the form `(LABEL child child ...)` where leaves
//! are bare atoms. This is the notation CoreNLP returns in the `parse` field.

use super::arena::{NodeId, NodeKind, ParseTree, TreeBuilder};
use std::fmt::Write as _;
use std::str::FromStr;
use thiserror::Error;

/// Column budget for the indented form written to tree files
pub const DEFAULT_MARGIN: usize = 70;

/// Errors reading bracketed tree text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("empty tree text")]
    Empty,

    #[error("unexpected ')' at byte {0}")]
    UnexpectedClose(usize),

    #[error("unterminated tree: {0} node(s) left open")]
    Unterminated(usize),

    #[error("token outside of any node at byte {0}")]
    BareAtom(usize),

    #[error("trailing input after the root node at byte {0}")]
    TrailingInput(usize),
}

#[derive(Debug, PartialEq, Eq)]
enum Lexeme<'a> {
    Open(usize),
    Close(usize),
    Atom(&'a str, usize),
}

fn is_delimiter(c: char) -> bool {
    c == '(' || c == ')' || c.is_whitespace()
}

fn lex(text: &str) -> Vec<Lexeme<'_>> {
    let mut out = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((pos, c)) = chars.next() {
        match c {
            '(' => out.push(Lexeme::Open(pos)),
            ')' => out.push(Lexeme::Close(pos)),
            c if c.is_whitespace() => {}
            _ => {
                let mut end = pos + c.len_utf8();
                while let Some(&(next_pos, next)) = chars.peek() {
                    if is_delimiter(next) {
                        break;
                    }
                    end = next_pos + next.len_utf8();
                    chars.next();
                }
                out.push(Lexeme::Atom(&text[pos..end], pos));
            }
        }
    }
    out
}

/// Read consecutive top-level trees, each paired with its start offset
fn read_trees(text: &str) -> Result<Vec<(usize, ParseTree)>, TreeError> {
    let mut trees = Vec::new();
    let mut builder = TreeBuilder::new();
    let mut start = 0;
    let mut iter = lex(text).into_iter().peekable();

    while let Some(lexeme) = iter.next() {
        match lexeme {
            Lexeme::Open(pos) => {
                if !builder.has_root() {
                    start = pos;
                }
                let label = match iter.peek() {
                    Some(Lexeme::Atom(label, _)) => {
                        let label = label.to_string();
                        iter.next();
                        label
                    }
                    _ => String::new(),
                };
                builder.open(label).ok_or(TreeError::TrailingInput(pos))?;
            }
            Lexeme::Close(pos) => {
                builder.close().ok_or(TreeError::UnexpectedClose(pos))?;
                if builder.open_depth() == 0 {
                    let done = std::mem::take(&mut builder);
                    trees.extend(done.finish().map(|tree| (start, tree)));
                }
            }
            Lexeme::Atom(token, pos) => {
                builder.leaf(token).ok_or(TreeError::BareAtom(pos))?;
            }
        }
    }

    if builder.has_root() {
        return Err(TreeError::Unterminated(builder.open_depth()));
    }
    Ok(trees)
}

/// Parse bracketed tree text into a [`ParseTree`].
///
/// The atom directly after `(` is the node label. A node opened without a
/// label (`( (S ...) )`) gets an empty label. Exactly one tree must be
/// present.
pub fn parse_bracketed(text: &str) -> Result<ParseTree, TreeError> {
    let mut trees = read_trees(text)?.into_iter();
    let (_, tree) = trees.next().ok_or(TreeError::Empty)?;
    match trees.next() {
        Some((pos, _)) => Err(TreeError::TrailingInput(pos)),
        None => Ok(tree),
    }
}

/// Parse any number of consecutive bracketed trees
pub fn parse_forest(text: &str) -> Result<Vec<ParseTree>, TreeError> {
    Ok(read_trees(text)?.into_iter().map(|(_, tree)| tree).collect())
}

impl FromStr for ParseTree {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_bracketed(s)
    }
}

impl ParseTree {
    /// Single-line bracketed form
    pub fn to_bracketed(&self) -> String {
        let mut out = String::new();
        self.write_flat(self.root(), &mut out);
        out
    }

    /// Indented bracketed form.
    ///
    /// A subtree is written on one line when it fits within `margin`
    /// columns at its indentation; otherwise each child goes on its own
    /// line, indented two spaces deeper than its parent.
    pub fn to_pretty(&self, margin: usize) -> String {
        let mut out = String::new();
        self.write_pretty(self.root(), 0, margin, &mut out);
        out
    }

    fn write_flat(&self, id: NodeId, out: &mut String) {
        match &self.node(id).kind {
            NodeKind::Leaf { token } => out.push_str(token),
            NodeKind::Internal { label } => {
                out.push('(');
                out.push_str(label);
                for &child in self.children(id) {
                    out.push(' ');
                    self.write_flat(child, out);
                }
                out.push(')');
            }
        }
    }

    fn write_pretty(&self, id: NodeId, indent: usize, margin: usize, out: &mut String) {
        let mut flat = String::new();
        self.write_flat(id, &mut flat);
        if flat.chars().count() + indent < margin {
            out.push_str(&flat);
            return;
        }

        let NodeKind::Internal { label } = &self.node(id).kind else {
            out.push_str(&flat);
            return;
        };
        out.push('(');
        out.push_str(label);
        for &child in self.children(id) {
            let _ = write!(out, "\n{:width$}", "", width = indent + 2);
            self.write_pretty(child, indent + 2, margin, out);
        }
        out.push(')');
    }
}

impl std::fmt::Display for ParseTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_bracketed())
    }
}
