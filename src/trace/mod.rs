//! Syntactic trace extraction
//!
//! For every leaf of a parse tree, the trace is the chain of constituent
//! labels between the sentence root and the leaf's part-of-speech node,
//! read top-down and joined with [`TRACE_DELIMITER`]. The part-of-speech
//! label itself is reported separately.

mod table;

pub use table::{ResultTable, TableError};

use crate::tree::ParseTree;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between labels in a trace string
pub const TRACE_DELIMITER: &str = "/";

/// Identifies one sentence of the corpus
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SentenceKey {
    pub gender: String,
    pub story: u32,
    pub sentence: u32,
}

impl SentenceKey {
    pub fn new(gender: impl Into<String>, story: u32, sentence: u32) -> Self {
        Self {
            gender: gender.into(),
            story,
            sentence,
        }
    }
}

impl std::fmt::Display for SentenceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}_{}", self.gender, self.story, self.sentence)
    }
}

/// One row of the result table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub trace: String,
    pub pos: String,
    pub story: u32,
    pub sentence: u32,
    /// 1-based position of the token in its sentence
    pub token_index: usize,
    pub token: String,
    pub gender: String,
}

/// Options controlling trace construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceOptions {
    /// Keep the root node's label at the head of every trace
    #[serde(default)]
    pub include_root: bool,
}

impl TraceOptions {
    pub fn with_root(mut self, include_root: bool) -> Self {
        self.include_root = include_root;
        self
    }
}

/// Errors from trace extraction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    #[error("token alignment mismatch: corpus has {expected} token(s), parse tree has {found} leaf(s)")]
    TokenAlignment {
        expected: usize,
        found: usize,
        tokens: Vec<String>,
    },
}

/// Extract one record per leaf, in leaf order.
///
/// The tree is only read; calling this twice on the same tree yields the
/// same records.
pub fn extract_traces(
    tree: &ParseTree,
    key: &SentenceKey,
    options: TraceOptions,
) -> Vec<TraceRecord> {
    let root = tree.root();
    let mut records = Vec::with_capacity(tree.leaf_count());

    for (position, &leaf) in tree.leaves().iter().enumerate() {
        let pos_node = tree.parent(leaf).unwrap_or(root);
        let pos = tree.label(pos_node).unwrap_or_default().to_string();

        let mut labels = Vec::new();
        if pos_node != root {
            for ancestor in tree.ancestors(pos_node) {
                if ancestor == root && !options.include_root {
                    break;
                }
                labels.push(tree.label(ancestor).unwrap_or_default());
            }
        }
        labels.reverse();

        records.push(TraceRecord {
            trace: labels.join(TRACE_DELIMITER),
            pos,
            story: key.story,
            sentence: key.sentence,
            token_index: position + 1,
            token: tree.token(leaf).unwrap_or_default().to_string(),
            gender: key.gender.clone(),
        });
    }

    records
}

/// Extract records and check them against the corpus tokens.
///
/// Fails with [`TraceError::TokenAlignment`] when the tree's leaf count
/// differs from `tokens.len()`, e.g. when the parser split a contraction.
pub fn extract_aligned(
    tree: &ParseTree,
    key: &SentenceKey,
    tokens: &[String],
    options: TraceOptions,
) -> Result<Vec<TraceRecord>, TraceError> {
    if tree.leaf_count() != tokens.len() {
        return Err(TraceError::TokenAlignment {
            expected: tokens.len(),
            found: tree.leaf_count(),
            tokens: tokens.to_vec(),
        });
    }
    Ok(extract_traces(tree, key, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse_bracketed;

    fn key() -> SentenceKey {
        SentenceKey::new("M", 3, 12)
    }

    fn traces(text: &str, options: TraceOptions) -> Vec<(String, String, String)> {
        let tree = parse_bracketed(text).unwrap();
        extract_traces(&tree, &key(), options)
            .into_iter()
            .map(|r| (r.trace, r.pos, r.token))
            .collect()
    }

    fn row(trace: &str, pos: &str, token: &str) -> (String, String, String) {
        (trace.to_string(), pos.to_string(), token.to_string())
    }

    #[test]
    fn corenlp_root_is_excluded() {
        let rows = traces(
            "(ROOT (S (NP (DT The)) (VP (VBD ran))))",
            TraceOptions::default(),
        );
        assert_eq!(
            rows,
            vec![row("S/NP", "DT", "The"), row("S/VP", "VBD", "ran")]
        );
    }

    #[test]
    fn bare_clause_root_needs_include_root() {
        let text = "(S (NP (DT The)) (VP (VBD ran)))";

        assert_eq!(
            traces(text, TraceOptions::default()),
            vec![row("NP", "DT", "The"), row("VP", "VBD", "ran")]
        );
        assert_eq!(
            traces(text, TraceOptions::default().with_root(true)),
            vec![row("S/NP", "DT", "The"), row("S/VP", "VBD", "ran")]
        );
    }

    #[test]
    fn single_leaf_under_root_has_empty_trace() {
        for options in [TraceOptions::default(), TraceOptions::default().with_root(true)] {
            let rows = traces("(NN hello)", options);
            assert_eq!(rows, vec![row("", "NN", "hello")]);
        }
    }

    #[test]
    fn pos_directly_under_root() {
        let rows = traces("(ROOT (UH yes))", TraceOptions::default());
        assert_eq!(rows, vec![row("", "UH", "yes")]);
    }

    #[test]
    fn deep_nesting_reads_top_down() {
        let rows = traces(
            "(ROOT (S (NP (PRP I)) (VP (VBD saw) (NP (DT the) (NN dog))) (. .)))",
            TraceOptions::default(),
        );
        assert_eq!(
            rows,
            vec![
                row("S/NP", "PRP", "I"),
                row("S/VP", "VBD", "saw"),
                row("S/VP/NP", "DT", "the"),
                row("S/VP/NP", "NN", "dog"),
                row("S", ".", "."),
            ]
        );
    }

    #[test]
    fn record_count_matches_leaf_count() {
        let tree = parse_bracketed("(ROOT (FRAG (NP (NN uh) (NN um)) (, ,) (INTJ (UH so))))").unwrap();
        let records = extract_traces(&tree, &key(), TraceOptions::default());

        assert_eq!(records.len(), tree.leaf_count());
        let positions: Vec<_> = records.iter().map(|r| r.token_index).collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);
    }

    #[test]
    fn trace_never_ends_with_pos() {
        let tree = parse_bracketed("(ROOT (S (NP (NP (NN x)) (PP (IN of) (NP (NN y))))))").unwrap();
        for record in extract_traces(&tree, &key(), TraceOptions::default()) {
            let last = record.trace.rsplit(TRACE_DELIMITER).next().unwrap_or_default();
            assert_ne!(last, record.pos);
        }
    }

    #[test]
    fn records_carry_corpus_key() {
        let tree = parse_bracketed("(ROOT (NP (NN word)))").unwrap();
        let record = &extract_traces(&tree, &key(), TraceOptions::default())[0];

        assert_eq!(record.gender, "M");
        assert_eq!(record.story, 3);
        assert_eq!(record.sentence, 12);
        assert_eq!(record.token_index, 1);
    }

    #[test]
    fn extraction_is_idempotent() {
        let tree = parse_bracketed("(ROOT (S (NP (DT a) (NN b)) (VP (VB c))))").unwrap();
        let first = extract_traces(&tree, &key(), TraceOptions::default());
        let second = extract_traces(&tree, &key(), TraceOptions::default());
        assert_eq!(first, second);
    }

    #[test]
    fn aligned_extraction_accepts_matching_tokens() {
        let tree = parse_bracketed("(ROOT (S (NP (DT The)) (VP (VBD ran))))").unwrap();
        let tokens = vec!["The".to_string(), "ran".to_string()];

        let records = extract_aligned(&tree, &key(), &tokens, TraceOptions::default()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn aligned_extraction_rejects_split_contraction() {
        let tree = parse_bracketed("(ROOT (S (NP (PRP I)) (VP (VBP do) (RB n't))))").unwrap();
        let tokens = vec!["I".to_string(), "don't".to_string()];

        let err = extract_aligned(&tree, &key(), &tokens, TraceOptions::default()).unwrap_err();
        assert_eq!(
            err,
            TraceError::TokenAlignment {
                expected: 2,
                found: 3,
                tokens: tokens.clone(),
            }
        );
    }

    #[test]
    fn sentence_key_display() {
        assert_eq!(key().to_string(), "M_3_12");
    }
}
