//! Common test utilities for annotation runs
//!
//! Builds small word-token corpora on disk and a configuration whose
//! outputs all land in a temporary directory.

pub mod fixtures;

pub use fixtures::{small_corpus, small_corpus_parser, write_corpus, CorpusRow, Workspace};
