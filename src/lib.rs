//! syntrace: syntactic trace annotation for narrative corpora
//!
//! Annotates every token of a transcribed corpus with the chain of
//! constituent labels above it in a constituency parse. Parsing is delegated
//! to a CoreNLP server that this crate launches and supervises.
//!
//! # Core Concepts
//!
//! - **Parse tree**: arena tree read from bracketed notation
//! - **Trace**: `/`-joined labels from below the root down to the token's
//!   part-of-speech node, e.g. `S/VP/NP`
//! - **Corpus driver**: walks gender, story and sentence in order, isolating
//!   per-sentence failures
//!
//! # Example
//!
//! ```
//! use syntrace::{extract_traces, parse_bracketed, SentenceKey, TraceOptions};
//!
//! let tree = parse_bracketed("(ROOT (S (NP (DT The)) (VP (VBD ran))))").unwrap();
//! let records = extract_traces(&tree, &SentenceKey::new("M", 1, 1), TraceOptions::default());
//! assert_eq!(records[0].trace, "S/NP");
//! assert_eq!(records[0].pos, "DT");
//! ```

pub mod config;
pub mod corpus;
pub mod driver;
pub mod parser;
pub mod pipeline;
pub mod supervisor;
pub mod trace;
pub mod tree;

pub use config::{Config, ConfigError, CorpusConfig};
pub use corpus::{CorpusError, CorpusIndex, SentenceEntry, Selection, StoryPlan};
pub use driver::{
    skip_marker, ArtifactError, ArtifactWriter, CorpusDriver, OutputConfig, RunOutcome, RunReport,
    SentenceError, SkippedSentence, SKIP_MARKER_PREFIX,
};
pub use parser::{ClientConfig, CoreNlpClient, MockParser, ParserClient, ParserError, RetryPolicy};
pub use pipeline::{annotate, annotate_with, load_corpus, RunError};
pub use supervisor::{CoreNlpServer, ServerConfig, StartupError};
pub use trace::{
    extract_aligned, extract_traces, ResultTable, SentenceKey, TraceError, TraceOptions, TraceRecord,
    TRACE_DELIMITER,
};
pub use tree::{parse_bracketed, parse_forest, NodeId, ParseTree, TreeError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
