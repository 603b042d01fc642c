//! Corpus driver
//!
//! Walks the corpus gender, then story, then sentence, sends each sentence to the
//! parser, extracts traces and writes the tree artifacts. A failing
//! sentence is logged and skipped; only output errors end the run.

mod artifacts;

pub use artifacts::{ArtifactError, ArtifactWriter, OutputConfig};

use crate::corpus::{CorpusIndex, Selection};
use crate::parser::{ParserClient, ParserError};
use crate::trace::{extract_aligned, ResultTable, SentenceKey, TraceError, TraceOptions};
use crate::tree::{parse_bracketed, ParseTree, TreeError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Why a single sentence produced no records
#[derive(Debug, Error)]
pub enum SentenceError {
    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error("malformed tree: {0}")]
    MalformedTree(#[from] TreeError),

    #[error(transparent)]
    Alignment(#[from] TraceError),
}

impl SentenceError {
    /// Stable classification used in logs and the run report
    pub fn kind(&self) -> &'static str {
        match self {
            SentenceError::Parser(ParserError::Unreachable(_)) => "service_unreachable",
            SentenceError::Parser(ParserError::Timeout(_)) => "service_timeout",
            SentenceError::Parser(ParserError::Rejected { .. }) => "service_rejected",
            SentenceError::Parser(ParserError::InvalidResponse(_)) => "invalid_response",
            SentenceError::MalformedTree(_) => "malformed_tree",
            SentenceError::Alignment(_) => "token_alignment",
        }
    }
}

/// A sentence left out of the results, kept for manual review
#[derive(Debug, Clone, Serialize)]
pub struct SkippedSentence {
    #[serde(flatten)]
    pub key: SentenceKey,
    pub sent_id: String,
    pub tokens: Vec<String>,
    pub kind: String,
    pub message: String,
}

/// Summary of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub sentences_attempted: usize,
    pub sentences_annotated: usize,
    pub records_written: usize,
    pub skipped: Vec<SkippedSentence>,
}

impl RunReport {
    fn begin() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            sentences_attempted: 0,
            sentences_annotated: 0,
            records_written: 0,
            skipped: Vec::new(),
        }
    }
}

/// Result table and report of a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub table: ResultTable,
    pub report: RunReport,
}

/// Start of the story-file line that stands in for a skipped sentence
pub const SKIP_MARKER_PREFIX: &str = "# skipped ";

/// Story-file line standing in for a sentence that was skipped
pub fn skip_marker(key: &SentenceKey, sent_id: &str, kind: &str) -> String {
    format!("{}{}_{}_{}: {}", SKIP_MARKER_PREFIX, key.gender, key.story, sent_id, kind)
}

/// Text sent to the parser for a token sequence
pub fn sentence_text(tokens: &[String]) -> String {
    tokens.join(" ").replace('\n', "")
}

/// Drives the parser over a corpus
pub struct CorpusDriver {
    parser: Arc<dyn ParserClient>,
    writer: ArtifactWriter,
    options: TraceOptions,
}

impl CorpusDriver {
    pub fn new(parser: Arc<dyn ParserClient>, writer: ArtifactWriter, options: TraceOptions) -> Self {
        Self {
            parser,
            writer,
            options,
        }
    }

    /// Annotate one sentence.
    ///
    /// Takes the result table by value and hands it back; records are
    /// appended only when the whole sentence succeeds, so on error the
    /// returned table equals the one passed in.
    #[instrument(name = "annotate_sentence", skip(self, table, tokens), fields(sentence = %key))]
    pub async fn annotate_sentence(
        &self,
        mut table: ResultTable,
        key: &SentenceKey,
        tokens: &[String],
    ) -> (ResultTable, Result<ParseTree, SentenceError>) {
        let outcome = async {
            let raw = self.parser.parse(&sentence_text(tokens)).await?;
            let tree = parse_bracketed(&raw)?;
            let records = extract_aligned(&tree, key, tokens, self.options)?;
            Ok::<_, SentenceError>((tree, records))
        }
        .await;

        match outcome {
            Ok((tree, records)) => {
                table.append(records);
                (table, Ok(tree))
            }
            Err(e) => (table, Err(e)),
        }
    }

    /// Process every selected sentence, then persist the result table and
    /// the run summary.
    pub async fn run(&self, index: &CorpusIndex, selection: &Selection) -> Result<RunOutcome, ArtifactError> {
        let mut report = RunReport::begin();
        let mut table = ResultTable::new();
        self.writer.prepare()?;
        info!(run_id = %report.run_id, sentences = index.len(), "annotation run started");

        for plan in index.plan(selection) {
            let mut story_texts = Vec::with_capacity(plan.sentences.len());

            for key in &plan.sentences {
                let Some(entry) = index.get(key) else {
                    continue;
                };
                report.sentences_attempted += 1;

                let (next, outcome) = self.annotate_sentence(table, key, &entry.tokens).await;
                table = next;

                match outcome {
                    Ok(tree) => {
                        let text = tree.to_pretty(self.writer.config().margin);
                        self.writer.write_sentence(key, &entry.sent_id, &text)?;
                        story_texts.push(tree.to_bracketed());
                        report.sentences_annotated += 1;
                        info!(sentence = %key, sent_id = %entry.sent_id, "finished");
                    }
                    Err(e) => {
                        warn!(
                            sentence = %key,
                            kind = e.kind(),
                            tokens = ?entry.tokens,
                            error = %e,
                            "skipping sentence"
                        );
                        story_texts.push(skip_marker(key, &entry.sent_id, e.kind()));
                        report.skipped.push(SkippedSentence {
                            key: key.clone(),
                            sent_id: entry.sent_id.clone(),
                            tokens: entry.tokens.clone(),
                            kind: e.kind().to_string(),
                            message: e.to_string(),
                        });
                    }
                }
            }

            self.writer.write_story(&plan.gender, plan.story, &story_texts)?;
            info!(gender = %plan.gender, story = plan.story, "story written");
        }

        self.writer.write_results(&table)?;
        report.records_written = table.len();
        report.finished_at = Some(Utc::now());
        self.writer.write_summary(&report)?;
        info!(
            run_id = %report.run_id,
            annotated = report.sentences_annotated,
            skipped = report.skipped.len(),
            records = report.records_written,
            "annotation run finished"
        );

        Ok(RunOutcome { table, report })
    }
}
