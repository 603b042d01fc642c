//! Output files of an annotation run

use super::RunReport;
use crate::trace::{ResultTable, SentenceKey, TableError};
use crate::tree::DEFAULT_MARGIN;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors writing run artifacts
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("results table: {0}")]
    Table(#[from] TableError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Where artifacts go
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// One tree file per sentence: `<gender>_<story>_<sent_id>.txt`
    pub sentence_dir: PathBuf,
    /// One file per story: `<gender>_<story>.txt`
    pub story_dir: PathBuf,
    pub results_path: PathBuf,
    /// Run report as JSON; not written when unset
    pub summary_path: Option<PathBuf>,
    /// Column budget for the indented tree form
    pub margin: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::under(Path::new("output"))
    }
}

impl OutputConfig {
    /// Standard layout below `root`
    pub fn under(root: &Path) -> Self {
        Self {
            sentence_dir: root.join("sentences"),
            story_dir: root.join("stories"),
            results_path: root.join("syntactic_annotation.csv"),
            summary_path: Some(root.join("run_summary.json")),
            margin: DEFAULT_MARGIN,
        }
    }

    /// Move every output below `root`, keeping the margin and whether a
    /// summary is written
    pub fn rerooted(&self, root: &Path) -> Self {
        let layout = Self::under(root);
        Self {
            summary_path: self.summary_path.as_ref().and(layout.summary_path),
            margin: self.margin,
            ..layout
        }
    }
}

/// Writes per-sentence, per-story and run-level files
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    config: OutputConfig,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ArtifactError + '_ {
    move |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl ArtifactWriter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Create the output directories
    pub fn prepare(&self) -> Result<(), ArtifactError> {
        let mut dirs = vec![self.config.sentence_dir.as_path(), self.config.story_dir.as_path()];
        dirs.extend(self.config.results_path.parent());
        dirs.extend(self.config.summary_path.as_deref().and_then(Path::parent));
        for dir in dirs.into_iter().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_error(dir))?;
        }
        Ok(())
    }

    pub fn sentence_path(&self, key: &SentenceKey, sent_id: &str) -> PathBuf {
        self.config
            .sentence_dir
            .join(format!("{}_{}_{}.txt", key.gender, key.story, sent_id))
    }

    pub fn story_path(&self, gender: &str, story: u32) -> PathBuf {
        self.config.story_dir.join(format!("{}_{}.txt", gender, story))
    }

    pub fn write_sentence(&self, key: &SentenceKey, sent_id: &str, text: &str) -> Result<PathBuf, ArtifactError> {
        let path = self.sentence_path(key, sent_id);
        std::fs::write(&path, text).map_err(io_error(&path))?;
        Ok(path)
    }

    /// Story file: one line per sentence position, joined by newlines
    pub fn write_story(&self, gender: &str, story: u32, sentences: &[String]) -> Result<PathBuf, ArtifactError> {
        let path = self.story_path(gender, story);
        std::fs::write(&path, sentences.join("\n")).map_err(io_error(&path))?;
        Ok(path)
    }

    pub fn write_results(&self, table: &ResultTable) -> Result<(), ArtifactError> {
        table.write_csv(&self.config.results_path)?;
        Ok(())
    }

    /// Write the run report if a summary path is configured
    pub fn write_summary(&self, report: &RunReport) -> Result<Option<PathBuf>, ArtifactError> {
        let Some(path) = &self.config.summary_path else {
            return Ok(None);
        };
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(path, json).map_err(io_error(path))?;
        Ok(Some(path.clone()))
    }
}
