//! Run configuration
//!
//! Loaded from YAML; every section and field has a default, so a partial
//! file (or none at all) is valid. Command-line flags are applied on top.
//!
//! ```yaml
//! server:
//!   jar: models/corenlp/stanford-corenlp-3.9.2.jar
//!   models_jar: models/corenlp/stanford-corenlp-3.9.2-models.jar
//!   port: 9000
//! client:
//!   request_timeout_ms: 30000
//!   retry: { max_attempts: 5, base_backoff_ms: 500 }
//! trace:
//!   include_root: false
//! corpus:
//!   path: data/new_word_df.csv
//!   genders: [M, F]
//! output:
//!   results_path: output/syntactic_annotation.csv
//! ```

use crate::corpus::Selection;
use crate::driver::OutputConfig;
use crate::parser::ClientConfig;
use crate::supervisor::ServerConfig;
use crate::trace::TraceOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Corpus input and the part of it to process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub path: Option<PathBuf>,
    /// Empty selects all genders, in corpus order
    pub genders: Vec<String>,
    pub stories: Vec<u32>,
    pub sentences: Vec<u32>,
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub trace: TraceOptions,
    pub corpus: CorpusConfig,
    pub output: OutputConfig,
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// `<config_dir>/syntrace/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("syntrace").join("config.yaml"))
    }

    /// Load `explicit` if given, else the default file if it exists, else
    /// built-in defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn selection(&self) -> Selection {
        Selection::all()
            .with_genders(self.corpus.genders.iter().cloned())
            .with_stories(self.corpus.stories.iter().copied())
            .with_sentences(self.corpus.sentences.iter().copied())
    }
}
