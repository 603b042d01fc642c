//! Corpus index over a word-token table
//!
//! The corpus is a CSV file with one row per spoken word. Rows are grouped
//! by (gender, story, sentence) into ordered token lists; the row order in
//! the file is the token order.

use crate::trace::SentenceKey;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Errors loading the corpus
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Deserialize)]
struct WordRow {
    word: String,
    gender: String,
    story: u32,
    sentence: u32,
    #[serde(rename = "sent_ID", default)]
    sent_id: Option<String>,
}

/// Tokens of one sentence plus the corpus's own sentence identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceEntry {
    pub sent_id: String,
    pub tokens: Vec<String>,
}

/// Which part of the corpus to process. Empty lists select everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub genders: Vec<String>,
    pub stories: Vec<u32>,
    pub sentences: Vec<u32>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_genders(mut self, genders: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.genders = genders.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_stories(mut self, stories: impl IntoIterator<Item = u32>) -> Self {
        self.stories = stories.into_iter().collect();
        self
    }

    pub fn with_sentences(mut self, sentences: impl IntoIterator<Item = u32>) -> Self {
        self.sentences = sentences.into_iter().collect();
        self
    }
}

/// The sentences of one story, in processing order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryPlan {
    pub gender: String,
    pub story: u32,
    pub sentences: Vec<SentenceKey>,
}

/// Read-only lookup from sentence key to tokens
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    /// Genders in order of first appearance
    genders: Vec<String>,
    sentences: BTreeMap<SentenceKey, SentenceEntry>,
}

impl CorpusIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a word-token CSV. Columns used: `word`, `gender`, `story`,
    /// `sentence` and, optionally, `sent_ID`; others are ignored.
    pub fn from_path(path: &Path) -> Result<Self, CorpusError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader(reader: impl io::Read) -> Result<Self, CorpusError> {
        let mut csv = csv::Reader::from_reader(reader);
        let mut index = Self::new();
        for row in csv.deserialize() {
            let row: WordRow = row?;
            let key = SentenceKey::new(row.gender, row.story, row.sentence);
            index.push_token(key, row.sent_id, row.word);
        }
        Ok(index)
    }

    /// Append a token to a sentence, creating the sentence on first use.
    ///
    /// The sentence id defaults to the sentence number; the first id seen
    /// for a sentence wins.
    pub fn push_token(&mut self, key: SentenceKey, sent_id: Option<String>, word: impl Into<String>) {
        if !self.genders.contains(&key.gender) {
            self.genders.push(key.gender.clone());
        }
        let default_id = key.sentence.to_string();
        self.sentences
            .entry(key)
            .or_insert_with(|| SentenceEntry {
                sent_id: sent_id.filter(|id| !id.is_empty()).unwrap_or(default_id),
                tokens: Vec::new(),
            })
            .tokens
            .push(word.into());
    }

    pub fn genders(&self) -> &[String] {
        &self.genders
    }

    /// Story numbers told by `gender`, ascending
    pub fn stories(&self, gender: &str) -> Vec<u32> {
        let mut stories: Vec<u32> = self
            .sentences
            .keys()
            .filter(|k| k.gender == gender)
            .map(|k| k.story)
            .collect();
        stories.dedup();
        stories
    }

    /// Sentence numbers of one story, ascending
    pub fn sentences(&self, gender: &str, story: u32) -> Vec<u32> {
        self.sentences
            .keys()
            .filter(|k| k.gender == gender && k.story == story)
            .map(|k| k.sentence)
            .collect()
    }

    pub fn get(&self, key: &SentenceKey) -> Option<&SentenceEntry> {
        self.sentences.get(key)
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Enumerate the selected sentences: gender in selection order (or
    /// corpus order when unselected), then stories and sentences ascending.
    pub fn plan(&self, selection: &Selection) -> Vec<StoryPlan> {
        let genders: Vec<&String> = if selection.genders.is_empty() {
            self.genders.iter().collect()
        } else {
            let mut picked: Vec<&String> = Vec::new();
            for gender in &selection.genders {
                if self.genders.contains(gender) && !picked.contains(&gender) {
                    picked.push(gender);
                }
            }
            picked
        };

        let mut plans = Vec::new();
        for gender in genders {
            for story in self.stories(gender) {
                if !selection.stories.is_empty() && !selection.stories.contains(&story) {
                    continue;
                }
                let sentences: Vec<SentenceKey> = self
                    .sentences(gender, story)
                    .into_iter()
                    .filter(|s| selection.sentences.is_empty() || selection.sentences.contains(s))
                    .map(|s| SentenceKey::new(gender.clone(), story, s))
                    .collect();
                if !sentences.is_empty() {
                    plans.push(StoryPlan {
                        gender: gender.clone(),
                        story,
                        sentences,
                    });
                }
            }
        }
        plans
    }
}
