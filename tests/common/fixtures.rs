//! Corpus fixtures and mock parses

use std::path::{Path, PathBuf};
use syntrace::{Config, MockParser, OutputConfig, ParserError};
use tempfile::TempDir;

/// One word of the corpus table
pub struct CorpusRow<'a> {
    pub word: &'a str,
    pub gender: &'a str,
    pub story: u32,
    pub sentence: u32,
    pub sent_id: &'a str,
}

impl<'a> CorpusRow<'a> {
    pub fn new(word: &'a str, gender: &'a str, story: u32, sentence: u32, sent_id: &'a str) -> Self {
        Self {
            word,
            gender,
            story,
            sentence,
            sent_id,
        }
    }
}

/// Write a word-token CSV with the columns the loader reads plus an
/// unrelated `speaker` column it must ignore.
pub fn write_corpus(path: &Path, rows: &[CorpusRow<'_>]) {
    let mut writer = csv::Writer::from_path(path).expect("create corpus file");
    writer
        .write_record(["speaker", "word", "gender", "story", "sentence", "sent_ID"])
        .expect("write header");
    for row in rows {
        writer
            .write_record([
                "s01",
                row.word,
                row.gender,
                &row.story.to_string(),
                &row.sentence.to_string(),
                row.sent_id,
            ])
            .expect("write row");
    }
    writer.flush().expect("flush corpus");
}

/// Temporary directory holding a corpus and the outputs of one run
pub struct Workspace {
    pub dir: TempDir,
    pub corpus_path: PathBuf,
    pub config: Config,
}

impl Workspace {
    pub fn new(rows: &[CorpusRow<'_>]) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let corpus_path = dir.path().join("words.csv");
        write_corpus(&corpus_path, rows);

        let mut config = Config::default();
        config.corpus.path = Some(corpus_path.clone());
        config.output = OutputConfig::under(&dir.path().join("out"));
        Self {
            dir,
            corpus_path,
            config,
        }
    }

    pub fn sentence_file(&self, name: &str) -> PathBuf {
        self.config.output.sentence_dir.join(name)
    }

    pub fn story_file(&self, name: &str) -> PathBuf {
        self.config.output.story_dir.join(name)
    }

    pub fn read(&self, path: &Path) -> String {
        std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("cannot read {}: {}", path.display(), e))
    }
}

/// Two speakers, three stories, five sentences.
///
/// F story 1 sentence 2 is misaligned (the parser splits "don't") and
/// M story 3 sentence 1 times out.
pub fn small_corpus() -> Vec<CorpusRow<'static>> {
    vec![
        CorpusRow::new("The", "F", 1, 1, "F1_1"),
        CorpusRow::new("dog", "F", 1, 1, "F1_1"),
        CorpusRow::new("barked", "F", 1, 1, "F1_1"),
        CorpusRow::new("I", "F", 1, 2, "F1_2"),
        CorpusRow::new("don't", "F", 1, 2, "F1_2"),
        CorpusRow::new("know", "F", 1, 2, "F1_2"),
        CorpusRow::new("She", "F", 1, 3, "F1_3"),
        CorpusRow::new("left", "F", 1, 3, "F1_3"),
        CorpusRow::new("We", "M", 3, 1, "M3_1"),
        CorpusRow::new("waited", "M", 3, 1, "M3_1"),
        CorpusRow::new("He", "M", 2, 1, "M2_1"),
        CorpusRow::new("ran", "M", 2, 1, "M2_1"),
    ]
}

/// Parser answering for every sentence of [`small_corpus`]
pub fn small_corpus_parser() -> MockParser {
    MockParser::available()
        .with_tree(
            "The dog barked",
            "(ROOT (S (NP (DT The) (NN dog)) (VP (VBD barked))))",
        )
        .with_tree(
            "I don't know",
            "(ROOT (S (NP (PRP I)) (VP (VBP do) (RB n't) (VP (VB know)))))",
        )
        .with_tree("She left", "(ROOT (S (NP (PRP She)) (VP (VBD left))))")
        .with_failure(
            "We waited",
            ParserError::Timeout(std::time::Duration::from_secs(60)),
        )
        .with_tree("He ran", "(ROOT (S (NP (PRP He)) (VP (VBD ran))))")
}
