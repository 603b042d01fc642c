//! End-to-end annotation runs over a small corpus with a mock parser.

mod common;

use common::{small_corpus, small_corpus_parser, CorpusRow, Workspace};
use std::sync::Arc;
use syntrace::{annotate_with, load_corpus, MockParser, ResultTable, RunOutcome};

async fn run(ws: &Workspace, parser: Arc<MockParser>) -> RunOutcome {
    let index = load_corpus(&ws.config).expect("load corpus");
    annotate_with(parser, &ws.config, &index)
        .await
        .expect("annotation run")
}

#[tokio::test]
async fn walks_genders_in_corpus_order_and_stories_ascending() {
    let ws = Workspace::new(&small_corpus());
    let parser = Arc::new(small_corpus_parser());

    run(&ws, parser.clone()).await;

    assert_eq!(
        parser.requests(),
        vec!["The dog barked", "I don't know", "She left", "He ran", "We waited"]
    );
}

#[tokio::test]
async fn failed_sentences_are_skipped_without_ending_the_run() {
    let ws = Workspace::new(&small_corpus());

    let outcome = run(&ws, Arc::new(small_corpus_parser())).await;

    let report = &outcome.report;
    assert_eq!(report.sentences_attempted, 5);
    assert_eq!(report.sentences_annotated, 3);
    assert_eq!(report.records_written, 7);
    let skipped: Vec<(String, &str)> = report
        .skipped
        .iter()
        .map(|s| (s.key.to_string(), s.kind.as_str()))
        .collect();
    assert_eq!(
        skipped,
        vec![
            ("F_1_2".to_string(), "token_alignment"),
            ("M_3_1".to_string(), "service_timeout"),
        ]
    );
    assert_eq!(report.skipped[0].tokens, vec!["I", "don't", "know"]);
}

#[tokio::test]
async fn results_table_holds_one_row_per_token() {
    let ws = Workspace::new(&small_corpus());

    let outcome = run(&ws, Arc::new(small_corpus_parser())).await;

    let csv = ws.read(&ws.config.output.results_path);
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("trace,pos,story,sentence,token_index,token,gender")
    );
    assert_eq!(lines.next(), Some("S/NP,DT,1,1,1,The,F"));
    assert_eq!(lines.next(), Some("S/NP,NN,1,1,2,dog,F"));
    assert_eq!(lines.next(), Some("S/VP,VBD,1,1,3,barked,F"));
    assert_eq!(lines.next(), Some("S/NP,PRP,1,3,1,She,F"));

    let reloaded = ResultTable::read_csv(&ws.config.output.results_path).unwrap();
    assert_eq!(reloaded, outcome.table);
    assert!(reloaded.records().iter().all(|r| r.story != 3));
}

#[tokio::test]
async fn sentence_files_exist_only_for_annotated_sentences() {
    let ws = Workspace::new(&small_corpus());

    run(&ws, Arc::new(small_corpus_parser())).await;

    assert_eq!(
        ws.read(&ws.sentence_file("F_1_F1_1.txt")),
        "(ROOT (S (NP (DT The) (NN dog)) (VP (VBD barked))))"
    );
    assert!(ws.sentence_file("F_1_F1_3.txt").is_file());
    assert!(ws.sentence_file("M_2_M2_1.txt").is_file());
    assert!(!ws.sentence_file("F_1_F1_2.txt").exists());
    assert!(!ws.sentence_file("M_3_M3_1.txt").exists());
}

#[tokio::test]
async fn story_files_keep_a_marker_for_each_skipped_sentence() {
    let ws = Workspace::new(&small_corpus());

    run(&ws, Arc::new(small_corpus_parser())).await;

    assert_eq!(
        ws.read(&ws.story_file("F_1.txt")),
        "(ROOT (S (NP (DT The) (NN dog)) (VP (VBD barked))))\n\
         # skipped F_1_F1_2: token_alignment\n\
         (ROOT (S (NP (PRP She)) (VP (VBD left))))"
    );
    assert_eq!(
        ws.read(&ws.story_file("M_3.txt")),
        "# skipped M_3_M3_1: service_timeout"
    );
}

#[tokio::test]
async fn run_summary_is_written_as_json() {
    let ws = Workspace::new(&small_corpus());

    let outcome = run(&ws, Arc::new(small_corpus_parser())).await;

    let path = ws.config.output.summary_path.clone().unwrap();
    let summary: serde_json::Value = serde_json::from_str(&ws.read(&path)).unwrap();
    assert_eq!(summary["run_id"], outcome.report.run_id.to_string());
    assert_eq!(summary["sentences_annotated"], 3);
    assert_eq!(summary["skipped"][1]["gender"], "M");
    assert_eq!(summary["skipped"][1]["story"], 3);
    assert_eq!(summary["skipped"][1]["sent_id"], "M3_1");
    assert!(summary["finished_at"].is_string());
}

#[tokio::test]
async fn selection_limits_the_walk() {
    let mut ws = Workspace::new(&small_corpus());
    ws.config.corpus.genders = vec!["M".to_string()];
    ws.config.corpus.stories = vec![2];
    let parser = Arc::new(small_corpus_parser());

    let outcome = run(&ws, parser.clone()).await;

    assert_eq!(parser.requests(), vec!["He ran"]);
    assert_eq!(outcome.report.sentences_attempted, 1);
    assert!(ws.story_file("M_2.txt").is_file());
    assert!(!ws.story_file("F_1.txt").exists());
    assert!(!ws.story_file("M_3.txt").exists());
}

#[tokio::test]
async fn include_root_keeps_the_root_label() {
    let rows = vec![
        CorpusRow::new("He", "M", 2, 1, "M2_1"),
        CorpusRow::new("ran", "M", 2, 1, "M2_1"),
    ];
    let mut ws = Workspace::new(&rows);
    ws.config.trace.include_root = true;

    let outcome = run(&ws, Arc::new(small_corpus_parser())).await;

    let traces: Vec<&str> = outcome.table.records().iter().map(|r| r.trace.as_str()).collect();
    assert_eq!(traces, vec!["ROOT/S/NP", "ROOT/S/VP"]);
}

#[tokio::test]
async fn unreachable_parser_skips_every_sentence_but_writes_outputs() {
    let ws = Workspace::new(&small_corpus());

    let outcome = run(&ws, Arc::new(MockParser::unavailable())).await;

    assert_eq!(outcome.report.sentences_annotated, 0);
    assert_eq!(outcome.report.skipped.len(), 5);
    assert!(outcome
        .report
        .skipped
        .iter()
        .all(|s| s.kind == "service_unreachable"));
    assert_eq!(
        ws.read(&ws.config.output.results_path).trim_end(),
        ""
    );
    assert!(ws.story_file("M_2.txt").is_file());
}

#[tokio::test]
async fn story_lines_match_sentence_positions_for_wide_trees() {
    let rows = vec![
        CorpusRow::new("The", "F", 4, 1, "F4_1"),
        CorpusRow::new("old", "F", 4, 1, "F4_1"),
        CorpusRow::new("man", "F", 4, 1, "F4_1"),
        CorpusRow::new("walked", "F", 4, 1, "F4_1"),
        CorpusRow::new("slowly", "F", 4, 1, "F4_1"),
        CorpusRow::new("to", "F", 4, 1, "F4_1"),
        CorpusRow::new("the", "F", 4, 1, "F4_1"),
        CorpusRow::new("river", "F", 4, 1, "F4_1"),
        CorpusRow::new("We", "F", 4, 2, "F4_2"),
        CorpusRow::new("waited", "F", 4, 2, "F4_2"),
        CorpusRow::new("He", "F", 4, 3, "F4_3"),
        CorpusRow::new("ran", "F", 4, 3, "F4_3"),
    ];
    let wide = "(ROOT (S (NP (DT The) (JJ old) (NN man)) (VP (VBD walked) (ADVP (RB slowly)) \
                (PP (TO to) (NP (DT the) (NN river))))))";
    let parser = small_corpus_parser().with_tree("The old man walked slowly to the river", wide);
    let ws = Workspace::new(&rows);

    run(&ws, Arc::new(parser)).await;

    let sentence_file = ws.read(&ws.sentence_file("F_4_F4_1.txt"));
    assert!(sentence_file.lines().count() > 1, "wide tree should be indented");

    let story = ws.read(&ws.story_file("F_4.txt"));
    let lines: Vec<&str> = story.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], wide);
    assert_eq!(lines[1], "# skipped F_4_F4_2: service_timeout");
    assert_eq!(lines[2], "(ROOT (S (NP (PRP He)) (VP (VBD ran))))");
}
