//! syntrace CLI: syntactic trace annotation with a supervised CoreNLP server.
//!
//! Usage:
//!   syntrace annotate --corpus words.csv [--out DIR] [--corenlp-dir DIR]
//!   syntrace serve [--corenlp-dir DIR] [--port N]
//!   syntrace trace [FILE] [--include-root]

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use syntrace::{
    annotate, extract_traces, parse_forest, Config, CoreNlpServer, RunOutcome, SentenceKey,
    ServerConfig, TraceOptions, SKIP_MARKER_PREFIX,
};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "syntrace",
    version,
    about = "Syntactic trace annotation for narrative corpora"
)]
struct Cli {
    /// YAML configuration file (default: <config dir>/syntrace/config.yaml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate a corpus with syntactic traces
    Annotate {
        /// Word-token CSV (columns: word, gender, story, sentence, sent_ID)
        #[arg(long)]
        corpus: Option<PathBuf>,
        /// Output root for sentence files, story files and the results table
        #[arg(long)]
        out: Option<PathBuf>,
        /// Directory holding the CoreNLP jars
        #[arg(long)]
        corenlp_dir: Option<PathBuf>,
        /// Port for the supervised server
        #[arg(long)]
        port: Option<u16>,
        /// Use an already running server instead of starting one
        #[arg(long)]
        server_url: Option<String>,
        /// Only these genders, in this order (repeatable)
        #[arg(long)]
        gender: Vec<String>,
        /// Only these stories (repeatable)
        #[arg(long)]
        story: Vec<u32>,
        /// Only these sentence numbers (repeatable)
        #[arg(long)]
        sentence: Vec<u32>,
        /// Keep the root label at the head of each trace
        #[arg(long)]
        include_root: bool,
        /// Have the server split tokens on whitespace only
        #[arg(long)]
        whitespace_tokenize: bool,
    },
    /// Run the CoreNLP server until interrupted
    Serve {
        /// Directory holding the CoreNLP jars
        #[arg(long)]
        corenlp_dir: Option<PathBuf>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print traces for bracketed trees read from a file or stdin
    Trace {
        /// Tree file (default: stdin)
        file: Option<PathBuf>,
        /// Keep the root label at the head of each trace
        #[arg(long)]
        include_root: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_server_overrides(config: &mut Config, corenlp_dir: Option<PathBuf>, port: Option<u16>) {
    if let Some(dir) = corenlp_dir {
        let ServerConfig { jar, models_jar, .. } = ServerConfig::in_dir(&dir);
        config.server.jar = jar;
        config.server.models_jar = models_jar;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, i32> {
    tokio::runtime::Runtime::new().map_err(|e| {
        eprintln!("failed to create tokio runtime: {}", e);
        1
    })
}

fn print_outcome(outcome: &RunOutcome, config: &Config) {
    let report = &outcome.report;
    println!(
        "Annotated {}/{} sentences, {} records written to {}",
        report.sentences_annotated,
        report.sentences_attempted,
        report.records_written,
        config.output.results_path.display()
    );
    if report.skipped.is_empty() {
        return;
    }
    println!("Skipped {} sentence(s):", report.skipped.len());
    for skipped in &report.skipped {
        println!(
            "  {} ({}) {}: {}",
            skipped.key,
            skipped.sent_id,
            skipped.kind,
            skipped.tokens.join(" ")
        );
    }
}

fn cmd_annotate(config: Config) -> i32 {
    let rt = match runtime() {
        Ok(rt) => rt,
        Err(code) => return code,
    };
    match rt.block_on(annotate(&config)) {
        Ok(outcome) => {
            print_outcome(&outcome, &config);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_serve(config: Config) -> i32 {
    let rt = match runtime() {
        Ok(rt) => rt,
        Err(code) => return code,
    };
    rt.block_on(async {
        let server = match CoreNlpServer::start(&config.server).await {
            Ok(server) => server,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        };
        println!("CoreNLP server listening on {} (Ctrl-C to stop)", server.base_url());
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("Error: cannot wait for Ctrl-C: {}", e);
        }
        match server.stop().await {
            Ok(()) => {
                println!("CoreNLP server stopped");
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        }
    })
}

fn cmd_trace(file: Option<PathBuf>, options: TraceOptions) -> i32 {
    let read = match &file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text).map(|_| text)
        }
    };
    let text = match read {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: cannot read input: {}", e);
            return 1;
        }
    };

    let trees_text: String = text
        .lines()
        .filter(|line| !line.starts_with(SKIP_MARKER_PREFIX))
        .collect::<Vec<_>>()
        .join("\n");
    let trees = match parse_forest(&trees_text) {
        Ok(trees) => trees,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    println!("{:<4}  {:<5}  {:<24}  {:<6}  TRACE", "SENT", "TOKEN", "WORD", "POS");
    println!("{}", "-".repeat(72));
    for (i, tree) in trees.iter().enumerate() {
        let key = SentenceKey::new("-", 0, i as u32 + 1);
        for record in extract_traces(tree, &key, options) {
            println!(
                "{:<4}  {:<5}  {:<24}  {:<6}  {}",
                record.sentence, record.token_index, record.token, record.pos, record.trace
            );
        }
    }
    0
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match Config::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Annotate {
            corpus,
            out,
            corenlp_dir,
            port,
            server_url,
            gender,
            story,
            sentence,
            include_root,
            whitespace_tokenize,
        } => {
            apply_server_overrides(&mut config, corenlp_dir, port);
            if corpus.is_some() {
                config.corpus.path = corpus;
            }
            if let Some(out) = out {
                config.output = config.output.rerooted(&out);
            }
            if server_url.is_some() {
                config.client.url = server_url;
            }
            if !gender.is_empty() {
                config.corpus.genders = gender;
            }
            if !story.is_empty() {
                config.corpus.stories = story;
            }
            if !sentence.is_empty() {
                config.corpus.sentences = sentence;
            }
            config.trace.include_root |= include_root;
            config.client.whitespace_tokenize |= whitespace_tokenize;
            cmd_annotate(config)
        }
        Commands::Serve { corenlp_dir, port } => {
            apply_server_overrides(&mut config, corenlp_dir, port);
            cmd_serve(config)
        }
        Commands::Trace { file, include_root } => {
            let options = config.trace.with_root(config.trace.include_root || include_root);
            cmd_trace(file, options)
        }
    };
    std::process::exit(code);
}
