//! Command-line front end: process metrics from a raw log dump and line
//! attribution from a single commit's diff.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use defect_miner::config::MiningConfig;
use defect_miner::diff::{attribute_lines, BuggyLineIndex, CommitContext};
use defect_miner::error::MiningError;
use defect_miner::scan::RepositoryScan;
use defect_miner::tagging::{tag_files, tag_rows, TAG_COLUMNS};

#[derive(Parser)]
#[command(name = "defect-miner")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one JSON commit record per line for a raw log dump
    Metrics {
        /// Output of `git log` run with the arguments from `log_command_args`
        #[arg(short, long)]
        log: PathBuf,
    },

    /// Print the attributed added and deleted statements of one diff as JSON
    Attribute {
        /// Unified diff of the commit
        #[arg(short, long)]
        diff: PathBuf,

        /// Commit hash
        #[arg(long)]
        commit: String,

        /// Author name
        #[arg(long)]
        author: String,

        /// Author timestamp in seconds since the epoch
        #[arg(long)]
        timestamp: i64,

        /// The commit fixes a defect
        #[arg(long)]
        fix: bool,

        /// The commit is known to introduce a defect
        #[arg(long)]
        contains_bug: bool,

        /// Buggy-line annotation (`FILE_START:<file>,<line>,...`)
        #[arg(long, default_value = "NULL")]
        buggy: String,
    },

    /// Tag source files with the classifications of the commits in a log
    Tag {
        /// Raw log dump of one release window
        #[arg(short, long)]
        log: PathBuf,

        /// File listing every tracked path, one per line
        #[arg(short, long)]
        files: PathBuf,
    },
}

fn read_file(path: &Path) -> Result<Vec<u8>, MiningError> {
    std::fs::read(path).map_err(|e| MiningError::io(path, e))
}

fn write_line(out: &mut impl Write, line: &str) -> Result<(), MiningError> {
    writeln!(out, "{}", line).map_err(|e| MiningError::io("<stdout>", e))
}

fn run(cli: Cli) -> Result<(), MiningError> {
    let config = match &cli.config {
        Some(path) => MiningConfig::load(path)?,
        None => MiningConfig::default(),
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Metrics { log } => {
            let raw = read_file(&log)?;
            let mut scan = RepositoryScan::new(config.classifier()?);
            for record in scan.ingest(&raw) {
                write_line(&mut out, &serde_json::to_string(&record)?)?;
            }
        }
        Commands::Attribute {
            diff,
            commit,
            author,
            timestamp,
            fix,
            contains_bug,
            buggy,
        } => {
            let diff_text = String::from_utf8_lossy(&read_file(&diff)?).into_owned();
            let context = CommitContext {
                hash: commit,
                author,
                timestamp,
                fix,
                contains_bug,
            };
            let result = attribute_lines(&diff_text, &context, &BuggyLineIndex::parse(&buggy), &config);
            write_line(&mut out, &serde_json::to_string(&result)?)?;
        }
        Commands::Tag { log, files } => {
            let raw = read_file(&log)?;
            let tracked = String::from_utf8_lossy(&read_file(&files)?).into_owned();
            let mut scan = RepositoryScan::new(config.classifier()?);
            let window = scan.ingest(&raw);

            let tags = tag_files(&window, tracked.lines(), &config.source_extensions);
            write_line(&mut out, &TAG_COLUMNS.join(","))?;
            for [file, classes] in tag_rows(&tags) {
                write_line(&mut out, &format!("{},{}", file, classes))?;
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
