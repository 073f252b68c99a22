//! Trellis - Spaced-Repetition Curriculum Engine
//!
//! CLI entry point.

use std::process::ExitCode;
use std::str::FromStr;

use clap::{Parser, Subcommand};

use trellis::config::{curriculum_path, Config};
use trellis::path::PathDoc;
use trellis::srs::Grade;
use trellis::{FileDeckProvider, FileProgressStore, FileStateStore, TrellisError};

// =============================================================================
// CLI Definition
// =============================================================================

/// Trellis - Spaced-Repetition Curriculum Engine
#[derive(Parser)]
#[command(name = "trellis")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one review of a card (fail, hard, good, easy)
    Grade {
        /// Deck the card belongs to
        deck: String,
        /// Card id within the deck
        card: String,
        /// Recall grade: fail, hard, good, or easy
        grade: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show a deck's review queue: due, new, and studied counts
    Due {
        /// Deck to inspect
        deck: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Record completion of a curriculum step, with an optional score
    Mark {
        /// Curriculum node id
        node: String,
        /// Step: study, quiz, reading, listening, or grammar
        step: String,
        /// Items answered correctly
        #[arg(long)]
        score: Option<u32>,
        /// Items asked
        #[arg(long)]
        total: Option<u32>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show a curriculum node's gates, locks, and next required step
    Status {
        /// Curriculum node id
        node: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Walk the curriculum and show per-node completion
    Path {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

// =============================================================================
// Entry Point
// =============================================================================

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("trellis error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Grade {
            deck,
            card,
            grade,
            json,
            quiet,
        } => run_grade(&deck, &card, &grade, json, quiet),
        Commands::Due { deck, json, quiet } => run_due(&deck, json, quiet),
        Commands::Mark {
            node,
            step,
            score,
            total,
            json,
            quiet,
        } => run_mark(&node, &step, score, total, json, quiet),
        Commands::Status { node, json, quiet } => run_status(&node, json, quiet),
        Commands::Path { json, quiet } => run_path(json, quiet),
    }
}

fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Load and validate the curriculum document from its default location.
fn load_curriculum() -> Result<PathDoc, Box<dyn std::error::Error>> {
    let path = curriculum_path()
        .ok_or_else(|| TrellisError::config("Could not determine curriculum path"))?;
    let raw = std::fs::read_to_string(&path).map_err(|e| TrellisError::storage(&path, e))?;
    Ok(PathDoc::from_json(&raw)?)
}

fn decks() -> Result<FileDeckProvider, Box<dyn std::error::Error>> {
    let dir = trellis::config::decks_dir()
        .ok_or_else(|| TrellisError::config("Could not determine decks directory"))?;
    Ok(FileDeckProvider::new(dir))
}

// =============================================================================
// Command Runners
// =============================================================================

fn run_grade(
    deck: &str,
    card: &str,
    grade: &str,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use trellis::cli::grade::{GradeCommand, GradeOptions};

    let grade = Grade::from_str(grade)?;
    let config = Config::load();
    let store = FileStateStore::new()?;

    let cmd = GradeCommand::new(store, config);
    let options = GradeOptions { json, quiet };

    let output = cmd.run(deck, card, grade, chrono::Utc::now(), &options);
    let formatted = cmd.format_output(&output, &options);

    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

fn run_due(deck: &str, json: bool, quiet: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use trellis::cli::due::{DueCommand, DueOptions};

    let cmd = DueCommand::new(FileStateStore::new()?, decks()?);
    let options = DueOptions { json, quiet };

    let output = cmd.run(deck, chrono::Utc::now(), &options);
    let formatted = cmd.format_output(&output, &options);

    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

fn run_mark(
    node: &str,
    step: &str,
    score: Option<u32>,
    total: Option<u32>,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use trellis::cli::mark::{MarkCommand, MarkOptions};
    use trellis::path::StepKind;

    let step = StepKind::from_str(step)?;

    let cmd = MarkCommand::new(FileProgressStore::new()?);
    let options = MarkOptions {
        json,
        quiet,
        score,
        total,
    };

    let output = cmd.run(node, step, chrono::Utc::now(), &options);
    let formatted = cmd.format_output(&output, &options);

    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

fn run_status(node: &str, json: bool, quiet: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use trellis::cli::status_cmd::{StatusCommand, StatusOptions};

    let doc = load_curriculum()?;
    let node = doc
        .node(node)
        .ok_or_else(|| TrellisError::node_not_found(node))?;

    let cmd = StatusCommand::new(FileStateStore::new()?, FileProgressStore::new()?, decks()?);
    let options = StatusOptions { json, quiet };

    let output = cmd.run(node, &options);
    let formatted = cmd.format_output(&output, &options);

    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(ExitCode::SUCCESS)
}

fn run_path(json: bool, quiet: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use trellis::cli::path_cmd::{PathCommand, PathOptions};

    let doc = load_curriculum()?;

    let cmd = PathCommand::new(FileStateStore::new()?, FileProgressStore::new()?, decks()?);
    let options = PathOptions { json, quiet };

    let output = cmd.run(&doc, &options);
    let formatted = cmd.format_output(&output, &options);

    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(ExitCode::SUCCESS)
}

// =============================================================================
// Tests
// =============================================================================
