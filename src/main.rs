//! destyle - Remove formatting from HTML

use std::io::Read;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use destyle::{Document, Outcome, RemoveFormatting, SelectorRules};

#[derive(Parser)]
#[command(name = "destyle")]
#[command(version, about = "Remove formatting from HTML", long_about = None)]
#[command(after_help = "EXAMPLES:
    destyle page.html                 Flatten the whole body
    destyle page.html --select 5..9   Remove formatting from characters 5 to 9
    cat page.html | destyle --json    Read stdin, print a JSON report")]
struct Cli {
    /// Input HTML file, stdin when absent or `-`
    #[arg(value_name = "INPUT")]
    input: Option<String>,

    /// Character range of the document text to act on
    #[arg(short, long, value_name = "START..END", value_parser = parse_span)]
    select: Option<(usize, usize)>,

    /// Drop scripts, styles and other non-content elements
    #[arg(long)]
    strip_non_content: bool,

    /// Print a JSON report instead of bare HTML
    #[arg(long)]
    json: bool,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Serialize)]
struct Report {
    html: String,
    changed: bool,
    segments: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !cli.quiet {
                eprintln!("error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> destyle::Result<()> {
    let bytes = read_input(cli.input.as_deref())?;

    let mut remover = RemoveFormatting::new();
    if cli.strip_non_content {
        remover = remover.with_classifier(SelectorRules::non_content());
    }

    let report = match cli.select {
        Some((start, end)) => {
            let mut doc = Document::parse_bytes(&bytes);
            doc.select_text(start, end)?;
            let outcome = remover.apply(&mut doc)?;
            match outcome {
                Outcome::Replaced { segments, .. } => Report {
                    html: doc.to_html(),
                    changed: true,
                    segments,
                    reason: None,
                },
                Outcome::Unchanged(reason) => {
                    if !cli.quiet {
                        eprintln!("note: {reason}, nothing changed");
                    }
                    Report {
                        html: doc.to_html(),
                        changed: false,
                        segments: 0,
                        reason: Some(reason.to_string()),
                    }
                }
            }
        }
        None => {
            let doc = Document::parse_bytes(&bytes);
            let html = remover.flatten(&doc.to_html());
            Report {
                changed: html != doc.to_html(),
                html,
                segments: 1,
                reason: None,
            }
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
        println!("{json}");
    } else {
        println!("{}", report.html);
    }
    Ok(())
}

fn read_input(path: Option<&str>) -> std::io::Result<Vec<u8>> {
    match path {
        Some(path) if path != "-" => std::fs::read(path),
        _ => {
            let mut bytes = Vec::new();
            std::io::stdin().read_to_end(&mut bytes)?;
            Ok(bytes)
        }
    }
}

/// Parse `START..END` into character offsets.
fn parse_span(s: &str) -> Result<(usize, usize), String> {
    let (start, end) = s
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got {s:?}"))?;
    let start = start
        .trim()
        .parse()
        .map_err(|e| format!("invalid start {start:?}: {e}"))?;
    let end = end
        .trim()
        .parse()
        .map_err(|e| format!("invalid end {end:?}: {e}"))?;
    Ok((start, end))
}
