// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Textwerk — find a literal word in a PDF and highlight it or rewrite it in
// a new color.
//
// Entry point. Initialises logging, loads the font configuration, runs one
// marking pass, and saves the result to a new file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use textwerk_core::error::Result;
use textwerk_core::{AppConfig, Mode, RgbColor};
use textwerk_mark::Processor;

/// How matched words are marked.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq)]
enum MarkMode {
    /// Add a yellow highlight annotation over each word
    Highlight,
    /// Erase each word and write it again in --color
    #[default]
    Recolor,
}

/// Find every occurrence of a word in a PDF and highlight or recolor it.
#[derive(Parser, Debug)]
#[command(name = "textwerk")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// PDF to read; it is never modified
    input: PathBuf,

    /// Word to look for (ASCII letters and digits, case-sensitive)
    target: String,

    /// Where to write the marked PDF [default: output.pdf, or the config's default_output]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Marking mode
    #[arg(short, long, value_enum, default_value = "recolor")]
    mode: MarkMode,

    /// Recolor fill, as #RRGGBB or r,g,b in [0, 1]
    #[arg(short, long, default_value = "#ff0000")]
    color: RgbColor,

    /// JSON font registry and policy file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only report matches; do not write an output file
    #[arg(long)]
    dry_run: bool,

    /// Print the report as JSON instead of a summary line
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::info!(input = %args.input.display(), target = %args.target, "Textwerk starting");
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.default_output.clone());

    let mut processor = Processor::open(&args.input, config)?;

    if args.dry_run {
        let found = processor.find(&args.target)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&found)?);
        } else {
            for page in &found {
                for found in &page.matches {
                    let rect = found.rect;
                    println!(
                        "page {}: {:?} at [{:.1}, {:.1}, {:.1}, {:.1}]",
                        page.page + 1,
                        found.text,
                        rect.x0,
                        rect.y0,
                        rect.x1,
                        rect.y1
                    );
                }
            }
        }
        return Ok(());
    }

    let report = processor.run(&args.target, mode(args))?;
    processor.save(&output)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}; wrote {}", output.display());
    }
    Ok(())
}

fn mode(args: &Args) -> Mode {
    match args.mode {
        MarkMode::Highlight => Mode::Highlight,
        MarkMode::Recolor => Mode::Recolor(args.color),
    }
}
