//! Turbo Pad trace replayer.
//!
//! Feeds a JSON-lines poll trace through the turbo interceptors and prints
//! what the game would have seen, one JSON object per line.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use turbo_pad::notify::MemoryNotifier;
use turbo_pad::replay;
use turbo_pad::Plugin;

#[derive(Parser)]
#[command(name = "turbo-pad", about = "Replay controller polls through the turbo interceptors")]
struct Args {
    /// Settings file (created with defaults if missing)
    #[arg(long, default_value = "turbo-pad.json")]
    config: PathBuf,

    /// Poll trace (JSON lines). Reads stdin when omitted.
    trace: Option<PathBuf>,

    /// Force turbo on regardless of the settings file
    #[arg(long)]
    enable: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr, stdout carries the replay output.
    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    info!("=== Turbo Pad ===");
    info!("Settings: {}", args.config.display());

    let events = match &args.trace {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open trace {}", path.display()))?;
            replay::parse_trace(BufReader::new(file))?
        }
        None => replay::parse_trace(io::stdin().lock())?,
    };
    info!("[REPLAY] {} event(s)", events.len());

    let notes = Arc::new(MemoryNotifier::new());
    let mut plugin = Plugin::init(&args.config, notes.clone());
    plugin.on_application_start();
    // After start, which reloads the settings file.
    if args.enable {
        plugin.set_enabled(true);
    }

    let outputs = replay::replay(&mut plugin, &notes, events);
    plugin.on_application_end();

    let mut out = BufWriter::new(io::stdout().lock());
    for output in &outputs {
        serde_json::to_writer(&mut out, output).context("Failed to encode output")?;
        writeln!(out)?;
    }
    out.flush()?;

    info!("[REPLAY] Done, {} output(s)", outputs.len());
    Ok(())
}
