//! KeyCache CLI - report repeated lines using a bounded key cache

mod handler;

use anyhow::{Context, Result};
use clap::Parser;
use keycache::LruKeyCache;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::handler::LineHandler;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file (defaults to stdin)
    input: Option<PathBuf>,

    /// Cache capacity (number of keys)
    #[arg(short, long, env = "KCACHE_CAPACITY", default_value_t = 128)]
    capacity: usize,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Suppress per-line HIT/MISS output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let cache = LruKeyCache::try_new(args.capacity).context("invalid --capacity")?;
    info!("Cache capacity: {}", cache.capacity());

    let input: Box<dyn BufRead> = match &args.input {
        Some(path) => {
            info!("Reading {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    let handler = LineHandler::new(Arc::new(cache), args.quiet);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    handler.run(input, &mut out)?;

    let summary = handler.summary();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &summary)?;
        writeln!(out)?;
    } else {
        writeln!(
            out,
            "capacity={} len={} hits={} misses={} evictions={} hit_ratio={:.3}",
            summary.capacity,
            summary.len,
            summary.hits,
            summary.misses,
            summary.evictions,
            summary.hit_ratio
        )?;
    }

    Ok(())
}
