//! Line driver: one cache check per line of input

use anyhow::Result;
use keycache::{LogTracer, LruKeyCache};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::sync::Arc;

/// Final report printed after the input is exhausted
#[derive(Debug, Serialize, PartialEq)]
pub struct Summary {
    pub capacity: usize,
    pub len: usize,
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
    pub hit_ratio: f64,
}

pub struct LineHandler {
    cache: Arc<LruKeyCache>,
    quiet: bool,
}

impl LineHandler {
    pub fn new(cache: Arc<LruKeyCache>, quiet: bool) -> Self {
        Self { cache, quiet }
    }

    /// Check every line of `input`, writing `HIT <len>` or `MISS <len>` per line
    pub fn run<R: BufRead, W: Write>(&self, input: R, out: &mut W) -> Result<()> {
        for line in input.lines() {
            let line = line?;
            let (len, found) = self.cache.check(&line, &LogTracer);

            if !self.quiet {
                let tag = if found { "HIT" } else { "MISS" };
                writeln!(out, "{} {}", tag, len)?;
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> Summary {
        let stats = self.cache.stats().snapshot();
        Summary {
            capacity: self.cache.capacity(),
            len: self.cache.len(),
            hits: stats.hits,
            misses: stats.misses,
            inserts: stats.inserts,
            evictions: stats.evictions,
            hit_ratio: stats.hit_ratio(),
        }
    }
}
