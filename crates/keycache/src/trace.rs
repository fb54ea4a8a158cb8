//! Observer hook for cache-backed operations
//!
//! A host that guards expensive work with a [`LruKeyCache`](crate::LruKeyCache)
//! can report whether each request was served from cache. The cache never
//! calls a tracer from `lookup` or `insert`; only
//! [`LruKeyCache::check`](crate::LruKeyCache::check) does.

use tracing::debug;

/// Outcome of one cache-backed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupStats {
    /// Was the input already cached?
    pub cache_hit: bool,
    /// Number of keys in the cache afterwards
    pub cache_len: usize,
}

/// Called once with the outcome when the traced operation finishes
pub type TraceFinish = Box<dyn FnOnce(LookupStats) + Send>;

/// Observes cache-backed operations
pub trait LookupTracer: Send + Sync {
    /// Start tracing an operation
    fn trace_lookup(&self) -> TraceFinish;
}

impl<F> LookupTracer for F
where
    F: Fn() -> TraceFinish + Send + Sync,
{
    fn trace_lookup(&self) -> TraceFinish {
        self()
    }
}

/// Tracer that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl LookupTracer for NoopTracer {
    fn trace_lookup(&self) -> TraceFinish {
        Box::new(|_| {})
    }
}

/// Tracer that emits a `tracing` debug event per operation
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

impl LookupTracer for LogTracer {
    fn trace_lookup(&self) -> TraceFinish {
        Box::new(|stats| {
            debug!(
                cache_hit = stats.cache_hit,
                cache_len = stats.cache_len,
                "cache lookup finished"
            );
        })
    }
}
