//! In-memory sequence sources for tests
//!
//! Available under `cfg(test)` and with the `dev` feature.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{SequenceSource, SourceError};
use crate::locus::GeneLocus;

/// A source that returns a fixed result and counts how often it was asked
#[derive(Debug)]
pub struct StaticSource {
    name: &'static str,
    result: Result<String, SourceError>,
    delay: Option<Duration>,
    deadline: Duration,
    calls: AtomicUsize,
}

impl StaticSource {
    /// Source that always returns `sequence`
    pub fn ok(name: &'static str, sequence: &str) -> Self {
        Self::new(name, Ok(sequence.to_string()))
    }

    /// Source that always fails with `error`
    pub fn failing(name: &'static str, error: SourceError) -> Self {
        Self::new(name, Err(error))
    }

    fn new(name: &'static str, result: Result<String, SourceError>) -> Self {
        Self {
            name,
            result,
            delay: None,
            deadline: super::DEFAULT_SOURCE_DEADLINE,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Override the per-attempt deadline reported to the resolver
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Number of `fetch_sequence` calls received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SequenceSource for StaticSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn deadline(&self) -> Duration {
        self.deadline
    }

    async fn fetch_sequence(&self, _locus: &GeneLocus) -> Result<String, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}
