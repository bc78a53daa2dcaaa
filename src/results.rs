use tracing::debug;

use crate::{DegreesError, graph::PersonResult, store::GraphStore};

/// Collects person results found while stepping and writes them back in
/// bounded batches.
///
/// A person's distance is final the moment it enters a tier, so flushing the
/// same person twice always writes the same path.
#[derive(Debug)]
pub struct ResultCacheWriter {
    enabled: bool,
    batch_size: usize,
    pending: Vec<PersonResult>,
    written: usize,
}

impl ResultCacheWriter {
    pub fn new(batch_size: usize) -> Self {
        Self {
            enabled: true,
            batch_size: batch_size.max(1),
            pending: Vec::new(),
            written: 0,
        }
    }

    /// A writer that drops everything it is given.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(1)
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&mut self, result: PersonResult) {
        if self.enabled {
            self.pending.push(result);
        }
    }

    pub fn pending(&self) -> &[PersonResult] {
        &self.pending
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Writes all pending results, one store transaction per batch. Results
    /// of batches that failed stay pending.
    pub fn flush<S: GraphStore>(&mut self, store: &S) -> Result<usize, DegreesError> {
        let mut flushed = 0;
        while !self.pending.is_empty() {
            let take = self.pending.len().min(self.batch_size);
            store.upsert_results(&self.pending[..take])?;
            self.pending.drain(..take);
            self.written += take;
            flushed += take;
        }
        if flushed > 0 {
            debug!(flushed, batch_size = self.batch_size, "flushed person results");
        }
        Ok(flushed)
    }
}
