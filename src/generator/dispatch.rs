//! Bounded parallel chunk dispatch
//!
//! Runs one worker per chunk with at most `concurrency` in flight and returns
//! the results in input order. Every worker runs on its own tokio task, so a
//! panicking worker is contained and degrades to the chunk's original text
//! like any other failure.

use futures::StreamExt;
use std::future::Future;
use tracing::{debug, warn};

use crate::constants::generation as gen_constants;
use crate::types::{Chunk, Completion, Result};

/// Bounded fan-out over a batch of chunks
#[derive(Debug, Clone, Copy)]
pub struct ParallelDispatcher {
    concurrency: usize,
}

impl Default for ParallelDispatcher {
    fn default() -> Self {
        Self::new(gen_constants::DEFAULT_CONCURRENCY)
    }
}

impl ParallelDispatcher {
    /// A concurrency of zero is treated as one.
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run `worker` over every chunk; `result[i]` always belongs to `chunks[i]`
    pub async fn dispatch<W, Fut>(&self, chunks: &[Chunk], worker: W) -> Vec<Completion>
    where
        W: Fn(Chunk) -> Fut,
        Fut: Future<Output = Result<Completion>> + Send + 'static,
    {
        let total = chunks.len();
        let mut slots: Vec<Option<Completion>> = vec![None; total];

        let mut stream = futures::stream::iter(chunks.iter().cloned().enumerate())
            .map(|(index, chunk)| {
                let task = tokio::spawn(worker(chunk));
                async move { (index, task.await) }
            })
            .buffer_unordered(self.concurrency);

        while let Some((index, joined)) = stream.next().await {
            let completion = match joined {
                Ok(Ok(completion)) => completion,
                Ok(Err(e)) => {
                    warn!(chunk = index + 1, total, error = %e, "Chunk worker failed, keeping original");
                    Completion::Fallback(chunks[index].text.clone())
                }
                Err(e) => {
                    warn!(chunk = index + 1, total, error = %e, "Chunk worker panicked, keeping original");
                    Completion::Fallback(chunks[index].text.clone())
                }
            };
            slots[index] = Some(completion);
        }

        let fallbacks = slots
            .iter()
            .filter(|slot| slot.as_ref().is_none_or(Completion::is_fallback))
            .count();
        debug!(total, fallbacks, concurrency = self.concurrency, "Batch dispatched");

        slots
            .into_iter()
            .zip(chunks)
            .map(|(slot, chunk)| slot.unwrap_or_else(|| Completion::Fallback(chunk.text.clone())))
            .collect()
    }
}
