//! Where fetched chunks go: the `ResultSink` trait and an in-memory
//! reassembling sink.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::http::FetchError;
use crate::pool::ChunkOutcome;

/// Receives every chunk outcome exactly once, in completion order.
pub trait ResultSink {
    fn accept(&mut self, outcome: ChunkOutcome);
}

impl<F: FnMut(ChunkOutcome)> ResultSink for F {
    fn accept(&mut self, outcome: ChunkOutcome) {
        self(outcome)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("chunk {0} was not fetched")]
    MissingChunk(usize),
}

/// Keeps payloads by `sequence_index` and concatenates them on demand.
#[derive(Debug)]
pub struct MemorySink {
    parts: Vec<Option<Vec<u8>>>,
    errors: Vec<(usize, FetchError)>,
}

impl MemorySink {
    pub fn new(chunk_count: usize) -> Self {
        Self {
            parts: (0..chunk_count).map(|_| None).collect(),
            errors: Vec::new(),
        }
    }

    /// Failed chunks with their errors, in arrival order.
    pub fn errors(&self) -> &[(usize, FetchError)] {
        &self.errors
    }

    pub fn received(&self) -> usize {
        self.parts.iter().filter(|p| p.is_some()).count()
    }

    /// Concatenates all chunks in `sequence_index` order.
    pub fn assemble(&self) -> Result<Vec<u8>, SinkError> {
        let total: usize = self.parts.iter().flatten().map(Vec::len).sum();
        let mut out = Vec::with_capacity(total);
        for (i, part) in self.parts.iter().enumerate() {
            match part {
                Some(bytes) => out.extend_from_slice(bytes),
                None => return Err(SinkError::MissingChunk(i)),
            }
        }
        Ok(out)
    }

    /// Writes the assembled resource to `path`, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<u64> {
        let bytes = self.assemble()?;
        fs::write(path, &bytes).with_context(|| format!("write {}", path.display()))?;
        Ok(bytes.len() as u64)
    }
}

impl ResultSink for MemorySink {
    fn accept(&mut self, outcome: ChunkOutcome) {
        let index = outcome.sequence_index();
        let Some(slot) = self.parts.get_mut(index) else {
            tracing::warn!(chunk = index, "outcome for unplanned chunk ignored");
            return;
        };
        match outcome.result {
            Ok(bytes) => *slot = Some(bytes),
            Err(e) => self.errors.push((index, e)),
        }
    }
}
