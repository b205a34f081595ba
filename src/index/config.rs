use crate::error::TextIndexError;
use crate::utils::ReadStrategy;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunable knobs for one indexing run.
///
/// JSON keys use the camelCase option names (`maxCharIndexEntries`, ...);
/// missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexConfig {
    /// Upper bound on character-index entries
    pub max_char_index_entries: usize,
    /// Upper bound on line-index entries
    pub max_line_index_entries: usize,
    /// Buffer size of readers handed out to callers
    pub child_reader_buffer_size: usize,
    /// Code units decoded per partition
    pub char_buffer_size: usize,
    /// Partitions smaller than this many bytes are scanned by a single worker
    pub multi_threading_threshold: u64,
    /// Raw read buffer of the indexing pass
    pub indexer_read_buffer_size: usize,
    pub read_strategy: ReadStrategy,
    /// Leading bytes to skip (byte-order mark or other header)
    pub header_skip_bytes: u64,
    /// Worker pool size (0 = available parallelism)
    pub worker_threads: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_char_index_entries: 10_000,
            max_line_index_entries: 10_000,
            child_reader_buffer_size: 2048,
            char_buffer_size: 2_500_000,
            multi_threading_threshold: 50_000,
            indexer_read_buffer_size: 50 * 1024 * 1024,
            read_strategy: ReadStrategy::Buffered,
            header_skip_bytes: 0,
            worker_threads: 0,
        }
    }
}

impl IndexConfig {
    /// Load a JSON config file; unknown keys are ignored
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: IndexConfig = serde_json::from_str(content)
            .map_err(|e| TextIndexError::config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_char_index_entries < 1 {
            return Err(TextIndexError::config("maxCharIndexEntries must be at least 1"));
        }
        if self.max_line_index_entries < 1 {
            return Err(TextIndexError::config("maxLineIndexEntries must be at least 1"));
        }
        // A trailing CR or high surrogate is carried into the next partition,
        // so a partition has to hold at least two units.
        if self.char_buffer_size < 2 {
            return Err(TextIndexError::config("charBufferSize must be at least 2"));
        }
        if self.indexer_read_buffer_size == 0 {
            return Err(TextIndexError::config("indexerReadBufferSize must be positive"));
        }
        Ok(())
    }

    /// Resolve `worker_threads == 0` to the machine's parallelism
    pub fn effective_worker_threads(&self) -> usize {
        if self.worker_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.worker_threads
        }
    }

    pub fn with_max_entries(mut self, chars: usize, lines: usize) -> Self {
        self.max_char_index_entries = chars;
        self.max_line_index_entries = lines;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    pub fn with_header_skip(mut self, bytes: u64) -> Self {
        self.header_skip_bytes = bytes;
        self
    }
}
