//! Indexing run orchestration.
//!
//! The leader reads the file once as a sequence of character partitions.
//! For each partition it:
//! 1. Computes the partition's character and line entry quotas and lays
//!    them out as evenly sized windows over the partition's units
//! 2. Splits large partitions into one sub-partition per worker, never
//!    separating a CR from a following LF or a surrogate pair
//! 3. Scans the sub-partitions on the worker pool and waits for all of them
//! 4. Merges the window hits in assignment order using running offsets and
//!    picks the partition's entries from them
//!
//! Entry selection only sees window numbers and partition positions, so the
//! index comes out the same for any number of workers. Partitions are
//! strictly sequential, so the running offsets used to translate local
//! entries are never read while being updated.

use crate::error::TextIndexError;
use crate::index::budget::{EntryBudget, EntryGrid};
use crate::index::config::IndexConfig;
use crate::index::types::{
    IndexEntry, PartialIndexResult, PartitionPlan, SparseIndex, TextIndex, WindowHit, WorkUnit,
};
use crate::index::worker::Worker;
use crate::utils::{
    is_high_surrogate, ByteLengthTable, ByteSource, CharDecoder, IndexProgress, CR, LF,
};
use crate::Result;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, info};

/// Running merge state: the growing global indexes plus the totals of
/// everything merged so far
struct IndexMerger {
    chars: SparseIndex,
    lines: SparseIndex,
    offset_chars: u64,
    offset_lines: u64,
    offset_bytes: u64,
}

impl IndexMerger {
    fn new(data_start: u64, config: &IndexConfig) -> Self {
        Self {
            chars: SparseIndex::with_capacity(config.max_char_index_entries.min(1 << 20)),
            lines: SparseIndex::with_capacity(config.max_line_index_entries.min(1 << 20)),
            offset_chars: 0,
            offset_lines: 0,
            offset_bytes: data_start,
        }
    }

    /// Fold one partition's worker results into the global indexes and
    /// return how many character and line entries were placed
    fn merge(&mut self, plan: &PartitionPlan, results: &[PartialIndexResult]) -> (usize, usize) {
        let mut char_hits = Vec::new();
        let mut line_hits = Vec::new();
        let mut last_char = None;

        for result in results {
            char_hits.extend(
                result
                    .chars
                    .iter()
                    .map(|h| h.translate(self.offset_chars, self.offset_bytes)),
            );
            line_hits.extend(
                result
                    .lines
                    .iter()
                    .map(|h| h.translate(self.offset_lines, self.offset_bytes)),
            );
            if let Some(entry) = result.last_char {
                last_char = Some(entry.translate(self.offset_chars, self.offset_bytes));
            }
            self.offset_chars += result.chars_read;
            self.offset_lines += result.lines_read;
            self.offset_bytes += result.bytes_read;
        }

        let mut chars = select_entries(&char_hits);
        // The partition's last character is indexed if quota remains
        if let Some(last) = last_char {
            let room = chars.len() < plan.char_quota;
            if room && chars.last().is_none_or(|e| e.ordinal < last.ordinal) {
                chars.push(last);
            }
        }
        let lines = select_entries(&line_hits);

        for &entry in &chars {
            self.chars.push(entry);
        }
        for &entry in &lines {
            self.lines.push(entry);
        }
        (chars.len(), lines.len())
    }
}

/// Pick a partition's entries from the window hits of all its workers.
///
/// Hits arrive in position order. A window cut by a sub-partition boundary
/// shows up once per worker and keeps the earliest first candidate. Every
/// window without any candidate leaves one entry owed, and later windows
/// pay the debt back with their backup candidates.
fn select_entries(hits: &[WindowHit]) -> Vec<IndexEntry> {
    let mut merged: Vec<WindowHit> = Vec::with_capacity(hits.len());
    for hit in hits {
        match merged.last_mut() {
            Some(last) if last.window == hit.window => {
                if last.backup.is_none() {
                    last.backup = hit.backup;
                }
            }
            _ => merged.push(*hit),
        }
    }

    let mut entries = Vec::with_capacity(merged.len());
    let mut owed = 0u64;
    let mut next_window = 0u64;
    for hit in &merged {
        owed += hit.window - next_window;
        next_window = hit.window + 1;
        entries.push(hit.first);
        if owed > 0 {
            if let Some(backup) = hit.backup.filter(|b| *b != hit.first) {
                entries.push(backup);
                owed -= 1;
            }
        }
    }
    entries
}

/// Builds a [`TextIndex`] for one file
pub struct Leader<'a> {
    source: &'a dyn ByteSource,
    table: &'a ByteLengthTable,
    config: IndexConfig,
    progress: IndexProgress,
}

impl<'a> Leader<'a> {
    pub fn new(source: &'a dyn ByteSource, table: &'a ByteLengthTable, config: &IndexConfig) -> Self {
        Self {
            source,
            table,
            config: config.clone(),
            progress: IndexProgress::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: IndexProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Run the full indexing pass
    pub fn create_index(&self) -> Result<TextIndex> {
        self.config.validate()?;
        let started = Instant::now();

        let file_len = self.source.len()?;
        let data_start = self.config.header_skip_bytes;
        if data_start > file_len {
            return Err(TextIndexError::config(format!(
                "headerSkipBytes ({}) exceeds file size ({})",
                data_start, file_len
            )));
        }
        let data_bytes = file_len - data_start;
        self.progress.set_total(data_bytes);
        if data_bytes == 0 {
            return Ok(TextIndex::empty(data_start));
        }

        let pool = self.build_pool(data_bytes)?;
        let reader = self.source.open_at(data_start)?;
        let mut decoder = CharDecoder::new(
            reader,
            self.table.encoding(),
            data_start,
            self.config
                .indexer_read_buffer_size
                .min(usize::try_from(data_bytes).unwrap_or(usize::MAX)),
        );

        let mut char_budget = EntryBudget::new(data_bytes, self.config.max_char_index_entries);
        let mut line_budget = EntryBudget::new(data_bytes, self.config.max_line_index_entries);
        let mut merger = IndexMerger::new(data_start, &self.config);

        let mut buffer: Vec<u16> = Vec::with_capacity(self.config.char_buffer_size + 1);
        let mut carry: Option<u16> = None;
        let mut last_unit: Option<u16> = None;
        let mut partition = 0usize;

        loop {
            buffer.clear();
            let carried_bytes = match carry.take() {
                Some(unit) => {
                    buffer.push(unit);
                    self.table.byte_len(unit)
                }
                None => 0,
            };

            let before = decoder.position();
            let want = self.config.char_buffer_size.saturating_sub(buffer.len()).max(2);
            decoder.fill(&mut buffer, want)?;
            let at_eof = decoder.is_finished();
            let mut partition_bytes = carried_bytes + (decoder.position() - before);

            if buffer.is_empty() {
                break;
            }

            // A trailing CR is examined together with whatever follows it
            if !at_eof && buffer.len() > 1 && buffer.last() == Some(&CR) {
                carry = buffer.pop();
                partition_bytes -= self.table.byte_len(CR);
            }
            let starts_line = last_unit.is_none_or(|u| u == LF || u == CR);
            last_unit = buffer.last().copied();

            let plan = self.plan_partition(
                &buffer,
                partition_bytes,
                &mut char_budget,
                &mut line_budget,
                starts_line,
                pool.is_some(),
            );
            debug!(
                partition,
                chars = plan.chars,
                bytes = plan.bytes,
                workers = plan.units.len(),
                char_quota = plan.char_quota,
                line_quota = plan.line_quota,
                "indexing partition"
            );

            let results = self.dispatch(pool.as_ref(), &buffer, &plan)?;

            let (char_emitted, line_emitted) = merger.merge(&plan, &results);
            char_budget.record(plan.char_quota, char_emitted);
            line_budget.record(plan.line_quota, line_emitted);

            self.progress.advance(partition_bytes);
            partition += 1;

            if at_eof && carry.is_none() {
                break;
            }
        }

        let index = finish_index(merger, data_start, last_unit);
        self.progress.finish(format!(
            "{} chars, {} lines",
            index.total_chars, index.total_lines
        ));
        info!(
            chars = index.total_chars,
            lines = index.total_lines,
            char_entries = index.chars.len(),
            line_entries = index.lines.len(),
            partitions = partition,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "index built"
        );

        Ok(index)
    }

    fn build_pool(&self, data_bytes: u64) -> Result<Option<ThreadPool>> {
        let threads = self.config.effective_worker_threads();
        if threads <= 1 || data_bytes < self.config.multi_threading_threshold {
            return Ok(None);
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("textdex-worker-{}", i))
            .build()
            .map_err(|e| TextIndexError::Io(std::io::Error::other(e)))?;
        Ok(Some(pool))
    }

    /// Compute quotas and sub-partitions for the current buffer
    fn plan_partition(
        &self,
        buffer: &[u16],
        bytes: u64,
        char_budget: &mut EntryBudget,
        line_budget: &mut EntryBudget,
        starts_line: bool,
        parallel: bool,
    ) -> PartitionPlan {
        let char_quota = char_budget.partition_quota(bytes);
        let line_quota = line_budget.partition_quota(bytes);
        let char_grid = EntryGrid::new(char_quota, buffer.len());
        let line_grid = EntryGrid::new(line_quota, buffer.len());

        let parts = if parallel && bytes >= self.config.multi_threading_threshold {
            self.config.effective_worker_threads()
        } else {
            1
        };
        let units = split_bounds(buffer, parts)
            .into_iter()
            .enumerate()
            .map(|(worker, (start, len))| WorkUnit {
                worker,
                start,
                len,
                char_grid,
                line_grid,
                starts_line,
            })
            .collect();

        PartitionPlan {
            chars: buffer.len(),
            bytes,
            char_quota,
            line_quota,
            units,
        }
    }

    /// Run every work unit and wait for all of them; results come back in
    /// assignment order
    fn dispatch(
        &self,
        pool: Option<&ThreadPool>,
        buffer: &[u16],
        plan: &PartitionPlan,
    ) -> Result<Vec<PartialIndexResult>> {
        let worker = Worker::new(self.table);
        let run = |unit: &WorkUnit| -> Result<PartialIndexResult> {
            panic::catch_unwind(AssertUnwindSafe(|| worker.run(buffer, unit))).map_err(|payload| {
                TextIndexError::Worker {
                    worker: unit.worker,
                    message: panic_message(payload.as_ref()),
                }
            })
        };

        match pool {
            Some(pool) if plan.units.len() > 1 => {
                pool.install(|| plan.units.par_iter().map(run).collect())
            }
            _ => plan.units.iter().map(run).collect(),
        }
    }
}

/// Split `buffer` into at most `parts` non-empty runs of roughly equal size.
///
/// A run never ends on a CR or a high surrogate: that unit moves to the
/// start of the next run.
pub fn split_bounds(buffer: &[u16], parts: usize) -> Vec<(usize, usize)> {
    let n = buffer.len();
    let parts = parts.clamp(1, n.max(1));
    let mut bounds = Vec::with_capacity(parts);
    let mut start = 0;

    for j in 1..parts {
        let mut end = (j * n / parts).max(start);
        if end > start && (buffer[end - 1] == CR || is_high_surrogate(buffer[end - 1])) {
            end -= 1;
        }
        if end > start {
            bounds.push((start, end - start));
            start = end;
        }
    }
    if n > start {
        bounds.push((start, n - start));
    }
    bounds
}

/// Totals and clean-up once every partition has been merged
fn finish_index(merger: IndexMerger, data_start: u64, last_unit: Option<u16>) -> TextIndex {
    let IndexMerger {
        chars,
        lines,
        offset_chars,
        offset_lines,
        offset_bytes,
    } = merger;

    // A final line without terminator still counts as a line
    let total_lines = match last_unit {
        None => 0,
        Some(CR) | Some(LF) => offset_lines,
        Some(_) => offset_lines + 1,
    };

    TextIndex {
        chars,
        lines,
        total_chars: offset_chars,
        total_lines,
        data_start,
        data_end: offset_bytes,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
