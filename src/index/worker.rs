//! Per-sub-partition scan.
//!
//! A worker walks its run of the partition buffer left to right, tracks the
//! byte offset of every unit through the [`ByteLengthTable`] and detects
//! line starts (LF, CR and CRLF all terminate a line). For every window of
//! the partition's [`EntryGrid`]s it reports the first candidate and the
//! first candidate in the window's second half. Choosing among those is
//! left to the leader, so what a worker reports depends only on the units
//! it was given, never on how many other workers there are.
//!
//! [`EntryGrid`]: crate::index::budget::EntryGrid

use crate::index::budget::EntryGrid;
use crate::index::types::{IndexEntry, PartialIndexResult, WindowHit, WorkUnit};
use crate::utils::{is_low_surrogate, ByteLengthTable, CR, LF};

/// Gathers window hits for one grid as candidates arrive in unit order
#[derive(Debug)]
struct HitCollector {
    grid: EntryGrid,
    hits: Vec<WindowHit>,
    /// First unit past the current window
    window_end: u64,
    backup_start: u64,
}

impl HitCollector {
    fn new(grid: EntryGrid) -> Self {
        Self {
            grid,
            hits: Vec::new(),
            window_end: 0,
            backup_start: 0,
        }
    }

    /// Offer the candidate at partition unit `position`
    fn offer(&mut self, position: u64, entry: IndexEntry) {
        if self.grid.is_empty() {
            return;
        }
        match self.hits.last_mut() {
            Some(hit) if position < self.window_end => {
                if hit.backup.is_none() && position >= self.backup_start {
                    hit.backup = Some(entry);
                }
            }
            _ => {
                let window = self.grid.window_of(position);
                self.window_end = self.grid.window_start(window + 1);
                self.backup_start = self.grid.backup_start(window);
                self.hits.push(WindowHit {
                    window,
                    first: entry,
                    backup: (position >= self.backup_start).then_some(entry),
                });
            }
        }
    }
}

/// True if a line begins at `buffer[index]`
fn begins_line(buffer: &[u16], index: usize, partition_starts_line: bool) -> bool {
    match index.checked_sub(1).map(|prev| buffer[prev]) {
        None => partition_starts_line,
        Some(LF) => true,
        Some(CR) => buffer[index] != LF,
        Some(_) => false,
    }
}

/// Scans sub-partitions using one encoding's byte-length table
#[derive(Debug, Clone, Copy)]
pub struct Worker<'a> {
    table: &'a ByteLengthTable,
}

impl<'a> Worker<'a> {
    pub fn new(table: &'a ByteLengthTable) -> Self {
        Self { table }
    }

    /// Scan `buffer[unit.start..unit.end()]` and report its window hits.
    ///
    /// `buffer` is the whole partition; units outside the assigned run are
    /// only looked at to classify line boundaries at its edges.
    pub fn run(&self, buffer: &[u16], unit: &WorkUnit) -> PartialIndexResult {
        let units = &buffer[unit.start..unit.end()];

        let mut chars = HitCollector::new(unit.char_grid);
        let mut lines = HitCollector::new(unit.line_grid);
        let mut last_char = None;
        let mut byte_pos = 0u64;
        let mut line_count = 0u64;

        for (i, &c) in units.iter().enumerate() {
            let index = unit.start + i;
            let position = index as u64;

            if begins_line(buffer, index, unit.starts_line) {
                lines.offer(position, IndexEntry::new(line_count, byte_pos));
            }

            // A low surrogate shares its position with the preceding high surrogate
            if !is_low_surrogate(c) {
                let entry = IndexEntry::new(i as u64, byte_pos);
                chars.offer(position, entry);
                last_char = Some(entry);
            }

            if c == LF || (c == CR && buffer.get(index + 1) != Some(&LF)) {
                line_count += 1;
            }

            byte_pos += self.table.byte_len(c);
        }

        PartialIndexResult {
            chars: chars.hits,
            lines: lines.hits,
            last_char,
            chars_read: units.len() as u64,
            lines_read: line_count,
            bytes_read: byte_pos,
        }
    }
}
