//! Entry-budget distribution.
//!
//! Each index type has a fixed maximum number of entries for the whole file.
//! The budget is handed out partition by partition in proportion to the
//! partition's byte size; fractional remainders and entries a partition
//! could not place are carried forward so the total converges on the
//! maximum without ever exceeding it.
//!
//! Inside a partition the quota is laid out as an [`EntryGrid`] of evenly
//! sized windows over the partition's code units. Placement depends only on
//! partition coordinates, so it does not matter how many workers share the
//! partition.

/// Running budget for one index type (characters or lines)
#[derive(Debug, Clone)]
pub struct EntryBudget {
    max_entries: usize,
    /// Nominal bytes between consecutive entries
    average_distance: u64,
    /// Fractional entries carried into the next partition (may be negative
    /// after a forced first entry)
    delta: f64,
    /// Entries budgeted for the previous partition but not emitted
    lost: usize,
    emitted: usize,
}

impl EntryBudget {
    pub fn new(data_bytes: u64, max_entries: usize) -> Self {
        let max = max_entries.max(1) as u64;
        Self {
            max_entries: max_entries.max(1),
            average_distance: data_bytes.div_ceil(max).max(1),
            delta: 0.0,
            lost: 0,
            emitted: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.max_entries - self.emitted
    }

    /// Integer quota for a partition of `partition_bytes` bytes.
    ///
    /// The first non-empty partition always receives at least one entry so
    /// ordinal 0 is indexed; the extra is borrowed from later partitions.
    pub fn partition_quota(&mut self, partition_bytes: u64) -> usize {
        let exact = partition_bytes as f64 / self.average_distance as f64
            + self.lost as f64
            + self.delta;
        self.lost = 0;

        let floor = exact.floor().max(0.0);
        let mut quota = floor as usize;
        self.delta = exact - floor;

        if quota == 0 && self.emitted == 0 && partition_bytes > 0 {
            quota = 1;
            self.delta -= 1.0;
        }

        quota.min(self.remaining())
    }

    /// Book what a partition actually emitted against what it was granted
    pub fn record(&mut self, quota: usize, emitted: usize) {
        debug_assert!(emitted <= quota);
        self.emitted += emitted;
        self.lost += quota.saturating_sub(emitted);
    }
}

/// A partition's quota laid out as consecutive windows over its code units.
///
/// Window `k` covers `[k * span / windows, (k + 1) * span / windows)`. Each
/// window holds at most one regular entry at its first candidate; the second
/// half of a window may hold a backup entry repaying a window that had no
/// candidate at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryGrid {
    windows: u64,
    span: u64,
}

impl EntryGrid {
    /// Grid for `quota` entries over `span` units; never more windows than
    /// units
    pub fn new(quota: usize, span: usize) -> Self {
        let span = span as u64;
        Self {
            windows: (quota as u64).min(span),
            span,
        }
    }

    pub fn windows(&self) -> u64 {
        self.windows
    }

    pub fn is_empty(&self) -> bool {
        self.windows == 0
    }

    /// First unit of window `k`; `window_start(windows)` is the span
    pub fn window_start(&self, k: u64) -> u64 {
        (k as u128 * self.span as u128 / self.windows as u128) as u64
    }

    /// Window containing unit `pos`. The grid must not be empty.
    pub fn window_of(&self, pos: u64) -> u64 {
        ((pos as u128 + 1) * self.windows as u128).div_ceil(self.span as u128) as u64 - 1
    }

    /// First unit of window `k` at which a backup entry may be placed
    pub fn backup_start(&self, k: u64) -> u64 {
        let start = self.window_start(k);
        let end = self.window_start(k + 1);
        start + (end - start).div_ceil(2)
    }
}
