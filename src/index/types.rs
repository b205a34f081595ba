use crate::index::budget::EntryGrid;

/// One sparse index entry: the byte offset at which an ordinal starts.
///
/// Used for both the character and the line index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexEntry {
    pub ordinal: u64,
    pub byte_position: u64,
}

impl IndexEntry {
    pub fn new(ordinal: u64, byte_position: u64) -> Self {
        Self {
            ordinal,
            byte_position,
        }
    }

    /// Shift a worker-local entry into file coordinates
    #[inline]
    pub fn translate(self, ordinal_offset: u64, byte_offset: u64) -> Self {
        Self {
            ordinal: self.ordinal + ordinal_offset,
            byte_position: self.byte_position + byte_offset,
        }
    }
}

/// Ordinal-to-byte mapping with strictly increasing ordinals and positions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseIndex {
    entries: Vec<IndexEntry>,
}

impl SparseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append an entry; entries must arrive in file order
    pub(crate) fn push(&mut self, entry: IndexEntry) {
        debug_assert!(
            self.entries.last().is_none_or(|last| {
                last.ordinal < entry.ordinal && last.byte_position < entry.byte_position
            }),
            "out-of-order index entry {:?} after {:?}",
            entry,
            self.entries.last()
        );
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<IndexEntry> {
        self.entries.last().copied()
    }

    /// Byte position stored for exactly `ordinal`, if indexed
    pub fn get(&self, ordinal: u64) -> Option<u64> {
        self.entries
            .binary_search_by_key(&ordinal, |e| e.ordinal)
            .ok()
            .map(|i| self.entries[i].byte_position)
    }

    /// Greatest indexed entry whose ordinal is `<= target`
    pub fn nearest_at_or_before(&self, target: u64) -> Option<IndexEntry> {
        let idx = self.entries.partition_point(|e| e.ordinal <= target);
        if idx == 0 {
            None
        } else {
            Some(self.entries[idx - 1])
        }
    }
}

/// The finished, query-ready result of one indexing run
#[derive(Debug, Clone, Default)]
pub struct TextIndex {
    pub chars: SparseIndex,
    pub lines: SparseIndex,
    pub total_chars: u64,
    pub total_lines: u64,
    /// File offset of the first indexed byte (after the skipped header)
    pub data_start: u64,
    /// File offset one past the last indexed byte
    pub data_end: u64,
}

impl TextIndex {
    pub fn empty(data_start: u64) -> Self {
        Self {
            data_start,
            data_end: data_start,
            ..Default::default()
        }
    }
}

/// One worker's assignment within the current partition buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkUnit {
    /// Position in assignment (and merge) order
    pub worker: usize,
    pub start: usize,
    pub len: usize,
    /// Character windows of the whole partition
    pub char_grid: EntryGrid,
    /// Line windows of the whole partition
    pub line_grid: EntryGrid,
    /// The partition's first unit begins a line
    pub starts_line: bool,
}

impl WorkUnit {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Plan for one partition, recomputed for every read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPlan {
    pub chars: usize,
    pub bytes: u64,
    pub char_quota: usize,
    pub line_quota: usize,
    pub units: Vec<WorkUnit>,
}

/// Index candidates a worker found in one grid window.
///
/// `first` is the earliest candidate the worker saw in the window and
/// `backup` the earliest one in the window's second half (possibly the same
/// entry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHit {
    pub window: u64,
    pub first: IndexEntry,
    pub backup: Option<IndexEntry>,
}

impl WindowHit {
    pub fn translate(self, ordinal_offset: u64, byte_offset: u64) -> Self {
        Self {
            window: self.window,
            first: self.first.translate(ordinal_offset, byte_offset),
            backup: self.backup.map(|e| e.translate(ordinal_offset, byte_offset)),
        }
    }
}

/// A worker's output, in coordinates relative to its sub-partition start
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialIndexResult {
    pub chars: Vec<WindowHit>,
    pub lines: Vec<WindowHit>,
    /// Last character that starts inside the sub-partition
    pub last_char: Option<IndexEntry>,
    pub chars_read: u64,
    /// Line terminators seen
    pub lines_read: u64,
    pub bytes_read: u64,
}
