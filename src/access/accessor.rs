use crate::access::cursor::Cursor;
use crate::access::reader::TextReader;
use crate::error::{OrdinalKind, TextIndexError};
use crate::index::{IndexConfig, IndexEntry, IndexSummary, Leader, SparseIndex, TextIndex};
use crate::utils::{open_source, ByteLengthTable, Encoding, FileSource, IndexProgress};
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Random access into one immutable text file by character or line ordinal.
///
/// Construction runs a full indexing pass; afterwards the accessor is
/// read-only and can be shared between threads. Lookups jump to the nearest
/// indexed ordinal at or before the target and decode forward from there.
#[derive(Debug)]
pub struct TextFileAccessor {
    path: PathBuf,
    source: FileSource,
    table: Arc<ByteLengthTable>,
    config: IndexConfig,
    index: TextIndex,
    file_size: u64,
}

impl TextFileAccessor {
    /// Index `path` with the default configuration
    pub fn open(path: impl AsRef<Path>, encoding: Encoding) -> Result<Self> {
        Self::open_with_config(path, encoding, IndexConfig::default())
    }

    pub fn open_with_config(
        path: impl AsRef<Path>,
        encoding: Encoding,
        config: IndexConfig,
    ) -> Result<Self> {
        Self::open_with_progress(path, encoding, config, IndexProgress::hidden())
    }

    /// Index `path`, reporting progress of the indexing pass
    pub fn open_with_progress(
        path: impl AsRef<Path>,
        encoding: Encoding,
        config: IndexConfig,
        progress: IndexProgress,
    ) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        let table = Arc::new(ByteLengthTable::new(encoding));

        let indexing_source = open_source(&path, config.read_strategy)?;
        let file_size = indexing_source.len()?;
        let index = Leader::new(indexing_source.as_ref(), &table, &config)
            .with_progress(progress)
            .create_index()?;

        Ok(Self {
            source: FileSource::new(&path),
            path,
            table,
            config,
            index,
            file_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn encoding(&self) -> Encoding {
        self.table.encoding()
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// File size in bytes at indexing time, header included
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn number_of_characters(&self) -> u64 {
        self.index.total_chars
    }

    pub fn number_of_lines(&self) -> u64 {
        self.index.total_lines
    }

    pub fn number_of_character_index_entries(&self) -> usize {
        self.index.chars.len()
    }

    pub fn number_of_line_index_entries(&self) -> usize {
        self.index.lines.len()
    }

    pub fn char_index(&self) -> &SparseIndex {
        &self.index.chars
    }

    pub fn line_index(&self) -> &SparseIndex {
        &self.index.lines
    }

    /// Scratch context recording the last resolved byte position
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self)
    }

    /// Byte offset at which character `n` starts
    pub fn file_position_at_char(&self, n: u64) -> Result<u64> {
        check_range(OrdinalKind::Char, n, self.index.total_chars)?;
        if let Some(pos) = self.index.chars.get(n) {
            return Ok(pos);
        }
        let reader = self.seek(OrdinalKind::Char, n, self.config.child_reader_buffer_size)?;
        Ok(reader.file_position())
    }

    /// Byte offset at which line `n` starts
    pub fn file_position_at_line(&self, n: u64) -> Result<u64> {
        check_range(OrdinalKind::Line, n, self.index.total_lines)?;
        if let Some(pos) = self.index.lines.get(n) {
            return Ok(pos);
        }
        let reader = self.seek(OrdinalKind::Line, n, self.config.child_reader_buffer_size)?;
        Ok(reader.file_position())
    }

    /// Reader positioned at character `n`
    pub fn reader_at_char(&self, n: u64) -> Result<TextReader> {
        self.reader_at_char_with_buffer(n, self.config.child_reader_buffer_size)
    }

    pub fn reader_at_char_with_buffer(&self, n: u64, buffer_size: usize) -> Result<TextReader> {
        check_range(OrdinalKind::Char, n, self.index.total_chars)?;
        self.seek(OrdinalKind::Char, n, buffer_size)
    }

    /// Reader positioned at the start of line `n`
    pub fn reader_at_line(&self, n: u64) -> Result<TextReader> {
        self.reader_at_line_with_buffer(n, self.config.child_reader_buffer_size)
    }

    pub fn reader_at_line_with_buffer(&self, n: u64, buffer_size: usize) -> Result<TextReader> {
        check_range(OrdinalKind::Line, n, self.index.total_lines)?;
        self.seek(OrdinalKind::Line, n, buffer_size)
    }

    /// Reader positioned at an absolute byte offset. The offset should be a
    /// character boundary, e.g. one returned by the position lookups.
    pub fn reader_at_file_position(&self, byte_position: u64) -> Result<TextReader> {
        self.reader_at_file_position_with_buffer(byte_position, self.config.child_reader_buffer_size)
    }

    pub fn reader_at_file_position_with_buffer(
        &self,
        byte_position: u64,
        buffer_size: usize,
    ) -> Result<TextReader> {
        if byte_position > self.file_size {
            return Err(TextIndexError::OutOfRange {
                kind: OrdinalKind::Byte,
                ordinal: byte_position,
                count: self.file_size,
            });
        }
        TextReader::open(&self.source, Arc::clone(&self.table), byte_position, buffer_size)
    }

    /// Text of line `n` without its terminator
    pub fn read_line(&self, n: u64) -> Result<String> {
        let mut reader = self.reader_at_line(n)?;
        let mut line = String::new();
        reader.read_line(&mut line)?;
        while line.ends_with(['\n', '\r']) {
            line.pop();
        }
        Ok(line)
    }

    pub fn summary(&self) -> IndexSummary {
        IndexSummary {
            path: self.path.clone(),
            encoding: self.encoding().name().to_string(),
            file_size: self.file_size,
            header_skip_bytes: self.index.data_start,
            characters: self.index.total_chars,
            lines: self.index.total_lines,
            char_index_entries: self.index.chars.len(),
            line_index_entries: self.index.lines.len(),
            max_char_index_entries: self.config.max_char_index_entries,
            max_line_index_entries: self.config.max_line_index_entries,
        }
    }

    /// Open a reader at the nearest indexed ordinal at or before `n` and
    /// skip forward to `n`. `n` must already be range-checked.
    fn seek(&self, kind: OrdinalKind, n: u64, buffer_size: usize) -> Result<TextReader> {
        let index = match kind {
            OrdinalKind::Line => &self.index.lines,
            _ => &self.index.chars,
        };
        let nearest = index
            .nearest_at_or_before(n)
            .unwrap_or(IndexEntry::new(0, self.index.data_start));

        let mut reader = TextReader::open(
            &self.source,
            Arc::clone(&self.table),
            nearest.byte_position,
            buffer_size,
        )?;

        let reached = match skip_to(&mut reader, kind, n - nearest.ordinal) {
            Ok(reached) => reached,
            // Cut off inside a character: the file shrank after indexing
            Err(TextIndexError::Malformed { .. }) if reader.ended_mid_character() => false,
            Err(err) => return Err(err),
        };
        if !reached {
            warn!(
                path = %self.path.display(),
                %kind,
                ordinal = n,
                position = reader.file_position(),
                "file is shorter than its index"
            );
            return Err(TextIndexError::Truncated {
                kind,
                ordinal: n,
                position: reader.file_position(),
            });
        }

        Ok(reader)
    }
}

/// Skip `wanted` characters or lines; false if the input ran out first
fn skip_to(reader: &mut TextReader, kind: OrdinalKind, wanted: u64) -> Result<bool> {
    let skipped = match kind {
        OrdinalKind::Line => reader.skip_lines(wanted)?,
        _ => reader.skip_units(wanted)?,
    };
    // A line can only start where there is text left to read
    Ok(skipped == wanted
        && (kind != OrdinalKind::Line || wanted == 0 || reader.peek_unit()?.is_some()))
}

fn check_range(kind: OrdinalKind, n: u64, count: u64) -> Result<()> {
    if n >= count {
        return Err(TextIndexError::OutOfRange {
            kind,
            ordinal: n,
            count,
        });
    }
    Ok(())
}

