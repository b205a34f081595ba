use crate::access::accessor::TextFileAccessor;
use crate::access::reader::TextReader;
use crate::Result;

/// Per-caller lookup context over a shared [`TextFileAccessor`].
///
/// Remembers the byte position of the most recent lookup. Separate cursors
/// never see each other's state, so each thread can hold its own.
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    accessor: &'a TextFileAccessor,
    last_position: Option<u64>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(accessor: &'a TextFileAccessor) -> Self {
        Self {
            accessor,
            last_position: None,
        }
    }

    pub fn accessor(&self) -> &'a TextFileAccessor {
        self.accessor
    }

    pub fn file_position_at_char(&mut self, n: u64) -> Result<u64> {
        let position = self.accessor.file_position_at_char(n)?;
        self.last_position = Some(position);
        Ok(position)
    }

    pub fn file_position_at_line(&mut self, n: u64) -> Result<u64> {
        let position = self.accessor.file_position_at_line(n)?;
        self.last_position = Some(position);
        Ok(position)
    }

    pub fn reader_at_char(&mut self, n: u64) -> Result<TextReader> {
        let reader = self.accessor.reader_at_char(n)?;
        self.last_position = Some(reader.file_position());
        Ok(reader)
    }

    pub fn reader_at_line(&mut self, n: u64) -> Result<TextReader> {
        let reader = self.accessor.reader_at_line(n)?;
        self.last_position = Some(reader.file_position());
        Ok(reader)
    }

    pub fn reader_at_file_position(&mut self, byte_position: u64) -> Result<TextReader> {
        let reader = self.accessor.reader_at_file_position(byte_position)?;
        self.last_position = Some(byte_position);
        Ok(reader)
    }

    /// Byte position resolved by the last successful lookup
    pub fn last_known_file_position(&self) -> Option<u64> {
        self.last_position
    }

    /// Forget the recorded position
    pub fn cleanup(&mut self) {
        self.last_position = None;
    }
}
