//! Positioned reader over the decoded text of a file.

use crate::utils::{
    is_high_surrogate, is_low_surrogate, ByteLengthTable, ByteSource, CharDecoder, Encoding, CR,
    LF,
};
use crate::Result;
use std::io::{self, Read};
use std::sync::Arc;

/// A reader opened at a known byte offset that keeps track of the file
/// position of the next unread character.
///
/// Implements [`Read`] by re-encoding the decoded text as UTF-8, so the
/// usual `read_to_string` and `BufReader` adapters work for any source
/// encoding. The caller owns the reader; dropping it closes the file.
pub struct TextReader {
    decoder: CharDecoder<Box<dyn Read + Send>>,
    table: Arc<ByteLengthTable>,
    units: Vec<u16>,
    next: usize,
    chunk: usize,
    /// File offset of `units[next]`
    position: u64,
    spill: [u8; 4],
    spill_pos: usize,
    spill_len: usize,
}

impl TextReader {
    pub(crate) fn open(
        source: &dyn ByteSource,
        table: Arc<ByteLengthTable>,
        offset: u64,
        buffer_size: usize,
    ) -> Result<Self> {
        let reader = source.open_at(offset)?;
        let encoding = table.encoding();
        let chunk = (buffer_size / encoding.min_unit_bytes()).max(2);
        Ok(Self {
            decoder: CharDecoder::new(reader, encoding, offset, buffer_size),
            table,
            units: Vec::with_capacity(chunk),
            next: 0,
            chunk,
            position: offset,
            spill: [0; 4],
            spill_pos: 0,
            spill_len: 0,
        })
    }

    /// File offset of the next character this reader will return
    pub fn file_position(&self) -> u64 {
        self.position
    }

    pub fn encoding(&self) -> Encoding {
        self.table.encoding()
    }

    /// True if the file ended part way through a character
    pub(crate) fn ended_mid_character(&self) -> bool {
        self.decoder.has_dangling_input()
    }

    fn ensure_units(&mut self) -> Result<bool> {
        if self.next < self.units.len() {
            return Ok(true);
        }
        self.units.clear();
        self.next = 0;
        self.decoder.fill(&mut self.units, self.chunk)?;
        Ok(!self.units.is_empty())
    }

    /// Next UTF-16 code unit without consuming it
    pub fn peek_unit(&mut self) -> Result<Option<u16>> {
        if !self.ensure_units()? {
            return Ok(None);
        }
        Ok(Some(self.units[self.next]))
    }

    /// Consume the next UTF-16 code unit
    pub fn next_unit(&mut self) -> Result<Option<u16>> {
        if !self.ensure_units()? {
            return Ok(None);
        }
        let unit = self.units[self.next];
        self.next += 1;
        self.position += self.table.byte_len(unit);
        Ok(Some(unit))
    }

    /// Skip up to `count` code units; returns how many were skipped
    pub fn skip_units(&mut self, count: u64) -> Result<u64> {
        let mut skipped = 0;
        while skipped < count {
            if !self.ensure_units()? {
                break;
            }
            let available = (self.units.len() - self.next) as u64;
            let take = available.min(count - skipped) as usize;
            let end = self.next + take;
            self.position += self.table.encoded_len(&self.units[self.next..end]);
            self.next = end;
            skipped += take as u64;
        }
        Ok(skipped)
    }

    /// Skip past `count` line terminators (LF, CR or CRLF); returns how many
    /// were found before end of input
    pub fn skip_lines(&mut self, count: u64) -> Result<u64> {
        let mut found = 0;
        while found < count {
            let Some(unit) = self.next_unit()? else {
                break;
            };
            if unit == LF {
                found += 1;
            } else if unit == CR {
                if self.peek_unit()? == Some(LF) {
                    self.next_unit()?;
                }
                found += 1;
            }
        }
        Ok(found)
    }

    /// Next full character; unpaired surrogates read as U+FFFD
    pub fn read_char(&mut self) -> Result<Option<char>> {
        let Some(unit) = self.next_unit()? else {
            return Ok(None);
        };
        let decoded = if is_high_surrogate(unit) {
            match self.peek_unit()? {
                Some(low) if is_low_surrogate(low) => {
                    self.next_unit()?;
                    char::decode_utf16([unit, low]).next()
                }
                _ => None,
            }
        } else {
            char::decode_utf16([unit]).next()
        };
        Ok(Some(
            decoded
                .and_then(|c| c.ok())
                .unwrap_or(char::REPLACEMENT_CHARACTER),
        ))
    }

    /// Append the rest of the current line, terminator included, to `buf`.
    /// Returns the number of bytes appended; 0 at end of input.
    pub fn read_line(&mut self, buf: &mut String) -> Result<usize> {
        let before = buf.len();
        while let Some(c) = self.read_char()? {
            buf.push(c);
            if c == '\n' {
                break;
            }
            if c == '\r' {
                if self.peek_unit()? == Some(LF) {
                    self.next_unit()?;
                    buf.push('\n');
                }
                break;
            }
        }
        Ok(buf.len() - before)
    }
}

impl Read for TextReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            if self.spill_pos < self.spill_len {
                let n = (self.spill_len - self.spill_pos).min(buf.len() - written);
                buf[written..written + n]
                    .copy_from_slice(&self.spill[self.spill_pos..self.spill_pos + n]);
                self.spill_pos += n;
                written += n;
                continue;
            }
            match self.read_char().map_err(io::Error::from)? {
                Some(c) => {
                    self.spill_len = c.encode_utf8(&mut self.spill).len();
                    self.spill_pos = 0;
                }
                None => break,
            }
        }
        Ok(written)
    }
}
