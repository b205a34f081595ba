//! Text encodings supported by the indexer.
//!
//! Positions are tracked in UTF-16 code units: a supplementary character is
//! two ordinals (high + low surrogate), but only the high surrogate carries a
//! byte position. The [`ByteLengthTable`] therefore maps a high surrogate to
//! the full encoded length of the pair and a low surrogate to zero.

use crate::error::TextIndexError;
use crate::Result;
use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

pub const CR: u16 = b'\r' as u16;
pub const LF: u16 = b'\n' as u16;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

#[inline]
pub fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

#[inline]
pub fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// Encodings whose byte length is a pure function of the decoded code unit.
///
/// This is the allow-list: stateful or ambiguous encodings (ISO-2022, BOM
/// sniffing "UTF-16") are rejected by [`Encoding::from_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Iso8859_1,
    UsAscii,
}

impl Encoding {
    pub const ALL: [Encoding; 5] = [
        Encoding::Utf8,
        Encoding::Utf16Le,
        Encoding::Utf16Be,
        Encoding::Iso8859_1,
        Encoding::UsAscii,
    ];

    /// Resolve a charset label, case-insensitively
    pub fn from_name(name: &str) -> Result<Self> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(|c| c.to_lowercase())
            .collect();

        match normalized.as_str() {
            "utf8" => Ok(Encoding::Utf8),
            "utf16le" => Ok(Encoding::Utf16Le),
            "utf16be" => Ok(Encoding::Utf16Be),
            "iso88591" | "latin1" | "l1" | "cp819" => Ok(Encoding::Iso8859_1),
            "usascii" | "ascii" => Ok(Encoding::UsAscii),
            _ => Err(TextIndexError::config(format!(
                "encoding '{}' is not supported for indexing",
                name
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Iso8859_1 => "ISO-8859-1",
            Encoding::UsAscii => "US-ASCII",
        }
    }

    /// Byte-order mark for this encoding (empty for single-byte encodings)
    pub fn bom(&self) -> &'static [u8] {
        match self {
            Encoding::Utf8 => UTF8_BOM,
            Encoding::Utf16Le => UTF16LE_BOM,
            Encoding::Utf16Be => UTF16BE_BOM,
            Encoding::Iso8859_1 | Encoding::UsAscii => &[],
        }
    }

    /// Length of this encoding's BOM if `prefix` starts with it, else 0
    pub fn detect_bom_len(&self, prefix: &[u8]) -> u64 {
        let bom = self.bom();
        if !bom.is_empty() && prefix.starts_with(bom) {
            bom.len() as u64
        } else {
            0
        }
    }

    /// Smallest number of bytes a single code unit can occupy
    pub fn min_unit_bytes(&self) -> usize {
        match self {
            Encoding::Utf16Le | Encoding::Utf16Be => 2,
            _ => 1,
        }
    }

    /// Decode one character from the front of `raw`
    pub(crate) fn decode_char(&self, raw: &[u8]) -> Decoded {
        match self {
            Encoding::Utf8 => decode_utf8(raw),
            Encoding::Utf16Le => decode_utf16(raw, u16::from_le_bytes),
            Encoding::Utf16Be => decode_utf16(raw, u16::from_be_bytes),
            Encoding::Iso8859_1 => match raw.first() {
                Some(&b) => Decoded::One(b as u16, 1),
                None => Decoded::Incomplete,
            },
            Encoding::UsAscii => match raw.first() {
                Some(&b) if b < 0x80 => Decoded::One(b as u16, 1),
                Some(_) => Decoded::Malformed,
                None => Decoded::Incomplete,
            },
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = TextIndexError;

    fn from_str(s: &str) -> Result<Self> {
        Encoding::from_name(s)
    }
}

/// Outcome of decoding one character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decoded {
    /// A BMP character: unit, bytes consumed
    One(u16, usize),
    /// A supplementary character: high, low, bytes consumed
    Pair(u16, u16, usize),
    /// More bytes are needed
    Incomplete,
    Malformed,
}

fn decode_utf8(raw: &[u8]) -> Decoded {
    let Some(&b0) = raw.first() else {
        return Decoded::Incomplete;
    };
    if b0 < 0x80 {
        return Decoded::One(b0 as u16, 1);
    }

    // (sequence length, allowed range of the second byte)
    let (need, lo, hi) = match b0 {
        0xC2..=0xDF => (2, 0x80, 0xBF),
        0xE0 => (3, 0xA0, 0xBF),
        0xE1..=0xEC | 0xEE..=0xEF => (3, 0x80, 0xBF),
        0xED => (3, 0x80, 0x9F),
        0xF0 => (4, 0x90, 0xBF),
        0xF1..=0xF3 => (4, 0x80, 0xBF),
        0xF4 => (4, 0x80, 0x8F),
        _ => return Decoded::Malformed,
    };

    for (i, &b) in raw.iter().enumerate().take(need).skip(1) {
        let ok = if i == 1 {
            (lo..=hi).contains(&b)
        } else {
            (0x80..=0xBF).contains(&b)
        };
        if !ok {
            return Decoded::Malformed;
        }
    }
    if raw.len() < need {
        return Decoded::Incomplete;
    }

    let cp = match need {
        2 => ((b0 as u32 & 0x1F) << 6) | (raw[1] as u32 & 0x3F),
        3 => ((b0 as u32 & 0x0F) << 12) | ((raw[1] as u32 & 0x3F) << 6) | (raw[2] as u32 & 0x3F),
        _ => {
            ((b0 as u32 & 0x07) << 18)
                | ((raw[1] as u32 & 0x3F) << 12)
                | ((raw[2] as u32 & 0x3F) << 6)
                | (raw[3] as u32 & 0x3F)
        }
    };

    let Some(c) = char::from_u32(cp) else {
        return Decoded::Malformed;
    };
    let mut units = [0u16; 2];
    match *c.encode_utf16(&mut units) {
        [unit] => Decoded::One(unit, need),
        [high, low] => Decoded::Pair(high, low, need),
        _ => Decoded::Malformed,
    }
}

fn decode_utf16(raw: &[u8], read: fn([u8; 2]) -> u16) -> Decoded {
    if raw.len() < 2 {
        return Decoded::Incomplete;
    }
    let unit = read([raw[0], raw[1]]);
    if is_low_surrogate(unit) {
        return Decoded::Malformed;
    }
    if !is_high_surrogate(unit) {
        return Decoded::One(unit, 2);
    }
    if raw.len() < 4 {
        return Decoded::Incomplete;
    }
    let low = read([raw[2], raw[3]]);
    match char::decode_utf16([unit, low]).next() {
        Some(Ok(_)) => Decoded::Pair(unit, low, 4),
        _ => Decoded::Malformed,
    }
}

/// Code unit to encoded byte length, one entry per possible `u16`
#[derive(Clone)]
pub struct ByteLengthTable {
    encoding: Encoding,
    lengths: Box<[u8]>,
}

impl ByteLengthTable {
    pub fn new(encoding: Encoding) -> Self {
        let lengths: Vec<u8> = (0..=u16::MAX)
            .map(|unit| unit_byte_len(encoding, unit))
            .collect();

        Self {
            encoding,
            lengths: lengths.into_boxed_slice(),
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    #[inline]
    pub fn byte_len(&self, unit: u16) -> u64 {
        self.lengths[unit as usize] as u64
    }

    /// Total encoded length of a run of code units
    pub fn encoded_len(&self, units: &[u16]) -> u64 {
        units.iter().map(|&u| self.byte_len(u)).sum()
    }
}

impl fmt::Debug for ByteLengthTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteLengthTable")
            .field("encoding", &self.encoding)
            .finish()
    }
}

fn unit_byte_len(encoding: Encoding, unit: u16) -> u8 {
    match encoding {
        Encoding::Utf8 => match unit {
            0x0000..=0x007F => 1,
            0x0080..=0x07FF => 2,
            0xD800..=0xDBFF => 4,
            0xDC00..=0xDFFF => 0,
            _ => 3,
        },
        Encoding::Utf16Le | Encoding::Utf16Be => {
            if is_high_surrogate(unit) {
                4
            } else if is_low_surrogate(unit) {
                0
            } else {
                2
            }
        }
        Encoding::Iso8859_1 | Encoding::UsAscii => 1,
    }
}

/// Incremental decoder from raw bytes to UTF-16 code units.
///
/// Owns the raw read buffer; the underlying reader is read in chunks of the
/// buffer's capacity.
pub struct CharDecoder<R> {
    inner: R,
    encoding: Encoding,
    raw: Vec<u8>,
    start: usize,
    end: usize,
    /// Absolute file offset of `raw[start]`
    position: u64,
    eof: bool,
}

impl<R: Read> CharDecoder<R> {
    /// `position` is the absolute file offset `inner` starts reading at
    pub fn new(inner: R, encoding: Encoding, position: u64, buffer_size: usize) -> Self {
        Self {
            inner,
            encoding,
            raw: vec![0u8; buffer_size.max(8)],
            start: 0,
            end: 0,
            position,
            eof: false,
        }
    }

    /// File offset of the next undecoded byte
    pub fn position(&self) -> u64 {
        self.position
    }

    /// True once every byte of the input has been decoded
    pub fn is_finished(&self) -> bool {
        self.eof && self.start == self.end
    }

    /// True if the input ended part way through a character
    pub fn has_dangling_input(&self) -> bool {
        self.eof && self.start < self.end
    }

    /// Append up to `max_units` code units to `out`, returning how many were
    /// appended. A surrogate pair is never split: if only one slot is left
    /// and the next character needs two, decoding stops early.
    ///
    /// Units decoded before bad input are handed out first; the error is
    /// reported by the call that cannot make any progress.
    pub fn fill(&mut self, out: &mut Vec<u16>, max_units: usize) -> Result<usize> {
        debug_assert!(max_units >= 2 || max_units == 0);
        let initial = out.len();
        let target = initial + max_units;

        while out.len() < target {
            match self.encoding.decode_char(&self.raw[self.start..self.end]) {
                Decoded::One(unit, n) => {
                    out.push(unit);
                    self.advance(n);
                }
                Decoded::Pair(high, low, n) => {
                    if target - out.len() < 2 {
                        break;
                    }
                    out.push(high);
                    out.push(low);
                    self.advance(n);
                }
                Decoded::Incomplete => {
                    if !self.refill()? {
                        if self.start == self.end {
                            break;
                        }
                        return self.fail(out.len() - initial);
                    }
                }
                Decoded::Malformed => return self.fail(out.len() - initial),
            }
        }

        Ok(out.len() - initial)
    }

    fn fail(&self, decoded: usize) -> Result<usize> {
        if decoded > 0 {
            Ok(decoded)
        } else {
            Err(self.malformed())
        }
    }

    #[inline]
    fn advance(&mut self, n: usize) {
        self.start += n;
        self.position += n as u64;
    }

    fn malformed(&self) -> TextIndexError {
        TextIndexError::Malformed {
            encoding: self.encoding,
            position: self.position,
        }
    }

    /// Compact the unread tail to the front and read more bytes.
    /// Returns false once the reader is exhausted.
    fn refill(&mut self) -> io::Result<bool> {
        if self.eof {
            return Ok(false);
        }
        if self.start > 0 {
            self.raw.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        loop {
            match self.inner.read(&mut self.raw[self.end..]) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(false);
                }
                Ok(n) => {
                    self.end += n;
                    return Ok(true);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}
