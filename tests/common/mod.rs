//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::io::Write;
use tempfile::NamedTempFile;
use textdex::IndexConfig;

/// Write `content` to a fresh temp file
pub fn temp_file(content: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content).expect("Failed to write temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

/// Tiny partitions and a low threshold so even short texts are split
/// across several partitions and workers
pub fn stress_config(threads: usize) -> IndexConfig {
    IndexConfig {
        max_char_index_entries: 37,
        max_line_index_entries: 23,
        child_reader_buffer_size: 16,
        char_buffer_size: 64,
        multi_threading_threshold: 16,
        indexer_read_buffer_size: 128,
        worker_threads: threads,
        ..IndexConfig::default()
    }
}

/// Deterministic text mixing scripts, surrogate pairs and all three line
/// terminators
pub fn mixed_text(pieces: usize) -> String {
    const PIECES: [&str; 12] = [
        "alpha", "βeta", "日本語", "😀", "\n", "\r\n", "\r", " ", "x", "ünï", "𝄞𝄞", "\n\n",
    ];
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut text = String::new();
    for _ in 0..pieces {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        text.push_str(PIECES[(state >> 33) as usize % PIECES.len()]);
    }
    text
}

/// Byte offset of every UTF-16 ordinal; `None` for low surrogates
pub fn char_positions(text: &str) -> Vec<Option<u64>> {
    let mut positions = Vec::new();
    let mut pos = 0u64;
    for c in text.chars() {
        positions.push(Some(pos));
        if c.len_utf16() == 2 {
            positions.push(None);
        }
        pos += c.len_utf8() as u64;
    }
    positions
}

/// Byte offset of every line start (LF, CR and CRLF terminate a line)
pub fn line_starts(text: &str) -> Vec<u64> {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return Vec::new();
    }
    let mut starts = vec![0u64];
    for (i, &b) in bytes.iter().enumerate() {
        let ends_line = b == b'\n' || (b == b'\r' && bytes.get(i + 1) != Some(&b'\n'));
        if ends_line {
            starts.push(i as u64 + 1);
        }
    }
    if starts.last() == Some(&(bytes.len() as u64)) {
        starts.pop();
    }
    starts
}
