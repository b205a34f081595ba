use crate::access::TextFileAccessor;
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

/// Snapshot of an accessor's index, suitable for printing or JSON output
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IndexSummary {
    pub path: PathBuf,
    pub encoding: String,
    pub file_size: u64,
    pub header_skip_bytes: u64,
    pub characters: u64,
    pub lines: u64,
    pub char_index_entries: usize,
    pub line_index_entries: usize,
    pub max_char_index_entries: usize,
    pub max_line_index_entries: usize,
}

impl IndexSummary {
    /// Average characters between consecutive character entries
    pub fn chars_per_entry(&self) -> f64 {
        ratio(self.characters, self.char_index_entries)
    }

    pub fn lines_per_entry(&self) -> f64 {
        ratio(self.lines, self.line_index_entries)
    }
}

fn ratio(count: u64, entries: usize) -> f64 {
    if entries == 0 {
        0.0
    } else {
        count as f64 / entries as f64
    }
}

/// Display index statistics
pub fn show_stats(accessor: &TextFileAccessor, json: bool) -> Result<()> {
    let summary = accessor.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Index Statistics");
    println!("================");
    println!();
    println!("File:             {}", summary.path.display());
    println!("Encoding:         {}", summary.encoding);
    println!("File size:        {}", format_size(summary.file_size));
    if summary.header_skip_bytes > 0 {
        println!("Header skipped:   {} bytes", summary.header_skip_bytes);
    }
    println!("Characters:       {}", summary.characters);
    println!("Lines:            {}", summary.lines);

    println!();
    println!("Index entries:");
    println!(
        "  chars  {:>8} / {:<8} (1 per {:.1} chars)",
        summary.char_index_entries,
        summary.max_char_index_entries,
        summary.chars_per_entry()
    );
    println!(
        "  lines  {:>8} / {:<8} (1 per {:.1} lines)",
        summary.line_index_entries,
        summary.max_line_index_entries,
        summary.lines_per_entry()
    );

    Ok(())
}

/// Format byte size to human readable
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
