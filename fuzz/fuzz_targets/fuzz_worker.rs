#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use textdex::index::leader::split_bounds;
use textdex::index::{EntryGrid, PartialIndexResult, WorkUnit, Worker};
use textdex::utils::{ByteLengthTable, Encoding};

#[derive(Arbitrary, Debug)]
struct Input {
    text: String,
    char_quota: u8,
    line_quota: u8,
    parts: u8,
}

fn scan(
    table: &ByteLengthTable,
    units: &[u16],
    bounds: &[(usize, usize)],
    input: &Input,
) -> Vec<PartialIndexResult> {
    let char_grid = EntryGrid::new(input.char_quota as usize, units.len());
    let line_grid = EntryGrid::new(input.line_quota as usize, units.len());
    bounds
        .iter()
        .enumerate()
        .map(|(worker, &(start, len))| {
            let unit = WorkUnit {
                worker,
                start,
                len,
                char_grid,
                line_grid,
                starts_line: true,
            };
            Worker::new(table).run(units, &unit)
        })
        .collect()
}

/// First candidate per window across all results, in file coordinates
fn firsts(results: &[PartialIndexResult], lines: bool) -> Vec<(u64, u64, u64)> {
    let mut out: Vec<(u64, u64, u64)> = Vec::new();
    let (mut ordinals, mut bytes) = (0, 0);
    for result in results {
        let hits = if lines { &result.lines } else { &result.chars };
        for hit in hits {
            if out.last().is_none_or(|last| last.0 != hit.window) {
                let first = hit.first.translate(ordinals, bytes);
                out.push((hit.window, first.ordinal, first.byte_position));
            }
        }
        ordinals += if lines { result.lines_read } else { result.chars_read };
        bytes += result.bytes_read;
    }
    out
}

fuzz_target!(|input: Input| {
    let table = ByteLengthTable::new(Encoding::Utf8);
    let units: Vec<u16> = input.text.encode_utf16().collect();

    let whole = scan(&table, &units, &split_bounds(&units, 1), &input);
    let split = scan(&table, &units, &split_bounds(&units, input.parts as usize), &input);

    let bytes: u64 = split.iter().map(|r| r.bytes_read).sum();
    assert_eq!(bytes, input.text.len() as u64);
    assert_eq!(
        whole.iter().map(|r| r.lines_read).sum::<u64>(),
        split.iter().map(|r| r.lines_read).sum::<u64>()
    );

    for result in &split {
        assert!(result.chars.windows(2).all(|w| w[0].window < w[1].window));
        assert!(result.lines.windows(2).all(|w| w[0].window < w[1].window));
    }

    // Splitting the run never moves a window's first candidate
    assert_eq!(firsts(&whole, false), firsts(&split, false));
    assert_eq!(firsts(&whole, true), firsts(&split, true));

    for (_, ordinal, byte_position) in firsts(&whole, false) {
        let prefix: String = char::decode_utf16(units[..ordinal as usize].iter().copied())
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
        assert_eq!(prefix.len() as u64, byte_position);
    }
});
