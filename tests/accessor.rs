//! End-to-end behavior of `TextFileAccessor` on files written to disk.

mod common;

use common::temp_file;
use std::io::Read;
use textdex::{Encoding, IndexConfig, OrdinalKind, ReadStrategy, TextFileAccessor, TextIndexError};

#[test]
fn test_three_line_ascii_file() {
    let file = temp_file(b"foo\nbar\nbaz");
    let config = IndexConfig::default().with_max_entries(3, 3);
    let accessor = TextFileAccessor::open_with_config(file.path(), Encoding::UsAscii, config).unwrap();

    assert_eq!(accessor.file_size(), 11);
    assert_eq!(accessor.number_of_lines(), 3);
    assert_eq!(accessor.number_of_characters(), 11);
    assert_eq!(accessor.file_position_at_line(1).unwrap(), 4);
    assert_eq!(accessor.file_position_at_line(2).unwrap(), 8);
    assert_eq!(accessor.file_position_at_char(8).unwrap(), 8);
    assert!(accessor.number_of_character_index_entries() <= 3);
    assert!(accessor.number_of_line_index_entries() <= 3);

    match accessor.file_position_at_line(3) {
        Err(TextIndexError::OutOfRange { kind, ordinal, count }) => {
            assert_eq!(kind, OrdinalKind::Line);
            assert_eq!(ordinal, 3);
            assert_eq!(count, 3);
        }
        other => panic!("expected OutOfRange, got {:?}", other),
    }
    assert!(matches!(
        accessor.file_position_at_char(11),
        Err(TextIndexError::OutOfRange { kind: OrdinalKind::Char, .. })
    ));
}

#[test]
fn test_line_terminator_equivalence() {
    for (content, b_pos) in [("a\nb", 2), ("a\rb", 2), ("a\r\nb", 3)] {
        let file = temp_file(content.as_bytes());
        let accessor = TextFileAccessor::open(file.path(), Encoding::Utf8).unwrap();
        assert_eq!(accessor.number_of_lines(), 2, "{:?}", content);
        assert_eq!(accessor.file_position_at_line(1).unwrap(), b_pos, "{:?}", content);
        assert_eq!(accessor.read_line(1).unwrap(), "b");
        assert_eq!(accessor.read_line(0).unwrap(), "a");
    }
}

#[test]
fn test_trailing_terminator_does_not_add_line() {
    let file = temp_file(b"one\r\ntwo\r\n");
    let accessor = TextFileAccessor::open(file.path(), Encoding::Utf8).unwrap();
    assert_eq!(accessor.number_of_lines(), 2);
    assert!(accessor.file_position_at_line(2).is_err());
    assert_eq!(accessor.read_line(1).unwrap(), "two");
}

#[test]
fn test_surrogate_pair_positions() {
    let file = temp_file("a😀b".as_bytes());
    let accessor = TextFileAccessor::open(file.path(), Encoding::Utf8).unwrap();

    // UTF-16 ordinals: a, high, low, b
    assert_eq!(accessor.number_of_characters(), 4);
    assert_eq!(accessor.file_position_at_char(1).unwrap(), 1);
    assert_eq!(accessor.file_position_at_char(3).unwrap(), 5);
    assert!(accessor.char_index().get(2).is_none());

    let mut reader = accessor.reader_at_char(1).unwrap();
    assert_eq!(reader.read_char().unwrap(), Some('😀'));
    assert_eq!(reader.file_position(), 5);
}

#[test]
fn test_utf16_file() {
    let text = "héllo\nwörld";
    for (encoding, bytes) in [
        (
            Encoding::Utf16Le,
            text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect::<Vec<u8>>(),
        ),
        (
            Encoding::Utf16Be,
            text.encode_utf16().flat_map(|u| u.to_be_bytes()).collect::<Vec<u8>>(),
        ),
    ] {
        let file = temp_file(&bytes);
        let accessor = TextFileAccessor::open(file.path(), encoding).unwrap();
        assert_eq!(accessor.number_of_characters(), 11);
        assert_eq!(accessor.number_of_lines(), 2);
        assert_eq!(accessor.file_position_at_line(1).unwrap(), 12);
        assert_eq!(accessor.file_position_at_char(7).unwrap(), 14);
        assert_eq!(accessor.read_line(1).unwrap(), "wörld");
    }
}

#[test]
fn test_latin1_file() {
    // "café\nnaïve" in ISO-8859-1
    let bytes = b"caf\xe9\nna\xefve";
    let file = temp_file(bytes);
    let accessor = TextFileAccessor::open(file.path(), Encoding::Iso8859_1).unwrap();
    assert_eq!(accessor.number_of_characters(), 10);
    assert_eq!(accessor.file_position_at_line(1).unwrap(), 5);
    assert_eq!(accessor.read_line(0).unwrap(), "café");
    assert_eq!(accessor.read_line(1).unwrap(), "naïve");
}

#[test]
fn test_header_skip_bytes() {
    let mut content = Encoding::Utf8.bom().to_vec();
    content.extend_from_slice(b"ab\ncd");
    let file = temp_file(&content);

    let bom = Encoding::Utf8.detect_bom_len(&content);
    assert_eq!(bom, 3);
    let config = IndexConfig::default().with_header_skip(bom);
    let accessor = TextFileAccessor::open_with_config(file.path(), Encoding::Utf8, config).unwrap();

    assert_eq!(accessor.number_of_characters(), 5);
    assert_eq!(accessor.number_of_lines(), 2);
    assert_eq!(accessor.file_position_at_char(0).unwrap(), 3);
    assert_eq!(accessor.file_position_at_line(1).unwrap(), 6);
    assert_eq!(accessor.summary().header_skip_bytes, 3);
}

#[test]
fn test_header_skip_past_end_rejected() {
    let file = temp_file(b"ab");
    let config = IndexConfig::default().with_header_skip(10);
    let err = TextFileAccessor::open_with_config(file.path(), Encoding::Utf8, config).unwrap_err();
    assert!(matches!(err, TextIndexError::Configuration(_)));
}

#[test]
fn test_empty_file() {
    let file = temp_file(b"");
    let accessor = TextFileAccessor::open(file.path(), Encoding::Utf8).unwrap();
    assert_eq!(accessor.number_of_characters(), 0);
    assert_eq!(accessor.number_of_lines(), 0);
    assert_eq!(accessor.number_of_character_index_entries(), 0);
    assert_eq!(accessor.number_of_line_index_entries(), 0);
    assert!(matches!(
        accessor.file_position_at_char(0),
        Err(TextIndexError::OutOfRange { .. })
    ));
    assert!(matches!(
        accessor.reader_at_line(0),
        Err(TextIndexError::OutOfRange { .. })
    ));
}

#[test]
fn test_invalid_configuration_rejected() {
    let file = temp_file(b"abc");
    let config = IndexConfig::default().with_max_entries(0, 10);
    let err = TextFileAccessor::open_with_config(file.path(), Encoding::Utf8, config).unwrap_err();
    assert!(matches!(err, TextIndexError::Configuration(_)));

    let err = IndexConfig::from_json(r#"{"charBufferSize": -5}"#).unwrap_err();
    assert!(matches!(err, TextIndexError::Configuration(_)));
}

#[test]
fn test_unsupported_encoding_name() {
    for name in ["EBCDIC", "UTF-16", "shift_jis", ""] {
        let err = Encoding::from_name(name).unwrap_err();
        assert!(matches!(err, TextIndexError::Configuration(_)), "{:?}", name);
    }
    assert_eq!(Encoding::from_name("utf-16le").unwrap(), Encoding::Utf16Le);
}

#[test]
fn test_malformed_input_is_an_error() {
    let file = temp_file(b"ok\n\xff\xfe bad");
    let err = TextFileAccessor::open(file.path(), Encoding::Utf8).unwrap_err();
    match err {
        TextIndexError::Malformed { encoding, position } => {
            assert_eq!(encoding, Encoding::Utf8);
            assert_eq!(position, 3);
        }
        other => panic!("expected Malformed, got {:?}", other),
    }
    let file = temp_file(b"caf\xe9");
    let err = TextFileAccessor::open(file.path(), Encoding::UsAscii).unwrap_err();
    assert!(err.is_io());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TextFileAccessor::open(dir.path().join("absent.txt"), Encoding::Utf8).unwrap_err();
    assert!(matches!(err, TextIndexError::Io(_)));
}

#[test]
fn test_reader_reads_to_end() {
    let file = temp_file(b"foo\nbar\nbaz");
    let accessor = TextFileAccessor::open(file.path(), Encoding::Utf8).unwrap();

    let mut rest = String::new();
    accessor.reader_at_line(1).unwrap().read_to_string(&mut rest).unwrap();
    assert_eq!(rest, "bar\nbaz");

    let mut rest = String::new();
    accessor.reader_at_char(9).unwrap().read_to_string(&mut rest).unwrap();
    assert_eq!(rest, "az");
}

#[test]
fn test_reader_at_file_position() {
    let file = temp_file(b"foo\nbar\nbaz");
    let accessor = TextFileAccessor::open(file.path(), Encoding::Utf8).unwrap();

    let mut line = String::new();
    let mut reader = accessor.reader_at_file_position(5).unwrap();
    assert_eq!(reader.file_position(), 5);
    reader.read_line(&mut line).unwrap();
    assert_eq!(line, "ar\n");

    let mut reader = accessor.reader_at_file_position(11).unwrap();
    assert_eq!(reader.read_char().unwrap(), None);

    assert!(matches!(
        accessor.reader_at_file_position(12),
        Err(TextIndexError::OutOfRange { kind: OrdinalKind::Byte, .. })
    ));
}

#[test]
fn test_truncated_file_after_indexing() {
    let file = temp_file(b"foo\nbar\nbaz");
    let config = IndexConfig::default().with_max_entries(1, 1);
    let accessor = TextFileAccessor::open_with_config(file.path(), Encoding::Utf8, config).unwrap();
    assert_eq!(accessor.number_of_line_index_entries(), 1);

    std::fs::write(file.path(), b"foo").unwrap();

    assert!(matches!(
        accessor.file_position_at_line(2),
        Err(TextIndexError::Truncated { kind: OrdinalKind::Line, ordinal: 2, .. })
    ));
    let err = accessor.file_position_at_char(8).unwrap_err();
    assert!(matches!(err, TextIndexError::Truncated { kind: OrdinalKind::Char, .. }));
    assert!(err.is_io());
}

#[test]
fn test_file_cut_inside_a_character_is_truncation() {
    let bytes: Vec<u8> = "abc\ndef\nghi".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
    let file = temp_file(&bytes);
    let config = IndexConfig::default().with_max_entries(1, 1);
    let accessor =
        TextFileAccessor::open_with_config(file.path(), Encoding::Utf16Le, config).unwrap();
    assert_eq!(accessor.file_size(), 22);

    // Leaves six whole units and the first byte of the seventh
    std::fs::OpenOptions::new()
        .write(true)
        .open(file.path())
        .unwrap()
        .set_len(13)
        .unwrap();

    assert!(matches!(
        accessor.file_position_at_char(9),
        Err(TextIndexError::Truncated { kind: OrdinalKind::Char, ordinal: 9, position: 12 })
    ));
    assert!(matches!(
        accessor.file_position_at_line(2),
        Err(TextIndexError::Truncated { kind: OrdinalKind::Line, ordinal: 2, position: 12 })
    ));
    // Positions before the cut still resolve
    assert_eq!(accessor.file_position_at_char(5).unwrap(), 10);
}

#[test]
fn test_cursor_records_last_position() {
    let file = temp_file(b"foo\nbar\nbaz");
    let accessor = TextFileAccessor::open(file.path(), Encoding::Utf8).unwrap();

    let mut first = accessor.cursor();
    let mut second = accessor.cursor();
    assert_eq!(first.last_known_file_position(), None);

    first.file_position_at_line(1).unwrap();
    second.reader_at_char(9).unwrap();
    assert_eq!(first.last_known_file_position(), Some(4));
    assert_eq!(second.last_known_file_position(), Some(9));

    // A failed lookup leaves the recorded position alone
    assert!(first.file_position_at_line(7).is_err());
    assert_eq!(first.last_known_file_position(), Some(4));

    first.cleanup();
    assert_eq!(first.last_known_file_position(), None);
    assert_eq!(second.last_known_file_position(), Some(9));
}

#[test]
fn test_mmap_strategy_matches_buffered() {
    let text = common::mixed_text(400);
    let file = temp_file(text.as_bytes());

    let buffered = TextFileAccessor::open_with_config(
        file.path(),
        Encoding::Utf8,
        common::stress_config(2),
    )
    .unwrap();
    let mapped = TextFileAccessor::open_with_config(
        file.path(),
        Encoding::Utf8,
        IndexConfig {
            read_strategy: ReadStrategy::Mmap,
            ..common::stress_config(2)
        },
    )
    .unwrap();

    assert_eq!(buffered.number_of_characters(), mapped.number_of_characters());
    assert_eq!(buffered.number_of_lines(), mapped.number_of_lines());
    assert_eq!(buffered.char_index(), mapped.char_index());
    assert_eq!(buffered.line_index(), mapped.line_index());
}

#[test]
fn test_summary() {
    let file = temp_file(b"foo\nbar\nbaz");
    let accessor = TextFileAccessor::open(file.path(), Encoding::Utf8).unwrap();
    let summary = accessor.summary();
    assert_eq!(summary.encoding, "UTF-8");
    assert_eq!(summary.file_size, 11);
    assert_eq!(summary.characters, 11);
    assert_eq!(summary.lines, 3);
    assert_eq!(summary.char_index_entries, accessor.number_of_character_index_entries());
    assert_eq!(summary.max_line_index_entries, 10_000);
}
