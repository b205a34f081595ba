#![no_main]

use libfuzzer_sys::fuzz_target;
use textdex::utils::{ByteLengthTable, CharDecoder, Encoding};

fuzz_target!(|input: (u8, u8, &[u8])| {
    let (which, chunk, data) = input;
    let encoding = Encoding::ALL[which as usize % Encoding::ALL.len()];
    let table = ByteLengthTable::new(encoding);

    // Small raw buffers force multi-byte sequences across refills
    let mut decoder = CharDecoder::new(data, encoding, 0, 1 + chunk as usize % 16);
    let mut units = Vec::new();
    loop {
        let before = units.len();
        match decoder.fill(&mut units, 2 + chunk as usize % 7) {
            Ok(_) if units.len() == before && decoder.is_finished() => break,
            Ok(_) => {}
            Err(_) => return,
        }
    }

    // Every byte decoded must be accounted for by the length table
    assert_eq!(table.encoded_len(&units), decoder.position());
    assert_eq!(decoder.position(), data.len() as u64);
});
