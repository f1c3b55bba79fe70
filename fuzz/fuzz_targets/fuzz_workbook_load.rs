#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = peajes::xlsx::load_reference_tables_from_bytes(data);
});
