#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Errors are fine, panics are bugs.
    if let Ok(parsed) = peajes::xml::from_xml_bytes(data, peajes::core::DEFAULT_NAMESPACE) {
        let (header, lines) = parsed.into_parts();
        if let Ok(header) = header.complete() {
            let _ = peajes::core::reconcile(
                &header,
                &lines,
                &peajes::core::ReferenceTables::empty(),
                &peajes::core::RuleTable::regulated(),
                &peajes::core::Tolerances::default(),
            );
        }
    }
});
