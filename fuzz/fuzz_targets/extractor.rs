#![no_main]

use libfuzzer_sys::fuzz_target;

use readmark::extractor::{Extraction, MarkdownOptions, process_bytes};

fuzz_target!(|data: &[u8]| {
    // Any byte soup must come back as a value, never a panic
    for options in [MarkdownOptions::default(), MarkdownOptions::keep_all()] {
        if let Ok(Extraction::Rendered(markdown)) = process_bytes(data, &options) {
            assert!(!markdown.trim().is_empty());
        }
    }
});
