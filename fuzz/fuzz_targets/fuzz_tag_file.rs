#![no_main]

use libfuzzer_sys::fuzz_target;
use voltage_crosscheck::tag_file::parse_tags;

fuzz_target!(|data: &[u8]| {
    // Malformed tables must surface as errors, never panics
    if let Ok(tags) = parse_tags(data) {
        assert!(tags.iter().all(|t| t.register_count > 0));
    }
});
