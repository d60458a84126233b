#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Legacy config blobs come straight out of the file, so any text must
    // either decode or be rejected with an error. It should NEVER panic.
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = metafile::resolver::literal::decode(text);

        if let Ok(mapping) = metafile::resolver::literal::decode_mapping(text) {
            // Whatever decoded must serialize again
            let _ = serde_json::to_string(&mapping);
        }
    }
});
