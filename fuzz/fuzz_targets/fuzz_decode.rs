#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never panic the decoder.
    let limits = zentiff::Limits {
        max_pixels: Some(1 << 20),
        max_memory_bytes: Some(64 << 20),
        max_directories: Some(64),
        ..Default::default()
    };
    let _ = zentiff::DecodeRequest::new(data)
        .with_limits(&limits)
        .decode(enough::Unstoppable);
});
