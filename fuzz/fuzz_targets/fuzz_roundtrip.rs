#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // If it decodes, re-encoding and decoding again must produce identical
    // layers.
    let limits = zentiff::Limits {
        max_pixels: Some(1 << 20),
        max_memory_bytes: Some(64 << 20),
        max_directories: Some(64),
        ..Default::default()
    };
    let Ok(decoded) = zentiff::DecodeRequest::new(data)
        .with_limits(&limits)
        .decode(enough::Unstoppable)
    else {
        return;
    };

    let Ok(reencoded) = zentiff::encode(&decoded, enough::Unstoppable) else {
        return;
    };
    let decoded2 =
        zentiff::decode(&reencoded, enough::Unstoppable).expect("re-encoded data failed to decode");

    assert_eq!(decoded.layers.len(), decoded2.layers.len());
    for (a, b) in decoded.layers.iter().zip(&decoded2.layers) {
        assert_eq!((a.width, a.height), (b.width, b.height));
        assert_eq!(a.colorspace, b.colorspace);
        assert_eq!(a.data(), b.data(), "roundtrip pixel mismatch");
    }
});
