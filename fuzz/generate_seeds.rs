#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decode";
    fs::create_dir_all(dir).unwrap();

    // Minimal 2x1 8-bit grayscale, one strip.
    // Header, then one IFD at offset 10 with the strip data at offset 8.
    let mut gray = Vec::new();
    gray.extend_from_slice(b"II\x2A\x00");
    gray.extend_from_slice(&10u32.to_le_bytes()); // first IFD
    gray.extend_from_slice(&[0x40, 0xFF]); // strip data at offset 8
    let entries: &[(u16, u16, u32, u32)] = &[
        (256, 4, 1, 2),  // width
        (257, 4, 1, 1),  // height
        (258, 3, 1, 8),  // bits per sample
        (262, 3, 1, 1),  // min-is-black
        (273, 4, 1, 8),  // strip offset
        (277, 3, 1, 1),  // samples per pixel
        (278, 4, 1, 1),  // rows per strip
        (279, 4, 1, 2),  // strip byte count
    ];
    gray.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for &(tag, ftype, count, value) in entries {
        gray.extend_from_slice(&tag.to_le_bytes());
        gray.extend_from_slice(&ftype.to_le_bytes());
        gray.extend_from_slice(&count.to_le_bytes());
        gray.extend_from_slice(&value.to_le_bytes());
    }
    gray.extend_from_slice(&0u32.to_le_bytes()); // end of chain
    fs::write(format!("{dir}/gray_2x1.tif"), gray).unwrap();

    // Truncated/malformed seeds for edge coverage.
    fs::write(format!("{dir}/empty.bin"), b"").unwrap();
    fs::write(format!("{dir}/just_magic.bin"), b"II\x2A\x00").unwrap();
    fs::write(format!("{dir}/big_endian_header.bin"), b"MM\x00\x2A\x00\x00\x00\x08").unwrap();
    fs::write(format!("{dir}/bigtiff.bin"), b"II\x2B\x00\x08\x00\x00\x00").unwrap();
    fs::write(
        format!("{dir}/looped_chain.bin"),
        b"II\x2A\x00\x08\x00\x00\x00\x00\x00\x08\x00\x00\x00",
    )
    .unwrap();

    println!("Generated seed corpus in {dir}/");
}
