use huffpack::HuffmanCodec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join(format!("huffpack-demo-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;

    let sample = dir.join("sample.txt");
    let encoded = dir.join("sample.txt.huff");
    let restored = dir.join("restored.txt");

    let sample_text = "Hello, world! This is a sample text for Huffman compression. \
                      The quick brown fox jumps over the lazy dog. \
                      Huffman encoding is a greedy algorithm that builds optimal prefix codes.";
    std::fs::write(&sample, sample_text)?;
    println!("Created sample file: {} bytes", sample_text.len());

    let codec = HuffmanCodec::new();
    let summary = codec.encode_file(&sample, &encoded)?;
    println!(
        "Compressed to {} bytes ({} header + {} payload, {:.1}% of original)",
        summary.encoded_len(),
        summary.header_len,
        summary.payload_len,
        summary.ratio() * 100.0
    );

    codec.decode_file(&encoded, &restored)?;
    let restored_text = std::fs::read_to_string(&restored)?;
    if restored_text != sample_text {
        return Err("decompressed text does not match the sample".into());
    }
    println!("Decompression successful, data matches exactly.");

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
