/// Deterministic content hash used as the embedding dedup key. Any byte
/// difference in the input, including whitespace, produces a different hash.
pub fn content_hash(text: &str) -> String {
	blake3::hash(text.as_bytes()).to_hex().to_string()
}
