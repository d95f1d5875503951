use sha2::{Digest, Sha256};

/// Hex length of a SHA-1 digest, the format registry `.sha1` files serve
pub const SHA1_HEX_LEN: usize = 40;

/// Compute the SHA-256 digest of raw bytes as a lowercase hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
