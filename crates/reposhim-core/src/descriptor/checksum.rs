//! Content digests for cache-validation headers.

use sha1::{Digest, Sha1};

/// SHA-1 of `bytes` as lowercase hex.
pub fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// ETag value in the `{SHA1{<hex>}}` form Artifactory-style clients expect.
pub fn sha1_etag(hex_digest: &str) -> String {
    format!("{{SHA1{{{}}}}}", hex_digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_hex_empty_input() {
        assert_eq!(sha1_hex(b""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn sha1_hex_known_content() {
        assert_eq!(
            sha1_hex(b"hello\n"),
            "f572d396fae9206628714fb2ce00f72e94f2258f"
        );
    }

    #[test]
    fn etag_wraps_digest() {
        assert_eq!(sha1_etag("abc"), "{SHA1{abc}}");
    }
}
