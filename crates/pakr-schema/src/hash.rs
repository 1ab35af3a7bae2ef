//! File digest types rendered as lowercase hex.

/// Raw digest bytes that render as lowercase hex.
///
/// Manifests store the bytes and only hex-encode them when a line is
/// rendered, so truncated or synthetic digests (handy in tests) print exactly
/// what they hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HexDigest(Vec<u8>);

impl HexDigest {
    /// Wrap raw digest bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl std::fmt::Display for HexDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<Vec<u8>> for HexDigest {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Everything learned about a file's bytes while streaming it once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileDigests {
    /// Number of bytes streamed.
    pub size: u64,
    /// MD5 of the content (Deb `md5sums`, mtree `md5digest`).
    pub md5: HexDigest,
    /// SHA-1 of the content (APK per-file PAX checksum).
    pub sha1: HexDigest,
    /// SHA-256 of the content (mtree `sha256digest`).
    pub sha256: HexDigest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_lowercase_hex() {
        let digest = HexDigest::new(vec![0xAB, 0xCD]);
        assert_eq!(digest.to_string(), "abcd");
    }

    #[test]
    fn default_renders_empty() {
        assert_eq!(HexDigest::default().to_hex(), "");
        assert_eq!(FileDigests::default().md5.to_string(), "");
    }
}
