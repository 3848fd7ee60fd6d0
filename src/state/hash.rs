use std::fmt;

/// 16-byte MD5 digest of a page's raw bytes
///
/// Used only to detect exact-duplicate content under different URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(pub [u8; 16]);

impl ContentHash {
    /// Digests raw content
    ///
    /// # Examples
    ///
    /// ```
    /// use crawldb::ContentHash;
    ///
    /// let hash = ContentHash::of(b"");
    /// assert_eq!(hash.to_string(), "d41d8cd98f00b204e9800998ecf8427e");
    /// ```
    pub fn of(content: &[u8]) -> Self {
        Self(md5::compute(content).0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Rebuilds a hash from a stored blob; None unless exactly 16 bytes
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; 16] = bytes.try_into().ok()?;
        Some(Self(array))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_content_same_hash() {
        let a = ContentHash::of(b"<html><body>Hi</body></html>");
        let b = ContentHash::of(b"<html><body>Hi</body></html>");
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_content_different_hash() {
        let a = ContentHash::of(b"<html><body>Hi</body></html>");
        let b = ContentHash::of(b"<html><body>Hi!</body></html>");
        assert_ne!(a, b);
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            ContentHash::of(b"abc").to_string(),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }

    #[test]
    fn test_from_slice() {
        let hash = ContentHash::of(b"abc");
        assert_eq!(ContentHash::from_slice(hash.as_bytes()), Some(hash));
        assert_eq!(ContentHash::from_slice(&[0u8; 15]), None);
    }
}
