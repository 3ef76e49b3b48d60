//! Content digests using blake3.
//!
//! One digest type serves every content-addressed key in the engine:
//! source-list fingerprints, merged-content digests (default filenames),
//! compression cache keys and remote-fetch cache keys.

use std::fmt;

/// Number of hex characters used in filenames and cache keys.
const ID_LEN: usize = 32;

/// A 256-bit blake3 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Digest a single byte sequence.
    pub fn of<T: AsRef<[u8]> + ?Sized>(data: &T) -> Self {
        Self(*blake3::hash(data.as_ref()).as_bytes())
    }

    /// Digest an ordered list of parts.
    ///
    /// Each part is terminated by a NUL byte, so `["ab", "c"]` and
    /// `["a", "bc"]` produce different digests while order still matters.
    pub fn of_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part.as_ref());
            hasher.update(&[0]);
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Full hex representation.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Hex prefix used for filenames and cache entry names.
    pub fn id(self) -> String {
        hex::encode(&self.0[..ID_LEN / 2])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display first 16 chars of hex for brevity
        write!(f, "{}", &self.to_hex()[..16])
    }
}
