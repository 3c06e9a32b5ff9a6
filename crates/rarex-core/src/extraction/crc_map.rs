//! Per-pass checksum accumulator.

use std::collections::BTreeMap;

/// Filename to running CRC32, owned by one extraction pass.
///
/// - An entry appears the first time a regular file with that name is
///   written.
/// - A later volume part of the same file seeds its checksum from the stored
///   value, so after the pass the value covers the reconstructed file.
/// - Directory and redirection entries remove the name. They are never
///   stored as zero.
///
/// Iteration order is by filename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrcMap(BTreeMap<String, u32>);

impl CrcMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checksum to continue from for `filename`; `0` when unseen.
    #[must_use]
    pub fn seed(&self, filename: &str) -> u32 {
        self.0.get(filename).copied().unwrap_or(0)
    }

    /// Returns the accumulated checksum for `filename`.
    #[must_use]
    pub fn get(&self, filename: &str) -> Option<u32> {
        self.0.get(filename).copied()
    }

    /// Stores the checksum after a write.
    pub fn insert(&mut self, filename: impl Into<String>, crc: u32) {
        self.0.insert(filename.into(), crc);
    }

    /// Drops `filename`.
    pub fn remove(&mut self, filename: &str) {
        self.0.remove(filename);
    }

    /// Returns `true` if `filename` has a stored checksum.
    #[must_use]
    pub fn contains(&self, filename: &str) -> bool {
        self.0.contains_key(filename)
    }

    /// Number of files tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(filename, crc)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(name, crc)| (name.as_str(), *crc))
    }
}

impl FromIterator<(String, u32)> for CrcMap {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
