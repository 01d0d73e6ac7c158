//! Session cache for loaded sources.
//!
//! Parsing and normalizing is idempotent for a given byte content, so entries
//! are keyed by the SHA-256 digest of the source bytes together with the parse
//! options. Sources are static for a session; entries are only dropped by
//! [`SourceCache::clear`].

use std::{collections::HashMap, path::Path, sync::Arc};

use log::{debug, info};
use sha2::{Digest, Sha256};

use crate::{
    capabilities::{self, SchemaCapabilities},
    data::Table,
    source::{self, LoadError, SourceOptions},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    digest: [u8; 32],
    delimiter: u8,
    encoding: &'static str,
}

#[derive(Debug)]
pub struct LoadedSource {
    pub name: String,
    pub digest: [u8; 32],
    pub table: Table,
    pub capabilities: SchemaCapabilities,
}

impl LoadedSource {
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

#[derive(Debug, Default)]
pub struct SourceCache {
    entries: HashMap<CacheKey, Arc<LoadedSource>>,
    stats: CacheStats,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_path(
        &mut self,
        path: &Path,
        options: SourceOptions,
    ) -> Result<Arc<LoadedSource>, LoadError> {
        let bytes = source::read_source(path)?;
        self.load_bytes(&path.display().to_string(), &bytes, options)
    }

    /// Returns the cached entry for identical content, parsing and normalizing
    /// only on a miss.
    pub fn load_bytes(
        &mut self,
        name: &str,
        bytes: &[u8],
        options: SourceOptions,
    ) -> Result<Arc<LoadedSource>, LoadError> {
        let digest: [u8; 32] = Sha256::digest(bytes).into();
        let key = CacheKey {
            digest,
            delimiter: options.delimiter,
            encoding: options.encoding.name(),
        };
        if let Some(entry) = self.entries.get(&key) {
            self.stats.hits += 1;
            debug!("Cache hit for {name} ({})", entry.digest_hex());
            return Ok(Arc::clone(entry));
        }

        let raw = source::parse_table(name, bytes, options)?;
        let (table, capabilities) = capabilities::normalize(raw);
        let entry = Arc::new(LoadedSource {
            name: name.to_string(),
            digest,
            table,
            capabilities,
        });
        self.stats.misses += 1;
        info!(
            "Loaded {} from {name} ({})",
            entry.table,
            &entry.digest_hex()[..12]
        );
        self.entries.insert(key, Arc::clone(&entry));
        Ok(entry)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &[u8] = "名称 ,reviews\n兼六園,120\n".as_bytes();

    #[test]
    fn identical_content_reuses_the_entry() {
        let mut cache = SourceCache::new();
        let first = cache
            .load_bytes("a.csv", CSV, SourceOptions::default())
            .unwrap();
        let second = cache
            .load_bytes("copy-of-a.csv", CSV, SourceOptions::default())
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
        assert_eq!(first.table.headers[0], "名称");
    }

    #[test]
    fn different_content_or_options_miss() {
        let mut cache = SourceCache::new();
        cache
            .load_bytes("a.csv", CSV, SourceOptions::default())
            .unwrap();
        cache
            .load_bytes("b.csv", b"name\nx\n", SourceOptions::default())
            .unwrap();
        let semicolon = SourceOptions {
            delimiter: b';',
            ..SourceOptions::default()
        };
        cache.load_bytes("a.csv", CSV, semicolon).unwrap();
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().misses, 3);
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let mut cache = SourceCache::new();
        assert!(
            cache
                .load_bytes("bad.csv", b"a,b\n1\n", SourceOptions::default())
                .is_err()
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_forces_a_reload() {
        let mut cache = SourceCache::new();
        cache
            .load_bytes("a.csv", CSV, SourceOptions::default())
            .unwrap();
        cache.clear();
        cache
            .load_bytes("a.csv", CSV, SourceOptions::default())
            .unwrap();
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn digest_is_hex_encoded_sha256() {
        let mut cache = SourceCache::new();
        let entry = cache
            .load_bytes("b.csv", b"name\n", SourceOptions::default())
            .unwrap();
        assert_eq!(entry.digest_hex().len(), 64);
    }
}
