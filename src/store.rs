//! Storage of canonical provider records: one independently addressable
//! unit per id.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::provider::Provider;

/// The storage collaborator the engine requires. Each record must be
/// independently readable and writable, and enumerable in full; the
/// engine is agnostic to what sits behind this.
pub trait ProviderStore {
    fn list_ids(&self) -> Result<BTreeSet<String>>;
    fn read(&self, id: &str) -> Result<Provider>;
    fn write(&mut self, provider: &Provider) -> Result<()>;
}

/// One pretty-printed JSON file per record in a flat directory, the file
/// stem being the record id. This is the layout of the existing registry.
#[derive(Debug)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryStore { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

impl ProviderStore for DirectoryStore {
    fn list_ids(&self) -> Result<BTreeSet<String>> {
        let pattern = self.dir.join("*.json");
        let mut ids = BTreeSet::new();
        for entry in glob::glob(&pattern.to_string_lossy())
            .with_context(|| format!("listing {:?}", self.dir))?
        {
            let path = entry?;
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.insert(stem.to_string());
            }
        }
        Ok(ids)
    }

    fn read(&self, id: &str) -> Result<Provider> {
        let path = self.path_for(id);
        let content =
            fs::read_to_string(&path).with_context(|| format!("reading {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("parsing {:?}", path))
    }

    fn write(&mut self, provider: &Provider) -> Result<()> {
        let path = self.path_for(&provider.id);
        let mut content = serde_json::to_string_pretty(provider)?;
        content.push('\n');
        fs::write(&path, content).with_context(|| format!("writing {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::minimal_provider;

    #[test]
    fn directory_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::new(dir.path());

        assert!(store.list_ids().unwrap().is_empty());

        let provider = minimal_provider("royal-bank-of-canada");
        store.write(&provider).unwrap();
        store.write(&minimal_provider("monzo")).unwrap();

        let ids: Vec<String> = store.list_ids().unwrap().into_iter().collect();
        // BTreeSet enumeration keeps runs deterministic.
        assert_eq!(ids, vec!["monzo", "royal-bank-of-canada"]);

        let read_back = store.read("royal-bank-of-canada").unwrap();
        assert_eq!(read_back, provider);
    }

    #[test]
    fn read_missing_record_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());
        assert!(store.read("no-such-bank").is_err());
    }

    #[test]
    fn written_files_are_pretty_printed_with_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::new(dir.path());
        store.write(&minimal_provider("monzo")).unwrap();

        let content = fs::read_to_string(dir.path().join("monzo.json")).unwrap();
        assert!(content.starts_with("{\n"));
        assert!(content.ends_with("}\n"));
    }
}
