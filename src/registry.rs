//! The in-memory index over the provider store for one resolution run:
//! lookup by canonical id and by BIC secondary key.

use std::collections::HashMap;

use anyhow::Result;
use tracing::warn;

use crate::bic::Bic;
use crate::provider::Provider;
use crate::store::ProviderStore;

/// A record-level storage failure that did not abort the run.
#[derive(Debug)]
pub struct StorageError {
    pub id: String,
    pub error: String,
}

pub struct Registry {
    providers: HashMap<String, Provider>,
    by_bic: HashMap<Bic, String>,
    load_errors: Vec<StorageError>,
}

impl Registry {
    /// Builds the index by enumerating every record in the store.
    /// Records that fail to read or parse are skipped, logged, and
    /// surfaced through `take_load_errors`; only the enumeration itself
    /// is fatal.
    pub fn load(store: &dyn ProviderStore) -> Result<Self> {
        let ids = store.list_ids()?;
        let mut providers = HashMap::with_capacity(ids.len());
        let mut by_bic = HashMap::new();
        let mut load_errors = Vec::new();

        for id in ids {
            match store.read(&id) {
                Ok(provider) => {
                    if let Some(bic) = valid_bic_of(&provider) {
                        // The first record carrying a BIC owns it; later
                        // records with the same code stay unindexed rather
                        // than stealing the key.
                        by_bic.entry(bic).or_insert_with(|| id.clone());
                    }
                    providers.insert(id, provider);
                }
                Err(err) => {
                    warn!("skipping unreadable provider record {}: {:#}", id, err);
                    load_errors.push(StorageError {
                        id,
                        error: format!("{:#}", err),
                    });
                }
            }
        }

        Ok(Registry {
            providers,
            by_bic,
            load_errors,
        })
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Provider> {
        self.providers.get(id)
    }

    pub fn id_for_bic(&self, bic: &Bic) -> Option<&str> {
        self.by_bic.get(bic).map(String::as_str)
    }

    /// Writes the record through to the store and, on success, updates
    /// both indexes so later candidates in the same batch observe it.
    pub fn put(&mut self, store: &mut dyn ProviderStore, provider: Provider) -> Result<()> {
        store.write(&provider)?;
        if let Some(bic) = valid_bic_of(&provider) {
            self.by_bic.entry(bic).or_insert_with(|| provider.id.clone());
        }
        self.providers.insert(provider.id.clone(), provider);
        Ok(())
    }

    /// Drains the read failures collected during `load` for inclusion in
    /// the run report.
    pub fn take_load_errors(&mut self) -> Vec<StorageError> {
        std::mem::take(&mut self.load_errors)
    }
}

fn valid_bic_of(provider: &Provider) -> Option<Bic> {
    provider.bic.as_deref().and_then(|b| b.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{minimal_provider, MemoryStore};

    fn bic(s: &str) -> Bic {
        s.parse().unwrap()
    }

    #[test]
    fn load_indexes_ids_and_bics() {
        let mut store = MemoryStore::default();
        let mut deutsche = minimal_provider("deutsche-bank");
        deutsche.bic = Some("DEUTDEFF".to_string());
        store.insert(deutsche);
        store.insert(minimal_provider("monzo"));

        let registry = Registry::load(&store).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("deutsche-bank"));
        assert_eq!(registry.id_for_bic(&bic("DEUTDEFF")), Some("deutsche-bank"));
        assert_eq!(registry.id_for_bic(&bic("NDEAFIHH")), None);
    }

    #[test]
    fn malformed_bic_on_disk_is_not_indexed() {
        let mut store = MemoryStore::default();
        let mut provider = minimal_provider("broken-bic-bank");
        provider.bic = Some("not a bic".to_string());
        store.insert(provider);

        let registry = Registry::load(&store).unwrap();
        assert!(registry.contains("broken-bic-bank"));
        // The record loads fine; only the secondary index skips it.
        assert!(registry.get("broken-bic-bank").unwrap().bic.is_some());
    }

    #[test]
    fn first_record_with_a_bic_keeps_it() {
        let mut store = MemoryStore::default();
        let mut a = minimal_provider("alpha-bank");
        a.bic = Some("NDEAFIHH".to_string());
        let mut b = minimal_provider("beta-bank");
        b.bic = Some("NDEAFIHH".to_string());
        store.insert(a);
        store.insert(b);

        let registry = Registry::load(&store).unwrap();
        // MemoryStore enumerates in sorted order, so alpha-bank wins.
        assert_eq!(registry.id_for_bic(&bic("NDEAFIHH")), Some("alpha-bank"));
    }

    #[test]
    fn unreadable_records_are_skipped_and_reported() {
        let mut store = MemoryStore::default();
        store.insert(minimal_provider("good-bank"));
        store.fail_reads.insert("bad-bank".to_string());

        let mut registry = Registry::load(&store).unwrap();
        assert!(registry.contains("good-bank"));
        assert!(!registry.contains("bad-bank"));

        let errors = registry.take_load_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].id, "bad-bank");
        // Draining is one-shot.
        assert!(registry.take_load_errors().is_empty());
    }

    #[test]
    fn put_gives_read_your_writes() {
        let mut store = MemoryStore::default();
        let mut registry = Registry::load(&store).unwrap();

        let mut provider = minimal_provider("new-bank");
        provider.bic = Some("NEWBGB2L".to_string());
        registry.put(&mut store, provider).unwrap();

        assert!(registry.contains("new-bank"));
        assert_eq!(registry.id_for_bic(&bic("NEWBGB2L")), Some("new-bank"));
        // And the write went through to the store.
        assert!(store.records.contains_key("new-bank"));
    }

    #[test]
    fn failed_put_leaves_indexes_untouched() {
        let mut store = MemoryStore::default();
        store.fail_writes.insert("new-bank".to_string());
        let mut registry = Registry::load(&store).unwrap();

        assert!(registry
            .put(&mut store, minimal_provider("new-bank"))
            .is_err());
        assert!(!registry.contains("new-bank"));
    }
}
