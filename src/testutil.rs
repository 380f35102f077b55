//! Shared helpers for unit tests.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Result};

use crate::provider::{Candidate, Provider};
use crate::registry::Registry;
use crate::store::ProviderStore;

/// An in-memory store with injectable per-record failures.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub records: BTreeMap<String, Provider>,
    pub fail_reads: BTreeSet<String>,
    pub fail_writes: BTreeSet<String>,
}

impl MemoryStore {
    pub fn insert(&mut self, provider: Provider) {
        self.records.insert(provider.id.clone(), provider);
    }
}

impl ProviderStore for MemoryStore {
    fn list_ids(&self) -> Result<BTreeSet<String>> {
        let mut ids: BTreeSet<String> = self.records.keys().cloned().collect();
        ids.extend(self.fail_reads.iter().cloned());
        Ok(ids)
    }

    fn read(&self, id: &str) -> Result<Provider> {
        if self.fail_reads.contains(id) {
            bail!("injected read failure for {:?}", id);
        }
        match self.records.get(id) {
            Some(provider) => Ok(provider.clone()),
            None => bail!("no such record {:?}", id),
        }
    }

    fn write(&mut self, provider: &Provider) -> Result<()> {
        if self.fail_writes.contains(&provider.id) {
            bail!("injected write failure for {:?}", provider.id);
        }
        self.records.insert(provider.id.clone(), provider.clone());
        Ok(())
    }
}

pub fn minimal_provider(id: &str) -> Provider {
    Provider {
        id: id.to_string(),
        provider_type: vec!["account".to_string()],
        bank_type: vec!["retail".to_string()],
        name: id.to_string(),
        legal_name: id.to_string(),
        verified: false,
        status: "live".to_string(),
        icon: None,
        website_url: None,
        country_hq: "GB".to_string(),
        countries: vec!["GB".to_string()],
        web_application: true,
        mobile_apps: vec![],
        compliance: vec![],
        developer_portal_url: None,
        api_standards: vec![],
        api_products: vec![],
        api_aggregators: vec![],
        ownership: vec![],
        state_owned: false,
        stock_symbol: None,
        bic: None,
    }
}

pub fn candidate(name: &str, countries: &[&str]) -> Candidate {
    Candidate {
        name: name.to_string(),
        countries: countries.iter().map(|c| (*c).to_string()).collect(),
        bic: None,
        source_identifier: None,
    }
}

pub fn candidate_with_bic(name: &str, countries: &[&str], bic: &str) -> Candidate {
    Candidate {
        bic: Some(bic.to_string()),
        ..candidate(name, countries)
    }
}

pub fn registry_with_ids(ids: &[&str]) -> Registry {
    let mut store = MemoryStore::default();
    for id in ids {
        store.insert(minimal_provider(id));
    }
    Registry::load(&store).unwrap()
}
