//! The side table mapping canonical ids to a feed's own institution
//! identifiers. Kept outside the canonical records so feed-private ids
//! never leak into the registry schema.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filespec::{self, FileSpec};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SourceIdTable {
    pub aggregator: String,
    pub generated_at: DateTime<Utc>,
    /// Canonical provider id -> the feed's native identifier.
    pub mappings: BTreeMap<String, String>,
}

impl SourceIdTable {
    pub fn new(aggregator: &str) -> Self {
        SourceIdTable {
            aggregator: aggregator.to_string(),
            generated_at: Utc::now(),
            mappings: BTreeMap::new(),
        }
    }
}

/// Merges the run's mappings over any table already at `file_spec` and
/// writes the result back. New mappings win over stale ones; entries
/// for providers not seen this run are kept.
pub fn update_file(
    file_spec: &FileSpec,
    aggregator: &str,
    mappings: &BTreeMap<String, String>,
) -> Result<()> {
    let mut table = if file_spec.exists() {
        let table: SourceIdTable = filespec::read_json(file_spec)
            .with_context(|| format!("reading existing side table from {}", file_spec))?;
        if table.aggregator != aggregator {
            bail!(
                "side table at {} belongs to feed {:?}, not {:?}",
                file_spec,
                table.aggregator,
                aggregator
            );
        }
        table
    } else {
        SourceIdTable::new(aggregator)
    };

    table.generated_at = Utc::now();
    for (id, source_id) in mappings {
        table.mappings.insert(id.clone(), source_id.clone());
    }

    filespec::write_json(file_spec, &table)
        .with_context(|| format!("writing side table to {}", file_spec))
}
