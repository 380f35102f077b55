//! Read-only consistency checks over the provider registry.
//!
//! The resolver keeps these invariants as it writes; the audit catches
//! hand-edits and historical records that predate the current rules.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Result};
use itertools::Itertools;

use crate::bic::Bic;
use crate::filespec::FileSpec;
use crate::slug::{Normalizer, TransliterationTable};
use crate::store::{DirectoryStore, ProviderStore};
use crate::tables::{Tables, TablesSpec};

#[derive(Debug, PartialEq, Eq)]
pub enum Issue {
    UnreadableRecord { id: String, error: String },
    /// `apiAggregators` must stay sorted and free of duplicates.
    UnsortedAggregators { id: String },
    DuplicateAggregators { id: String },
    MalformedBic { id: String, bic: String },
    DuplicateBic { bic: String, ids: Vec<String> },
    /// The storage key disagrees with the record's own `id`; writes go
    /// through the internal id, so updating this record would strand the
    /// unit under the old key.
    IdMismatch { key: String, id: String },
    /// The id is not a fixed point of name normalization.
    UnnormalizedId { id: String, expected: String },
    /// Ids that differ only in hyphenation usually mean one institution
    /// got in twice under slightly different names.
    LikelyDuplicates { ids: Vec<String> },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Issue::*;
        match self {
            UnreadableRecord { id, error } => write!(f, "{}: unreadable record: {}", id, error),
            UnsortedAggregators { id } => write!(f, "{}: apiAggregators is not sorted", id),
            DuplicateAggregators { id } => {
                write!(f, "{}: apiAggregators has duplicate entries", id)
            }
            MalformedBic { id, bic } => write!(f, "{}: malformed BIC {:?}", id, bic),
            DuplicateBic { bic, ids } => write!(
                f,
                "BIC {} appears on multiple records: {}",
                bic,
                ids.iter().join(", ")
            ),
            IdMismatch { key, id } => {
                write!(f, "{}: record declares id {:?}", key, id)
            }
            UnnormalizedId { id, expected } => {
                write!(f, "{}: id is not normalized (expected {:?})", id, expected)
            }
            LikelyDuplicates { ids } => {
                write!(f, "likely duplicate records: {}", ids.iter().join(", "))
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct AuditReport {
    pub records_checked: usize,
    pub issues: Vec<Issue>,
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Checked {} records, {} issues.",
            self.records_checked,
            self.issues.len()
        )?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

pub fn run_audit(store: &dyn ProviderStore, normalizer: &Normalizer) -> Result<AuditReport> {
    let mut report = AuditReport::default();
    let mut by_bic: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut by_squashed: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for id in store.list_ids()? {
        let provider = match store.read(&id) {
            Ok(provider) => provider,
            Err(err) => {
                report.issues.push(Issue::UnreadableRecord {
                    id,
                    error: format!("{:#}", err),
                });
                continue;
            }
        };
        report.records_checked += 1;

        if provider.id != id {
            report.issues.push(Issue::IdMismatch {
                key: id.clone(),
                id: provider.id.clone(),
            });
        }

        let tags = &provider.api_aggregators;
        if tags.windows(2).any(|w| w[0] > w[1]) {
            report.issues.push(Issue::UnsortedAggregators { id: id.clone() });
        } else if tags.windows(2).any(|w| w[0] == w[1]) {
            report.issues.push(Issue::DuplicateAggregators { id: id.clone() });
        }

        if let Some(bic) = provider.bic.as_deref() {
            match bic.parse::<Bic>() {
                Ok(bic) => by_bic.entry(bic.as_str().to_string()).or_default().push(id.clone()),
                Err(_) => report.issues.push(Issue::MalformedBic {
                    id: id.clone(),
                    bic: bic.to_string(),
                }),
            }
        }

        let expected = normalizer.normalize(&id);
        if expected != id {
            report.issues.push(Issue::UnnormalizedId {
                id: id.clone(),
                expected,
            });
        }

        by_squashed.entry(id.replace('-', "")).or_default().push(id);
    }

    for (bic, ids) in by_bic {
        if ids.len() > 1 {
            report.issues.push(Issue::DuplicateBic { bic, ids });
        }
    }
    for (_, ids) in by_squashed {
        if ids.len() > 1 {
            report.issues.push(Issue::LikelyDuplicates { ids });
        }
    }

    Ok(report)
}

/// Audit the registry for consistency problems without modifying it.
#[derive(Debug, clap::Args)]
pub struct CheckCommand {
    /// Directory holding the provider registry (one JSON file per record).
    #[arg(long)]
    providers: PathBuf,

    /// Heuristic tables used for normalization checks.
    #[arg(long, default_value = "default")]
    tables: TablesSpec,

    /// Where to write the audit report ("-" for stdout).
    #[arg(long, default_value = "-")]
    report: FileSpec,

    /// Fail (exit non-zero) if any issue is found.
    #[arg(long)]
    strict: bool,
}

impl CheckCommand {
    pub fn run(&self) -> Result<()> {
        let tables: Tables = self.tables.load()?;
        let mut transliterations = TransliterationTable::builtin();
        transliterations.extend(&tables.transliterations);
        let normalizer = Normalizer::new(transliterations);

        let store = DirectoryStore::new(&self.providers);
        let audit = run_audit(&store, &normalizer)?;

        let mut out = self.report.writer()?;
        write!(out, "{}", audit)?;

        if self.strict && !audit.issues.is_empty() {
            bail!("audit found {} issues", audit.issues.len());
        }
        Ok(())
    }
}
