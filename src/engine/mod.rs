//! The resolution engine: drives one feed's candidate batch through
//! normalize -> match -> merge against a shared registry, one candidate
//! at a time to completion.

pub mod cmd;

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{bail, Result};
use tracing::{debug, info};

use crate::bic::Bic;
use crate::matcher::Matcher;
use crate::merge::{self, MergeOutcome};
use crate::provider::Candidate;
use crate::registry::{Registry, StorageError};
use crate::slug::{Normalizer, TransliterationTable};
use crate::store::ProviderStore;
use crate::tables::Tables;

/// A BIC that could not be attached because it already belongs to a
/// different canonical record. Reported for manual review, never
/// auto-resolved.
#[derive(Debug)]
pub struct BicConflict {
    pub candidate_name: String,
    pub bic: Bic,
    /// The record the candidate resolved to by name.
    pub resolved_id: String,
    /// The record that already owns the code.
    pub owner_id: String,
}

/// A synthesized id that collided with an unrelated existing record and
/// could not be disambiguated.
#[derive(Debug)]
pub struct IdCollision {
    pub candidate_name: String,
    pub id: String,
}

#[derive(Debug, Default)]
pub struct RunStats {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Name normalized to the empty slug.
    pub rejected_empty_name: usize,
    /// No usable two-letter country code.
    pub rejected_no_countries: usize,
    /// Malformed BICs dropped from otherwise-accepted candidates.
    pub invalid_bics_dropped: usize,
}

/// Everything the operator sees at the end of one batch.
#[derive(Debug)]
pub struct RunReport {
    pub aggregator_tag: String,
    pub stats: RunStats,
    pub bic_conflicts: Vec<BicConflict>,
    pub id_collisions: Vec<IdCollision>,
    pub storage_errors: Vec<StorageError>,
    /// Canonical id -> feed-native identifier, for the cross-run
    /// side-table. Never stored inside the canonical records.
    pub source_ids: BTreeMap<String, String>,
}

impl RunReport {
    fn new(aggregator_tag: &str) -> Self {
        RunReport {
            aggregator_tag: aggregator_tag.to_string(),
            stats: RunStats::default(),
            bic_conflicts: Vec::new(),
            id_collisions: Vec::new(),
            storage_errors: Vec::new(),
            source_ids: BTreeMap::new(),
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Summary for feed {:?}:", self.aggregator_tag)?;
        writeln!(f, "  {} new providers created", self.stats.created)?;
        writeln!(f, "  {} providers updated", self.stats.updated)?;
        writeln!(f, "  {} unchanged", self.stats.unchanged)?;
        writeln!(
            f,
            "  {} rejected (name normalized to nothing)",
            self.stats.rejected_empty_name
        )?;
        writeln!(
            f,
            "  {} rejected (no usable country code)",
            self.stats.rejected_no_countries
        )?;
        writeln!(
            f,
            "  {} malformed BICs dropped",
            self.stats.invalid_bics_dropped
        )?;
        if !self.bic_conflicts.is_empty() {
            writeln!(f, "  BIC conflicts needing manual review:")?;
            for c in &self.bic_conflicts {
                writeln!(
                    f,
                    "    {} from {:?} resolved to {} but the code belongs to {}",
                    c.bic, c.candidate_name, c.resolved_id, c.owner_id
                )?;
            }
        }
        if !self.id_collisions.is_empty() {
            writeln!(f, "  id collisions left unresolved:")?;
            for c in &self.id_collisions {
                writeln!(f, "    {:?} collides with existing {}", c.candidate_name, c.id)?;
            }
        }
        if !self.storage_errors.is_empty() {
            writeln!(f, "  storage errors:")?;
            for e in &self.storage_errors {
                writeln!(f, "    {}: {}", e.id, e.error)?;
            }
        }
        Ok(())
    }
}

pub struct Engine {
    normalizer: Normalizer,
    matcher: Matcher,
}

impl Engine {
    pub fn new(tables: &Tables) -> Self {
        let mut transliterations = TransliterationTable::builtin();
        transliterations.extend(&tables.transliterations);
        Engine {
            normalizer: Normalizer::new(transliterations),
            matcher: Matcher::new(tables),
        }
    }

    /// Resolves one batch against the registry, persisting through the
    /// store as it goes so later candidates in the batch can match
    /// records created earlier in the same run.
    ///
    /// Per-candidate problems are counted, not fatal; only an empty
    /// aggregator tag aborts the batch.
    pub fn resolve_batch(
        &self,
        store: &mut dyn ProviderStore,
        registry: &mut Registry,
        aggregator_tag: &str,
        candidates: Vec<Candidate>,
    ) -> Result<RunReport> {
        let tag = aggregator_tag.trim().to_lowercase();
        if tag.is_empty() {
            bail!("batch has no aggregator tag");
        }

        let mut report = RunReport::new(&tag);
        report.storage_errors = registry.take_load_errors();

        info!(
            "resolving {} candidates from feed {:?} against {} existing providers",
            candidates.len(),
            tag,
            registry.len()
        );

        for candidate in candidates {
            self.resolve_one(store, registry, &tag, candidate, &mut report);
        }

        Ok(report)
    }

    fn resolve_one(
        &self,
        store: &mut dyn ProviderStore,
        registry: &mut Registry,
        tag: &str,
        candidate: Candidate,
        report: &mut RunReport,
    ) {
        let countries = sanitize_countries(&candidate.countries);
        if countries.is_empty() {
            debug!("rejecting {:?}: no usable country code", candidate.name);
            report.stats.rejected_no_countries += 1;
            return;
        }

        let slug = self.normalizer.normalize(&candidate.name);
        if slug.is_empty() {
            debug!("rejecting {:?}: name normalized to nothing", candidate.name);
            report.stats.rejected_empty_name += 1;
            return;
        }

        // A malformed BIC drops silently; the rest of the candidate is
        // still worth keeping.
        let bic = match candidate.bic.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<Bic>() {
                Ok(bic) => Some(bic),
                Err(_) => {
                    report.stats.invalid_bics_dropped += 1;
                    None
                }
            },
        };

        match self.matcher.find_match(&slug, registry) {
            Some(id) => self.update_existing(store, registry, tag, &candidate, &id, bic, report),
            None => {
                self.create_new(store, registry, tag, &candidate, slug, &countries, bic, report)
            }
        }
    }

    fn update_existing(
        &self,
        store: &mut dyn ProviderStore,
        registry: &mut Registry,
        tag: &str,
        candidate: &Candidate,
        id: &str,
        bic: Option<Bic>,
        report: &mut RunReport,
    ) {
        let bic = self.checked_bic(registry, candidate, id, bic, report);

        let mut provider = match registry.get(id) {
            Some(provider) => provider.clone(),
            // The matcher only returns indexed ids, so this is a bug
            // guard rather than an expected path.
            None => {
                report.storage_errors.push(StorageError {
                    id: id.to_string(),
                    error: "matched id missing from registry index".to_string(),
                });
                return;
            }
        };

        match merge::merge_into(&mut provider, tag, bic.as_ref()) {
            MergeOutcome::Unchanged => report.stats.unchanged += 1,
            MergeOutcome::Updated => match registry.put(store, provider) {
                Ok(()) => {
                    debug!("updated {} from candidate {:?}", id, candidate.name);
                    report.stats.updated += 1;
                }
                Err(err) => report.storage_errors.push(StorageError {
                    id: id.to_string(),
                    error: format!("{:#}", err),
                }),
            },
        }

        if let Some(source_id) = &candidate.source_identifier {
            report.source_ids.insert(id.to_string(), source_id.clone());
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn create_new(
        &self,
        store: &mut dyn ProviderStore,
        registry: &mut Registry,
        tag: &str,
        candidate: &Candidate,
        slug: String,
        countries: &[String],
        bic: Option<Bic>,
        report: &mut RunReport,
    ) {
        // The exact-match pass means the slug is normally free, but an
        // unrelated record must never be overwritten.
        let id = if registry.contains(&slug) {
            match self.disambiguated_id(&slug, candidate, bic.as_ref()) {
                Some(alt) if !registry.contains(&alt) => alt,
                _ => {
                    report.id_collisions.push(IdCollision {
                        candidate_name: candidate.name.clone(),
                        id: slug,
                    });
                    return;
                }
            }
        } else {
            slug
        };

        let bic = self.checked_bic(registry, candidate, &id, bic, report);

        let provider = merge::new_provider(&id, candidate, countries, tag, bic.as_ref());
        match registry.put(store, provider) {
            Ok(()) => {
                debug!("created {} from candidate {:?}", id, candidate.name);
                report.stats.created += 1;
                if let Some(source_id) = &candidate.source_identifier {
                    report.source_ids.insert(id, source_id.clone());
                }
            }
            Err(err) => report.storage_errors.push(StorageError {
                id,
                error: format!("{:#}", err),
            }),
        }
    }

    /// Withholds a candidate BIC that already belongs to a different
    /// record, recording the conflict for manual review. The secondary
    /// key is never reassigned by this engine.
    fn checked_bic(
        &self,
        registry: &Registry,
        candidate: &Candidate,
        resolved_id: &str,
        bic: Option<Bic>,
        report: &mut RunReport,
    ) -> Option<Bic> {
        let bic = bic?;
        match registry.id_for_bic(&bic) {
            Some(owner) if owner != resolved_id => {
                report.bic_conflicts.push(BicConflict {
                    candidate_name: candidate.name.clone(),
                    bic,
                    resolved_id: resolved_id.to_string(),
                    owner_id: owner.to_string(),
                });
                None
            }
            _ => Some(bic),
        }
    }

    /// Fallback id for a create that collided: the slug extended with the
    /// candidate's BIC, or failing that its normalized source identifier.
    fn disambiguated_id(
        &self,
        slug: &str,
        candidate: &Candidate,
        bic: Option<&Bic>,
    ) -> Option<String> {
        if let Some(bic) = bic {
            return Some(format!("{}-{}", slug, bic.as_str().to_lowercase()));
        }
        let source_id = candidate.source_identifier.as_deref()?;
        let suffix = self.normalizer.normalize(source_id);
        if suffix.is_empty() {
            None
        } else {
            Some(format!("{}-{}", slug, suffix))
        }
    }
}

/// Trims, upper-cases, de-duplicates, and keeps only plausible ISO
/// 3166-1 alpha-2 codes.
fn sanitize_countries(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for code in raw {
        let code = code.trim().to_ascii_uppercase();
        if code.len() == 2
            && code.bytes().all(|b| b.is_ascii_uppercase())
            && !out.contains(&code)
        {
            out.push(code);
        }
    }
    out
}
