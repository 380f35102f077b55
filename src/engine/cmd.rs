//! The `resolve` and `migrate` subcommands.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::info;

use super::{Engine, RunReport};
use crate::feeds::Feed;
use crate::filespec::FileSpec;
use crate::registry::Registry;
use crate::sidetable;
use crate::store::DirectoryStore;
use crate::tables::{Tables, TablesSpec};

/// Resolve one feed's candidates against the provider registry.
#[derive(Debug, clap::Args)]
pub struct ResolveCommand {
    /// Directory holding the provider registry (one JSON file per record).
    #[arg(long)]
    providers: PathBuf,

    /// Heuristic tables: a built-in preset name, or "file:<path>" for a
    /// RON tables file.
    #[arg(long, default_value = "default")]
    tables: TablesSpec,

    /// Where to maintain the canonical-id-to-source-id side table.
    #[arg(long)]
    mappings: Option<FileSpec>,

    /// Where to write the run report ("-" for stdout).
    #[arg(long, default_value = "-")]
    report: FileSpec,

    #[command(subcommand)]
    feed: Feed,
}

impl ResolveCommand {
    pub fn run(&self) -> Result<()> {
        let tables = self.tables.load()?;
        let report = run_feed(&self.providers, &tables, &self.feed)?;

        if let Some(mappings) = &self.mappings {
            if !report.source_ids.is_empty() {
                sidetable::update_file(mappings, &report.aggregator_tag, &report.source_ids)?;
            }
        }

        write_report(&self.report, &report)
    }
}

/// Replay several feeds in sequence from a RON plan file.
#[derive(Debug, clap::Args)]
pub struct MigrateCommand {
    /// Directory holding the provider registry (one JSON file per record).
    #[arg(long)]
    providers: PathBuf,

    /// RON plan describing the passes to run, in order.
    plan: FileSpec,

    /// Where to write the combined run reports ("-" for stdout).
    #[arg(long, default_value = "-")]
    report: FileSpec,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Plan {
    passes: Vec<Pass>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Pass {
    /// Preset name or "file:<path>", as on the command line. Defaults to
    /// the "default" preset.
    #[serde(default)]
    tables: Option<String>,
    /// Side table to maintain for this pass, if any.
    #[serde(default)]
    mappings: Option<FileSpec>,
    feed: Feed,
}

impl MigrateCommand {
    pub fn run(&self) -> Result<()> {
        let plan: Plan = ron::de::from_reader(self.plan.reader()?)
            .with_context(|| format!("parsing migration plan from {}", self.plan))?;
        if plan.passes.is_empty() {
            bail!("migration plan has no passes");
        }

        let mut out = self.report.writer()?;
        for (n, pass) in plan.passes.iter().enumerate() {
            info!("migration pass {} of {}", n + 1, plan.passes.len());
            let tables = match &pass.tables {
                Some(spec) => spec.parse::<TablesSpec>()?.load()?,
                None => Tables::default(),
            };

            // Each pass reloads the registry so it observes everything
            // earlier passes wrote.
            let report = run_feed(&self.providers, &tables, &pass.feed)?;

            if let Some(mappings) = &pass.mappings {
                if !report.source_ids.is_empty() {
                    sidetable::update_file(mappings, &report.aggregator_tag, &report.source_ids)?;
                }
            }

            write!(out, "{}", report)?;
        }
        Ok(())
    }
}

fn run_feed(providers: &Path, tables: &Tables, feed: &Feed) -> Result<RunReport> {
    let source = feed.source();
    let candidates = source.candidates()?;

    let mut store = DirectoryStore::new(providers);
    let mut registry = Registry::load(&store)
        .with_context(|| format!("loading provider registry from {:?}", providers))?;
    if registry.is_empty() {
        info!(
            "provider registry at {:?} is empty; every candidate will create a new record",
            providers
        );
    }

    let engine = Engine::new(tables);
    engine.resolve_batch(&mut store, &mut registry, source.aggregator_tag(), candidates)
}

fn write_report(file_spec: &FileSpec, report: &RunReport) -> Result<()> {
    let mut out = file_spec.writer()?;
    write!(out, "{}", report).with_context(|| format!("writing report to {}", file_spec))
}
