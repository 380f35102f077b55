//! JSON candidate feed: a file holding an array of candidate records in
//! the engine's own shape.

use anyhow::{Context, Result};
use serde::Deserialize;

use super::CandidateSource;
use crate::filespec::{self, FileSpec};
use crate::provider::Candidate;

#[derive(Debug, Clone, clap::Args, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonFeed {
    /// JSON file holding an array of candidate records ("-" for stdin).
    pub input: FileSpec,

    /// Aggregator tag to record on matched providers.
    #[arg(long)]
    pub tag: String,
}

impl CandidateSource for JsonFeed {
    fn aggregator_tag(&self) -> &str {
        &self.tag
    }

    fn candidates(&self) -> Result<Vec<Candidate>> {
        let candidates: Vec<Candidate> = filespec::read_json(&self.input)
            .with_context(|| format!("reading JSON feed from {}", self.input))?;
        Ok(candidates)
    }
}
