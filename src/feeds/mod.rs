//! Candidate feeds: adapters that turn aggregator exports into the
//! common [`Candidate`] shape the engine resolves.

pub mod csv;
pub mod json;

use anyhow::Result;
use serde::Deserialize;

use crate::provider::Candidate;

/// A source of candidate records for one resolution run.
pub trait CandidateSource {
    /// The lowercase tag recorded in `apiAggregators` for matches from
    /// this source.
    fn aggregator_tag(&self) -> &str;

    fn candidates(&self) -> Result<Vec<Candidate>>;
}

/// The supported feed formats. Doubles as the CLI subcommand for
/// `resolve` and as the feed description inside a migration plan.
#[derive(Debug, Clone, clap::Subcommand, Deserialize)]
pub enum Feed {
    /// Read candidates from a CSV export.
    Csv(csv::CsvFeed),
    /// Read candidates from a JSON array of records.
    Json(json::JsonFeed),
}

impl Feed {
    pub fn source(&self) -> &dyn CandidateSource {
        use Feed::*;
        match self {
            Csv(feed) => feed,
            Json(feed) => feed,
        }
    }
}

/// Cleans a raw country-code list from a feed. Region pseudo-codes and
/// sandbox markers are dropped here so the engine only ever sees
/// plausible ISO codes.
pub fn parse_countries<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|code| code.as_ref().trim().to_ascii_uppercase())
        .filter(|code| !code.is_empty() && code != "EEA" && code != "XX")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_countries_drops_pseudo_codes() {
        assert_eq!(
            parse_countries(["gb", " fr ", "EEA", "XX", "", "DE"]),
            vec!["GB", "FR", "DE"]
        );
    }
}
