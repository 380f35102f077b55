//! CSV candidate feed.
//!
//! Column positions are configured per export rather than sniffed from
//! headers, because aggregator CSV dumps disagree on header naming and
//! some ship without headers at all.

use std::collections::HashSet;
use std::io::Read;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::debug;

use super::{parse_countries, CandidateSource};
use crate::filespec::FileSpec;
use crate::provider::Candidate;

#[derive(Debug, Clone, clap::Args, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CsvFeed {
    /// CSV file to read candidates from ("-" for stdin).
    pub input: FileSpec,

    /// Aggregator tag to record on matched providers.
    #[arg(long)]
    pub tag: String,

    /// Zero-based column holding the institution name.
    #[arg(long, default_value_t = 0)]
    #[serde(default)]
    pub name_column: usize,

    /// Zero-based column holding the BIC, if the export carries one.
    #[arg(long)]
    #[serde(default)]
    pub bic_column: Option<usize>,

    /// Zero-based column holding a delimited country-code list.
    #[arg(long)]
    #[serde(default)]
    pub countries_column: Option<usize>,

    /// Fixed country codes applied to every row, for single-market
    /// exports without a countries column.
    #[arg(long = "country")]
    #[serde(default)]
    pub countries: Vec<String>,

    /// Zero-based column holding the feed's own institution identifier.
    #[arg(long)]
    #[serde(default)]
    pub source_id_column: Option<usize>,

    /// Leading rows to skip (headers).
    #[arg(long, default_value_t = 1)]
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,
}

fn default_skip_rows() -> usize {
    1
}

impl CandidateSource for CsvFeed {
    fn aggregator_tag(&self) -> &str {
        &self.tag
    }

    fn candidates(&self) -> Result<Vec<Candidate>> {
        let reader = self.input.reader()?;
        self.candidates_from_reader(reader)
            .with_context(|| format!("reading CSV feed from {}", self.input))
    }
}

impl CsvFeed {
    fn candidates_from_reader(&self, reader: impl Read) -> Result<Vec<Candidate>> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let fixed_countries = parse_countries(&self.countries);
        let mut seen: HashSet<String> = HashSet::new();
        let mut candidates = Vec::new();

        for (row, record) in csv_reader.records().enumerate() {
            let record = record.with_context(|| format!("CSV row {}", row + 1))?;
            if row < self.skip_rows {
                continue;
            }

            let name = match record.get(self.name_column) {
                Some(name) if !name.trim().is_empty() => name.trim().to_string(),
                _ => {
                    debug!("skipping CSV row {}: empty name column", row + 1);
                    continue;
                }
            };

            let source_identifier = self
                .source_id_column
                .and_then(|col| record.get(col))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            // Exports routinely repeat an institution per product line;
            // only the first occurrence matters to the resolver.
            let dedup_key = source_identifier.clone().unwrap_or_else(|| name.clone());
            if !seen.insert(dedup_key) {
                continue;
            }

            let countries = match self.countries_column {
                Some(col) => parse_countries(
                    record
                        .get(col)
                        .unwrap_or_default()
                        .split([';', ','])
                        .collect::<Vec<_>>(),
                ),
                None => fixed_countries.clone(),
            };

            let bic = self
                .bic_column
                .and_then(|col| record.get(col))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            candidates.push(Candidate {
                name,
                countries,
                bic,
                source_identifier,
            });
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> CsvFeed {
        CsvFeed {
            input: FileSpec::Stdio,
            tag: "acme".to_string(),
            name_column: 0,
            bic_column: Some(1),
            countries_column: Some(2),
            countries: vec![],
            source_id_column: Some(3),
            skip_rows: 1,
        }
    }

    #[test]
    fn parses_rows_after_headers() {
        let data = "\
name,bic,countries,id
Deutsche Bank,DEUTDEFF,DE;AT,db-1
Monzo,,GB,monzo-1
";
        let candidates = feed().candidates_from_reader(data.as_bytes()).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].name, "Deutsche Bank");
        assert_eq!(candidates[0].bic.as_deref(), Some("DEUTDEFF"));
        assert_eq!(candidates[0].countries, vec!["DE", "AT"]);
        assert_eq!(candidates[0].source_identifier.as_deref(), Some("db-1"));
        assert!(candidates[1].bic.is_none());
    }

    #[test]
    fn deduplicates_by_source_identifier_then_name() {
        let data = "\
name,bic,countries,id
Monzo,,GB,monzo-1
Monzo Personal,,GB,monzo-1
Starling,,GB,
Starling,,GB,
";
        let candidates = feed().candidates_from_reader(data.as_bytes()).unwrap();
        let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Monzo", "Starling"]);
    }

    #[test]
    fn skips_rows_with_empty_names() {
        let data = "\
name,bic,countries,id
,,GB,x-1
Starling,,GB,x-2
";
        let candidates = feed().candidates_from_reader(data.as_bytes()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Starling");
    }

    #[test]
    fn fixed_countries_apply_when_no_column_is_configured() {
        let mut feed = feed();
        feed.countries_column = None;
        feed.countries = vec!["ca".to_string(), "us".to_string()];

        let data = "\
name,bic,countries,id
Tangerine,,,t-1
";
        let candidates = feed.candidates_from_reader(data.as_bytes()).unwrap();
        assert_eq!(candidates[0].countries, vec!["CA", "US"]);
    }

    #[test]
    fn short_rows_are_tolerated() {
        let data = "\
name
Lone Bank
";
        let mut feed = feed();
        feed.countries_column = None;
        feed.countries = vec!["GB".to_string()];
        let candidates = feed.candidates_from_reader(data.as_bytes()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].bic.is_none());
        assert!(candidates[0].source_identifier.is_none());
    }
}
