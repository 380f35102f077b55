//! The canonical account-provider record and the per-feed candidate
//! observations reconciled into it.

use serde::{Deserialize, Serialize};

/// The single authoritative entry for one real-world institution.
///
/// Field names and the overall field set are fixed by the on-disk registry
/// format and must not change. The resolution engine only ever touches
/// `apiAggregators` and `bic` on existing records; everything else is
/// carried through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    /// Slug identifier, also the storage key. Immutable once assigned.
    pub id: String,
    #[serde(rename = "type")]
    pub provider_type: Vec<String>,
    pub bank_type: Vec<String>,
    pub name: String,
    pub legal_name: String,
    pub verified: bool,
    pub status: String,
    pub icon: Option<String>,
    pub website_url: Option<String>,
    #[serde(rename = "countryHQ")]
    pub country_hq: String,
    pub countries: Vec<String>,
    pub web_application: bool,
    // List fields the engine never interprets are kept as raw JSON so a
    // read-modify-write cannot damage them.
    pub mobile_apps: Vec<serde_json::Value>,
    pub compliance: Vec<serde_json::Value>,
    pub developer_portal_url: Option<String>,
    pub api_standards: Vec<String>,
    pub api_products: Vec<serde_json::Value>,
    /// Tags of the feeds that can reach this institution. Always sorted
    /// and free of duplicates.
    pub api_aggregators: Vec<String>,
    pub ownership: Vec<serde_json::Value>,
    pub state_owned: bool,
    pub stock_symbol: Option<String>,
    /// ISO 9362 code; at most one record per code value. Stored as the
    /// raw string so pre-existing malformed values survive rewrites.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bic: Option<String>,
}

/// One observation of an institution from a single external feed.
///
/// The aggregator tag is carried by the batch, not by each candidate; see
/// `feeds::CandidateSource`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub name: String,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub bic: Option<String>,
    /// Feed-native id, used only for cross-run id-mapping bookkeeping,
    /// never for matching.
    #[serde(default, rename = "sourceIdentifier")]
    pub source_identifier: Option<String>,
}
