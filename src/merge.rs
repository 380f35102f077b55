//! Create and update semantics for canonical records.
//!
//! Updates only ever fill gaps: a field that already holds a value is
//! never overwritten, so re-running any feed against the registry is
//! harmless.

use crate::bic::Bic;
use crate::provider::{Candidate, Provider};

/// Outcome of merging a candidate into an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// At least one field changed; the record needs persisting.
    Updated,
    /// The record already carried everything the candidate offered.
    Unchanged,
}

/// Builds a brand-new canonical record for an unmatched candidate,
/// applying the registry schema defaults for everything the candidate
/// does not supply.
pub fn new_provider(
    id: &str,
    candidate: &Candidate,
    countries: &[String],
    aggregator_tag: &str,
    bic: Option<&Bic>,
) -> Provider {
    Provider {
        id: id.to_string(),
        provider_type: vec!["account".to_string()],
        bank_type: vec!["retail".to_string()],
        name: candidate.name.clone(),
        legal_name: candidate.name.clone(),
        verified: false,
        status: "live".to_string(),
        icon: Some(icon_url(id)),
        website_url: None,
        country_hq: countries.first().cloned().unwrap_or_default(),
        countries: countries.to_vec(),
        web_application: true,
        mobile_apps: vec![],
        compliance: vec![],
        developer_portal_url: None,
        api_standards: vec![],
        api_products: vec![],
        api_aggregators: vec![aggregator_tag.to_string()],
        ownership: vec![],
        state_owned: false,
        stock_symbol: None,
        bic: bic.map(|b| b.as_str().to_string()),
    }
}

/// Best-effort icon guess from the slug; verified records get curated
/// icons later, outside this engine.
fn icon_url(id: &str) -> String {
    format!("https://icons.duckduckgo.com/ip3/www.{}.com.ico", id)
}

/// Merges candidate attributes into an existing record. Only the
/// aggregator tag set and an absent BIC are ever touched; the caller is
/// responsible for withholding a BIC that belongs to another record.
pub fn merge_into(provider: &mut Provider, aggregator_tag: &str, bic: Option<&Bic>) -> MergeOutcome {
    let mut changed = false;

    if !provider
        .api_aggregators
        .iter()
        .any(|tag| tag == aggregator_tag)
    {
        provider.api_aggregators.push(aggregator_tag.to_string());
        provider.api_aggregators.sort();
        provider.api_aggregators.dedup();
        changed = true;
    }

    if provider.bic.is_none() {
        if let Some(bic) = bic {
            provider.bic = Some(bic.as_str().to_string());
            changed = true;
        }
    }

    if changed {
        MergeOutcome::Updated
    } else {
        MergeOutcome::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::candidate;

    fn bic(s: &str) -> Bic {
        s.parse().unwrap()
    }

    #[test]
    fn new_provider_applies_schema_defaults() {
        let cand = candidate("Example Savings", &["US"]);
        let provider = new_provider("example-savings", &cand, &cand.countries, "acme", None);

        assert_eq!(provider.id, "example-savings");
        assert_eq!(provider.name, "Example Savings");
        assert_eq!(provider.legal_name, "Example Savings");
        assert_eq!(provider.country_hq, "US");
        assert_eq!(provider.countries, vec!["US"]);
        assert_eq!(provider.api_aggregators, vec!["acme"]);
        assert_eq!(provider.provider_type, vec!["account"]);
        assert_eq!(provider.bank_type, vec!["retail"]);
        assert!(!provider.verified);
        assert_eq!(provider.status, "live");
        assert!(provider.web_application);
        assert!(!provider.state_owned);
        assert_eq!(
            provider.icon.as_deref(),
            Some("https://icons.duckduckgo.com/ip3/www.example-savings.com.ico")
        );
        assert!(provider.bic.is_none());
        assert!(provider.mobile_apps.is_empty());
        assert!(provider.compliance.is_empty());
    }

    #[test]
    fn new_provider_keeps_all_candidate_countries() {
        let cand = candidate("Nordea", &["SE", "NO", "FI", "DK"]);
        let provider = new_provider("nordea", &cand, &cand.countries, "gocardless", None);
        assert_eq!(provider.country_hq, "SE");
        assert_eq!(provider.countries, vec!["SE", "NO", "FI", "DK"]);
    }

    #[test]
    fn merge_adds_tag_in_sorted_position() {
        let cand = candidate("Some Bank", &["GB"]);
        let mut provider = new_provider("some-bank", &cand, &cand.countries, "plaid", None);
        provider.api_aggregators = vec!["gocardless".to_string(), "yapily".to_string()];

        assert_eq!(merge_into(&mut provider, "plaid", None), MergeOutcome::Updated);
        assert_eq!(provider.api_aggregators, vec!["gocardless", "plaid", "yapily"]);
    }

    #[test]
    fn merge_is_idempotent() {
        let cand = candidate("Some Bank", &["GB"]);
        let mut provider = new_provider("some-bank", &cand, &cand.countries, "plaid", None);

        let deutdeff = bic("DEUTDEFF");
        assert_eq!(
            merge_into(&mut provider, "acme", Some(&deutdeff)),
            MergeOutcome::Updated
        );
        let snapshot = provider.clone();

        assert_eq!(
            merge_into(&mut provider, "acme", Some(&deutdeff)),
            MergeOutcome::Unchanged
        );
        assert_eq!(provider, snapshot);
    }

    #[test]
    fn merge_fills_absent_bic_only() {
        let cand = candidate("Some Bank", &["DE"]);
        let mut provider = new_provider("some-bank", &cand, &cand.countries, "acme", None);

        assert_eq!(
            merge_into(&mut provider, "acme", Some(&bic("DEUTDEFF"))),
            MergeOutcome::Updated
        );
        assert_eq!(provider.bic.as_deref(), Some("DEUTDEFF"));

        // A different BIC never replaces a present one.
        assert_eq!(
            merge_into(&mut provider, "acme", Some(&bic("NDEAFIHH"))),
            MergeOutcome::Unchanged
        );
        assert_eq!(provider.bic.as_deref(), Some("DEUTDEFF"));
    }

    #[test]
    fn merge_never_touches_descriptive_fields() {
        let cand = candidate("Some Bank", &["GB"]);
        let mut provider = new_provider("some-bank", &cand, &cand.countries, "acme", None);
        provider.verified = true;
        provider.status = "beta".to_string();
        provider.website_url = Some("https://some.bank".to_string());
        let snapshot = provider.clone();

        merge_into(&mut provider, "other", None);

        assert!(provider.verified);
        assert_eq!(provider.status, "beta");
        assert_eq!(provider.website_url, snapshot.website_url);
        assert_eq!(provider.name, snapshot.name);
        assert_eq!(provider.countries, snapshot.countries);
    }
}
