//! The candidate-to-existing-record matching cascade.
//!
//! Institution names vary across feeds by legal-entity suffix and by
//! country qualifier ("TD Bank USA" vs canonical "td-bank"), so the
//! cascade approximates deduplication structurally instead of with a
//! string-distance metric. The first pass to hit wins; there is no
//! "best match" tie-breaking, which trades occasional false positives
//! for determinism and speed.

use crate::registry::Registry;
use crate::tables::Tables;

pub struct Matcher {
    country_suffixes: Vec<String>,
    type_suffixes: Vec<String>,
}

impl Matcher {
    pub fn new(tables: &Tables) -> Self {
        Matcher {
            country_suffixes: tables.country_suffixes.clone(),
            type_suffixes: tables.type_suffixes.clone(),
        }
    }

    /// Finds the existing canonical id the slug most likely refers to,
    /// or `None` if a new record must be created.
    ///
    /// Passes run in this exact precedence order, returning on the first
    /// hit: exact id, country-suffix strip, type-suffix strip, type-suffix
    /// addition, fixed name-variation rewrites.
    pub fn find_match(&self, slug: &str, registry: &Registry) -> Option<String> {
        if registry.contains(slug) {
            return Some(slug.to_string());
        }

        for suffix in &self.country_suffixes {
            if let Some(base) = slug.strip_suffix(suffix.as_str()) {
                if registry.contains(base) {
                    return Some(base.to_string());
                }
            }
        }

        for suffix in &self.type_suffixes {
            if let Some(base) = slug.strip_suffix(suffix.as_str()) {
                if registry.contains(base) {
                    return Some(base.to_string());
                }
            }
        }

        for suffix in &self.type_suffixes {
            let extended = format!("{}{}", slug, suffix);
            if registry.contains(&extended) {
                return Some(extended);
            }
        }

        for variant in variations(slug) {
            if registry.contains(&variant) {
                return Some(variant);
            }
        }

        None
    }
}

/// The fixed name-variation rewrites, tried in order: joined "and",
/// hyphens removed, leading "bank-of-" dropped, trailing "-bank" dropped.
fn variations(slug: &str) -> Vec<String> {
    let mut variants = vec![slug.replace("-and-", "-"), slug.replace('-', "")];
    if let Some(base) = slug.strip_prefix("bank-of-") {
        variants.push(base.to_string());
    }
    if let Some(base) = slug.strip_suffix("-bank") {
        variants.push(base.to_string());
    }
    variants
}
