//! Normalization of institution display names into canonical slug
//! identifiers, which double as registry storage keys.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::Deserialize;

/// Maximum length of a generated slug, to keep it usable as a storage key.
pub const MAX_SLUG_LEN: usize = 80;

lazy_static! {
    static ref DEFAULT_TABLE: TransliterationTable = TransliterationTable::from_pairs(&[
        ('ä', "ae"),
        ('ö', "oe"),
        ('ü', "ue"),
        ('ß', "ss"),
        ('á', "a"),
        ('à', "a"),
        ('â', "a"),
        ('ã', "a"),
        ('å', "a"),
        ('ą', "a"),
        ('ă', "a"),
        ('é', "e"),
        ('è', "e"),
        ('ê', "e"),
        ('ë', "e"),
        ('ę', "e"),
        ('ě', "e"),
        ('í', "i"),
        ('ì', "i"),
        ('î', "i"),
        ('ï', "i"),
        ('ó', "o"),
        ('ò', "o"),
        ('ô', "o"),
        ('õ', "o"),
        ('ø', "o"),
        ('ő', "o"),
        ('ú', "u"),
        ('ù', "u"),
        ('û', "u"),
        ('ű', "u"),
        ('ý', "y"),
        ('ÿ', "y"),
        ('ñ', "n"),
        ('ń', "n"),
        ('ç', "c"),
        ('ć', "c"),
        ('č', "c"),
        ('ş', "s"),
        ('ś', "s"),
        ('š', "s"),
        ('ș', "s"),
        ('ž', "z"),
        ('ź', "z"),
        ('ż', "z"),
        ('ł', "l"),
        ('đ', "d"),
        ('ř', "r"),
        ('ţ', "t"),
        ('ť', "t"),
        ('ț', "t"),
        ('æ', "ae"),
        ('œ', "oe"),
    ]);
}

/// Replacements applied before slugging, keyed by the lower-case source
/// character. Upper-case input characters are looked up via their
/// lower-case form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransliterationTable(HashMap<char, String>);

impl TransliterationTable {
    pub fn from_pairs(pairs: &[(char, &str)]) -> Self {
        TransliterationTable(
            pairs
                .iter()
                .map(|(c, s)| (*c, (*s).to_string()))
                .collect(),
        )
    }

    /// The built-in diacritic-stripping table shared by all feeds.
    pub fn builtin() -> Self {
        DEFAULT_TABLE.clone()
    }

    /// Merges `other` over this table, `other` winning on conflicts.
    pub fn extend(&mut self, other: &TransliterationTable) {
        for (c, s) in &other.0 {
            self.0.insert(*c, s.clone());
        }
    }

    fn lookup(&self, c: char) -> Option<&str> {
        if let Some(replacement) = self.0.get(&c) {
            return Some(replacement);
        }
        let mut lower = c.to_lowercase();
        let l = lower.next()?;
        if lower.next().is_some() {
            return None;
        }
        self.0.get(&l).map(String::as_str)
    }
}

/// Turns free-text institution names into slugs.
///
/// Pure and total: never fails, but pathological all-symbol input yields
/// the empty string, which callers must treat as a rejection rather than
/// a valid id.
#[derive(Debug, Clone)]
pub struct Normalizer {
    table: TransliterationTable,
}

impl Normalizer {
    pub fn new(table: TransliterationTable) -> Self {
        Normalizer { table }
    }

    /// Transliterates, lower-cases, drops anything that is not a letter,
    /// digit, whitespace, or hyphen, collapses whitespace/hyphen runs to
    /// single hyphens, trims, and caps the length.
    ///
    /// `normalize("Royal Bank of Canada")` is `"royal-bank-of-canada"`.
    pub fn normalize(&self, name: &str) -> String {
        let mut transliterated = String::with_capacity(name.len());
        for c in name.chars() {
            match self.table.lookup(c) {
                Some(replacement) => transliterated.push_str(replacement),
                None => transliterated.extend(c.to_lowercase()),
            }
        }

        let mut slug = String::with_capacity(transliterated.len());
        let mut pending_hyphen = false;
        for c in transliterated.chars() {
            if c.is_whitespace() || c == '-' {
                // Runs collapse to one hyphen; leading separators drop.
                if !slug.is_empty() {
                    pending_hyphen = true;
                }
            } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
                if pending_hyphen {
                    slug.push('-');
                    pending_hyphen = false;
                }
                slug.push(c);
            }
        }

        // All remaining characters are ASCII, so byte truncation is safe.
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
        slug
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::new(TransliterationTable::builtin())
    }
}
