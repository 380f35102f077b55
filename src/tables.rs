//! Heuristic configuration tables for the normalizer and matcher.
//!
//! Each feed historically carried its own suffix lists, so the lists are
//! injected as data rather than baked into the matcher. Built-in presets
//! reproduce the per-feed lists; a RON file can substitute anything else
//! (minimal tables in tests included).

use std::str::FromStr;

use anyhow::Result;
use serde::Deserialize;
use thiserror::Error;

use crate::filespec::FileSpec;
use crate::slug::TransliterationTable;

#[derive(Debug, Error)]
pub enum TablesError {
    #[error("unknown built-in tables preset {name:?} (try one of {known})")]
    UnknownPreset { name: String, known: String },
    #[error("suffix {suffix:?} must start with a hyphen")]
    BadSuffix { suffix: String },
}

const PRESET_NAMES: &[&str] = &["default", "gocardless", "plaid", "flinks", "yapily"];

/// Immutable heuristic tables for one resolution run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tables {
    /// Extra transliterations merged over the built-in diacritic table.
    #[serde(default)]
    pub transliterations: TransliterationTable,
    /// Two-letter country qualifiers the matcher strips, with leading
    /// hyphen (e.g. "-ca").
    #[serde(default)]
    pub country_suffixes: Vec<String>,
    /// Generic legal/type suffixes the matcher strips and appends
    /// (e.g. "-bank").
    #[serde(default)]
    pub type_suffixes: Vec<String>,
}

impl Tables {
    pub fn builtin(name: &str) -> Result<Tables, TablesError> {
        let (country, types): (&[&str], &[&str]) = match name {
            "default" => (
                &[
                    "-ca", "-us", "-gb", "-uk", "-de", "-fr", "-nl", "-es", "-it", "-ie",
                    "-be", "-at", "-se", "-dk", "-no", "-fi", "-pl", "-pt", "-ch",
                ],
                &[
                    "-bank",
                    "-financial",
                    "-credit-union",
                    "-savings",
                    "-trust",
                    "-plc",
                    "-limited",
                    "-ltd",
                    "-ag",
                    "-sa",
                    "-nv",
                    "-group",
                    "-business",
                    "-corporate",
                    "-retail",
                    "-usa",
                    "-canada",
                ],
            ),
            "gocardless" => (
                &[
                    "-gb", "-de", "-fr", "-nl", "-es", "-it", "-ie", "-be", "-at", "-se",
                    "-dk", "-no", "-fi", "-pl", "-pt",
                ],
                &[
                    "-bank",
                    "-financial",
                    "-credit-union",
                    "-savings",
                    "-trust",
                    "-plc",
                    "-limited",
                    "-ltd",
                    "-group",
                    "-ag",
                    "-sa",
                    "-nv",
                ],
            ),
            "plaid" => (
                &[
                    "-gb", "-uk", "-nl", "-de", "-fr", "-es", "-it", "-be", "-at", "-ie",
                    "-us", "-ca",
                ],
                &[
                    "-bank",
                    "-business",
                    "-corporate",
                    "-retail",
                    "-sa",
                    "-ag",
                    "-nv",
                    "-plc",
                    "-ltd",
                ],
            ),
            "flinks" => (
                &["-ca", "-us"],
                &[
                    "-bank",
                    "-financial",
                    "-credit-union",
                    "-savings",
                    "-trust",
                    "-usa",
                    "-canada",
                ],
            ),
            "yapily" => (
                &[
                    "-gb", "-uk", "-nl", "-de", "-fr", "-es", "-it", "-be", "-at", "-ie",
                    "-se", "-dk", "-no", "-fi", "-pl", "-pt", "-ch",
                ],
                &[
                    "-bank",
                    "-business",
                    "-corporate",
                    "-retail",
                    "-sa",
                    "-ag",
                    "-nv",
                    "-plc",
                    "-ltd",
                    "-group",
                ],
            ),
            _ => {
                return Err(TablesError::UnknownPreset {
                    name: name.to_string(),
                    known: PRESET_NAMES.join(", "),
                })
            }
        };

        Ok(Tables {
            transliterations: TransliterationTable::default(),
            country_suffixes: country.iter().map(|s| (*s).to_string()).collect(),
            type_suffixes: types.iter().map(|s| (*s).to_string()).collect(),
        })
    }

    pub fn from_filespec(file_spec: &FileSpec) -> Result<Tables> {
        let reader = file_spec.reader()?;
        let tables: Tables = ron::de::from_reader(reader)?;
        tables.validate()?;
        Ok(tables)
    }

    fn validate(&self) -> Result<(), TablesError> {
        for suffix in self.country_suffixes.iter().chain(&self.type_suffixes) {
            if !suffix.starts_with('-') {
                return Err(TablesError::BadSuffix {
                    suffix: suffix.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Default for Tables {
    fn default() -> Self {
        // The "default" preset is always present.
        match Tables::builtin("default") {
            Ok(tables) => tables,
            Err(_) => unreachable!(),
        }
    }
}

const FILE_PREFIX: &str = "file:";

/// Where to get heuristic tables from: a built-in preset name, or
/// "file:<path>" for a RON tables file.
#[derive(Debug, Clone)]
pub enum TablesSpec {
    Builtin(String),
    File(FileSpec),
}

impl TablesSpec {
    pub fn load(&self) -> Result<Tables> {
        use TablesSpec::*;
        match self {
            Builtin(name) => Tables::builtin(name).map_err(Into::into),
            File(file_spec) => Tables::from_filespec(file_spec),
        }
    }
}

impl FromStr for TablesSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        use TablesSpec::*;
        if let Some(path) = s.strip_prefix(FILE_PREFIX) {
            Ok(File(path.parse()?))
        } else {
            // Reject unknown preset names up front so typos fail at
            // argument parsing rather than mid-run.
            Tables::builtin(s)?;
            Ok(Builtin(s.to_string()))
        }
    }
}
