//! Override rules: findings the user has declared legitimate.
//!
//! The override document is a small JSON file:
//!
//! ```json
//! {
//!   "ignoreAll": ["Pkg.Generated"],
//!   "ignoreImport": ["Init"],
//!   "ignore": { "Pkg.Tactic": ["Pkg.Attr"] }
//! }
//! ```
//!
//! - `ignoreAll`: modules whose own imports are never flagged.
//! - `ignoreImport`: modules treated as used wherever they are imported.
//!   Defaults to the core runtime modules when the field is absent.
//! - `ignore`: per-module list of imports to treat as used.
//!
//! A missing or broken document never aborts a run: the caller gets the
//! default overrides and a message on stderr.

use colored::Colorize;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::bitset::ModuleSet;
use crate::constants::DEFAULT_IGNORE_IMPORT;
use crate::graph::{ModuleId, ModuleRegistry};

fn default_ignore_import() -> Vec<String> {
    DEFAULT_IGNORE_IMPORT.iter().map(|&name| name.to_owned()).collect()
}

/// Errors reading or writing the override document.
#[derive(Debug, thiserror::Error)]
pub enum OverrideError {
    /// The file could not be read or written.
    #[error("cannot access override file {path}: {source}")]
    Io {
        /// Document path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not a valid override document.
    #[error("malformed override file {path}: {source}")]
    Parse {
        /// Document path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

/// The on-disk override document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideDocument {
    /// Modules whose imports are never analysed for removal.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_all: Vec<String>,
    /// Modules always treated as used wherever they are imported.
    #[serde(default = "default_ignore_import")]
    pub ignore_import: Vec<String>,
    /// Per-module use exceptions.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ignore: BTreeMap<String, Vec<String>>,
}

impl Default for OverrideDocument {
    fn default() -> Self {
        Self {
            ignore_all: Vec::new(),
            ignore_import: default_ignore_import(),
            ignore: BTreeMap::new(),
        }
    }
}

impl OverrideDocument {
    /// Read and parse the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid document.
    pub fn load(path: &Path) -> Result<Self, OverrideError> {
        let content = fs::read_to_string(path).map_err(|source| OverrideError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| OverrideError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`OverrideDocument::load`], but falls back to the defaults and
    /// prints a message when the document is missing or broken.
    #[must_use]
    pub fn load_or_default(path: &Path, verbose: bool) -> Self {
        if !path.exists() {
            if verbose {
                eprintln!(
                    "[VERBOSE] No override file at {}, using defaults",
                    path.display()
                );
            }
            return Self::default();
        }
        match Self::load(path) {
            Ok(doc) => doc,
            Err(e) => {
                eprintln!("{} {e}; using default overrides", "Warning:".yellow().bold());
                Self::default()
            }
        }
    }

    /// Sort and deduplicate every name list so serialization is stable.
    pub fn normalize(&mut self) {
        fn tidy(names: &mut Vec<String>) {
            names.sort_unstable();
            names.dedup();
        }
        tidy(&mut self.ignore_all);
        tidy(&mut self.ignore_import);
        self.ignore.values_mut().for_each(tidy);
        self.ignore.retain(|_, names| !names.is_empty());
    }

    /// Record `removed` as legitimate imports of `module`: per module, or
    /// globally in `ignoreImport` when `global` is set.
    pub fn record_exceptions<I>(&mut self, module: &str, removed: I, global: bool)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let removed = removed.into_iter().map(Into::into);
        if global {
            self.ignore_import.extend(removed);
        } else {
            self.ignore
                .entry(module.to_owned())
                .or_default()
                .extend(removed);
        }
    }

    /// Serialize the normalized document as pretty JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization fails, which cannot happen for
    /// this document shape.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut doc = self.clone();
        doc.normalize();
        let mut out = serde_json::to_string_pretty(&doc)?;
        out.push('\n');
        Ok(out)
    }

    /// Write the normalized document to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), OverrideError> {
        let json = self.to_json().map_err(|source| OverrideError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| OverrideError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| OverrideError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Override document resolved against a loaded registry.
///
/// Names that do not belong to a loaded module are dropped: they usually
/// refer to modules outside the current root set.
#[derive(Debug, Clone, Default)]
pub struct OverrideRules {
    ignore_all: ModuleSet,
    ignore_import: ModuleSet,
    per_module: FxHashMap<ModuleId, ModuleSet>,
}

impl OverrideRules {
    /// Resolve `doc` against `registry`.
    #[must_use]
    pub fn resolve(doc: &OverrideDocument, registry: &ModuleRegistry) -> Self {
        let to_set = |names: &[String]| -> ModuleSet {
            names
                .iter()
                .filter_map(|name| registry.id_of(name))
                .collect()
        };
        let per_module = doc
            .ignore
            .iter()
            .filter_map(|(module, names)| Some((registry.id_of(module)?, to_set(names))))
            .collect();
        Self {
            ignore_all: to_set(&doc.ignore_all),
            ignore_import: to_set(&doc.ignore_import),
            per_module,
        }
    }

    /// Whether `id`'s own imports are exempt from analysis.
    #[must_use]
    pub fn is_ignored_all(&self, id: ModuleId) -> bool {
        self.ignore_all.contains(id)
    }

    /// Modules treated as used when analysing `id`: the global
    /// `ignoreImport` set plus `id`'s own exceptions.
    #[must_use]
    pub fn ignore_for(&self, id: ModuleId) -> ModuleSet {
        match self.per_module.get(&id) {
            Some(own) => &self.ignore_import | own,
            None => self.ignore_import.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::MemorySource;
    use crate::test_utils::module;
    use tempfile::TempDir;

    #[test]
    fn test_missing_fields_use_defaults() {
        let doc: OverrideDocument = serde_json::from_str("{}").unwrap();
        assert_eq!(doc, OverrideDocument::default());
        assert_eq!(doc.ignore_import, vec!["Init".to_owned()]);

        let doc: OverrideDocument = serde_json::from_str(r#"{"ignoreImport": []}"#).unwrap();
        assert!(doc.ignore_import.is_empty());
    }

    #[test]
    fn test_load_or_default_recovers_from_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("overrides.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(
            OverrideDocument::load(&path),
            Err(OverrideError::Parse { .. })
        ));
        assert_eq!(
            OverrideDocument::load_or_default(&path, false),
            OverrideDocument::default()
        );
        assert_eq!(
            OverrideDocument::load_or_default(&dir.path().join("missing.json"), false),
            OverrideDocument::default()
        );
    }

    #[test]
    fn test_serialization_is_sorted_and_deduplicated() {
        let mut doc = OverrideDocument::default();
        doc.record_exceptions("Pkg.B", ["Pkg.Z", "Pkg.A", "Pkg.Z"], false);
        doc.record_exceptions("Pkg.A", ["Pkg.Q"], false);
        doc.record_exceptions("Pkg.C", ["Pkg.Core"], true);

        let json = doc.to_json().unwrap();
        let expected = r#"{
  "ignoreImport": [
    "Init",
    "Pkg.Core"
  ],
  "ignore": {
    "Pkg.A": [
      "Pkg.Q"
    ],
    "Pkg.B": [
      "Pkg.A",
      "Pkg.Z"
    ]
  }
}
"#;
        assert_eq!(json, expected);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scripts").join("overrides.json");
        let mut doc = OverrideDocument::default();
        doc.ignore_all.push("Pkg.Gen".to_owned());
        doc.save(&path).unwrap();
        let loaded = OverrideDocument::load(&path).unwrap();
        assert_eq!(loaded.ignore_all, vec!["Pkg.Gen".to_owned()]);
    }

    #[test]
    fn test_resolve_skips_unknown_names() {
        let source = MemorySource::new()
            .with(module("Init", &[], vec![]))
            .with(module("A", &["Init"], vec![]))
            .with(module("B", &["A"], vec![]));
        let mut registry = ModuleRegistry::new();
        registry.load(&source, &["B"]).unwrap();

        let mut doc = OverrideDocument::default();
        doc.ignore_all = vec!["B".into(), "Elsewhere".into()];
        doc.ignore.insert("B".into(), vec!["A".into(), "Ghost".into()]);
        doc.ignore.insert("Ghost".into(), vec!["A".into()]);
        let rules = OverrideRules::resolve(&doc, &registry);

        let (init, a, b) = (0, 1, 2);
        assert!(rules.is_ignored_all(b));
        assert!(!rules.is_ignored_all(a));
        assert_eq!(rules.ignore_for(a), ModuleSet::singleton(init));
        assert_eq!(rules.ignore_for(b), [init, a].into_iter().collect());
    }
}
