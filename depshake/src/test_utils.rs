//! Builders for artifacts used by tests.
//!
//! Writing term trees by hand gets noisy quickly; these helpers build
//! declarations whose terms reference a given list of symbols and lay out
//! artifacts on disk the way [`crate::artifact::SearchPathSource`] expects.

use std::fs;
use std::path::{Path, PathBuf};

use crate::artifact::{Declaration, ModuleArtifact, Term};
use crate::constants::ARTIFACT_EXTENSION;
use crate::utils::module_relative_path;

/// Build a term applying the first reference to the others in order.
/// An empty reference list yields a sort.
#[must_use]
pub fn term_referencing(references: &[&str]) -> Term {
    let mut refs = references.iter();
    let Some(first) = refs.next() else {
        return Term::Sort(0);
    };
    refs.fold(Term::constant(*first), |acc, name| {
        Term::app(acc, Term::constant(*name))
    })
}

/// A declaration whose type references `references`.
#[must_use]
pub fn decl(name: &str, references: &[&str]) -> Declaration {
    Declaration {
        name: name.to_owned(),
        ty: term_referencing(references),
        value: None,
    }
}

/// A declaration with separate type and body references.
#[must_use]
pub fn decl_with_value(name: &str, type_refs: &[&str], value_refs: &[&str]) -> Declaration {
    Declaration {
        name: name.to_owned(),
        ty: term_referencing(type_refs),
        value: Some(term_referencing(value_refs)),
    }
}

/// An artifact with the given imports and declarations.
#[must_use]
pub fn module(name: &str, imports: &[&str], declarations: Vec<Declaration>) -> ModuleArtifact {
    ModuleArtifact {
        name: name.to_owned(),
        imports: imports.iter().map(|&import| import.to_owned()).collect(),
        declarations,
    }
}

/// Write `artifact` under `dir` at the path its name maps to.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_artifact(dir: &Path, artifact: &ModuleArtifact) -> std::io::Result<PathBuf> {
    let path = dir.join(module_relative_path(&artifact.name, ARTIFACT_EXTENSION));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(artifact).map_err(std::io::Error::other)?;
    fs::write(&path, json)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_referencing_builds_left_nested_apps() {
        let term = term_referencing(&["f", "a", "b"]);
        assert_eq!(
            term,
            Term::app(
                Term::app(Term::constant("f"), Term::constant("a")),
                Term::constant("b")
            )
        );
        assert_eq!(term_referencing(&[]), Term::Sort(0));
    }

    #[test]
    fn test_write_artifact_uses_dotted_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path(), &module("Pkg.Data.List", &[], vec![])).unwrap();
        assert!(path.ends_with("Pkg/Data/List.json"));
        assert!(path.is_file());
    }
}
