//! Compiled module artifacts and the sources that load them.
//!
//! An artifact is the compiled form of one module: its name, its ordered
//! import list and its declarations. Artifacts are stored as JSON documents,
//! one per module, laid out on a search path the same way module names are
//! dotted (`Pkg.Data.List` lives at `<dir>/Pkg/Data/List.json`).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::ARTIFACT_EXTENSION;
use crate::utils::module_relative_path;

/// A term of the declaration language.
///
/// Only `Const` and `Proj` carry references to global symbols; every other
/// variant is structure that the usage walker descends through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Term {
    /// Reference to a global constant.
    Const(String),
    /// Function application.
    App(Box<Term>, Box<Term>),
    /// Lambda abstraction.
    Lam(Binder),
    /// Dependent function type.
    Forall(Binder),
    /// Local definition.
    Let(LetBinding),
    /// Structure projection. The structure name counts as a reference.
    Proj(Projection),
    /// De Bruijn indexed bound variable.
    Bvar(u32),
    /// Universe sort.
    Sort(u32),
    /// Literal value.
    Lit(String),
}

/// Binder of a `lam` or `forall` term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binder {
    /// Type of the bound variable.
    pub binder: Box<Term>,
    /// Body in which the variable is bound.
    pub body: Box<Term>,
}

/// Payload of a `let` term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetBinding {
    /// Declared type of the local.
    pub ty: Box<Term>,
    /// Value of the local.
    pub value: Box<Term>,
    /// Body in which the local is bound.
    pub body: Box<Term>,
}

/// Payload of a `proj` term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Name of the projected structure.
    pub structure: String,
    /// Field index.
    pub index: u32,
    /// Projected expression.
    pub expr: Box<Term>,
}

impl Term {
    /// Shorthand for a constant reference.
    pub fn constant(name: impl Into<String>) -> Self {
        Self::Const(name.into())
    }

    /// Shorthand for an application.
    #[must_use]
    pub fn app(function: Term, argument: Term) -> Self {
        Self::App(Box::new(function), Box::new(argument))
    }

    /// Visit every global name referenced by the term, in pre-order.
    ///
    /// Uses an explicit stack so deeply nested terms cannot overflow.
    pub fn for_each_reference<'a>(&'a self, mut f: impl FnMut(&'a str)) {
        let mut stack: Vec<&'a Term> = vec![self];
        while let Some(term) = stack.pop() {
            match term {
                Term::Const(name) => f(name),
                Term::App(function, argument) => {
                    stack.push(argument);
                    stack.push(function);
                }
                Term::Lam(binder) | Term::Forall(binder) => {
                    stack.push(&binder.body);
                    stack.push(&binder.binder);
                }
                Term::Let(binding) => {
                    stack.push(&binding.body);
                    stack.push(&binding.value);
                    stack.push(&binding.ty);
                }
                Term::Proj(projection) => {
                    f(&projection.structure);
                    stack.push(&projection.expr);
                }
                Term::Bvar(_) | Term::Sort(_) | Term::Lit(_) => {}
            }
        }
    }
}

/// One declaration of a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Globally unique symbol name.
    pub name: String,
    /// Type of the declaration.
    #[serde(rename = "type")]
    pub ty: Term,
    /// Defining body, absent for axioms and opaque constants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Term>,
}

/// The compiled form of a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleArtifact {
    /// Dotted module name.
    pub name: String,
    /// Directly imported modules, in source order.
    #[serde(default)]
    pub imports: Vec<String>,
    /// Declarations, in source order.
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

impl ModuleArtifact {
    /// Create an artifact with no imports and no declarations.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            imports: Vec::new(),
            declarations: Vec::new(),
        }
    }
}

/// Errors raised while loading the module graph. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// No artifact exists for the module on any search path entry.
    #[error("could not find artifact for module `{name}` (searched {searched} location(s))")]
    NotFound {
        /// Requested module name.
        name: String,
        /// Number of search path entries that were tried.
        searched: usize,
    },
    /// The artifact exists but could not be read.
    #[error("failed to read artifact {path}: {source}")]
    Io {
        /// Artifact path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The artifact is not a valid module document.
    #[error("malformed artifact {path}: {source}")]
    Malformed {
        /// Artifact path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// The artifact records a different module name than the one requested.
    #[error("artifact for `{expected}` declares module `{found}`")]
    NameMismatch {
        /// Requested module name.
        expected: String,
        /// Name recorded in the artifact.
        found: String,
    },
    /// The import graph contains a cycle.
    #[error("import cycle detected: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
}

/// Something that can produce the artifact of a module by name.
pub trait ArtifactSource {
    /// Load the artifact for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::NotFound`] when no artifact exists, or another
    /// [`LoadError`] when it exists but cannot be used.
    fn load(&self, name: &str) -> Result<ModuleArtifact, LoadError>;
}

/// Loads artifacts from JSON files on a list of directories.
#[derive(Debug, Clone, Default)]
pub struct SearchPathSource {
    dirs: Vec<PathBuf>,
}

impl SearchPathSource {
    /// Create a source searching `dirs` in order.
    #[must_use]
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Path of the first artifact file for `name`, if one exists.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = module_relative_path(name, ARTIFACT_EXTENSION);
        self.dirs
            .iter()
            .map(|dir| dir.join(&relative))
            .find(|path| path.is_file())
    }

    fn read(path: &Path) -> Result<ModuleArtifact, LoadError> {
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| LoadError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ArtifactSource for SearchPathSource {
    fn load(&self, name: &str) -> Result<ModuleArtifact, LoadError> {
        let path = self.resolve(name).ok_or_else(|| LoadError::NotFound {
            name: name.to_owned(),
            searched: self.dirs.len(),
        })?;
        Self::read(&path)
    }
}

/// Serves artifacts from memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    artifacts: FxHashMap<String, ModuleArtifact>,
}

impl MemorySource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an artifact.
    pub fn insert(&mut self, artifact: ModuleArtifact) {
        self.artifacts.insert(artifact.name.clone(), artifact);
    }

    /// Builder-style variant of [`MemorySource::insert`].
    #[must_use]
    pub fn with(mut self, artifact: ModuleArtifact) -> Self {
        self.insert(artifact);
        self
    }
}

impl ArtifactSource for MemorySource {
    fn load(&self, name: &str) -> Result<ModuleArtifact, LoadError> {
        self.artifacts
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                name: name.to_owned(),
                searched: 1,
            })
    }
}
