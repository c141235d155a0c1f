//! Path utilities: module name to file layout, display normalization and
//! containment checks for files the tool writes.

use std::path::{Path, PathBuf};

/// Relative path of module `name` with extension `ext`: `A.B.C` becomes
/// `A/B/C.<ext>`.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use depshake::utils::module_relative_path;
///
/// assert_eq!(module_relative_path("Pkg.Data.List", "lean"), Path::new("Pkg/Data/List.lean"));
/// ```
#[must_use]
pub fn module_relative_path(name: &str, ext: &str) -> PathBuf {
    let mut path: PathBuf = name.split('.').collect();
    path.set_extension(ext);
    path
}

/// First file for module `name` among `roots`, in root order, together with
/// the root it was found under.
#[must_use]
pub fn find_module_file<'r, P: AsRef<Path>>(
    roots: &'r [P],
    name: &str,
    ext: &str,
) -> Option<(&'r Path, PathBuf)> {
    let relative = module_relative_path(name, ext);
    roots.iter().find_map(|root| {
        let candidate = root.as_ref().join(&relative);
        candidate.is_file().then(|| (root.as_ref(), candidate))
    })
}

/// Normalizes a path for CLI display.
///
/// - Converts backslashes to forward slashes (for cross-platform consistency)
/// - Strips leading "./" or ".\" prefix (for cleaner output)
///
/// # Examples
/// ```
/// use std::path::Path;
/// use depshake::utils::normalize_display_path;
///
/// assert_eq!(normalize_display_path(Path::new(".\\Pkg\\Basic.lean")), "Pkg/Basic.lean");
/// assert_eq!(normalize_display_path(Path::new("./build/Pkg.json")), "build/Pkg.json");
/// ```
#[must_use]
pub fn normalize_display_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    // Strip Windows extended path prefix if present
    let clean = s.trim_start_matches(r"\\?\");
    let normalized = clean.replace('\\', "/");
    normalized
        .strip_prefix("./")
        .unwrap_or(&normalized)
        .to_owned()
}

/// Validates that a path is contained within an allowed root directory.
///
/// # Errors
///
/// Returns an error if the path or root cannot be canonicalized,
/// or if the path lies outside the root.
pub fn validate_path_within_root(path: &Path, root: &Path) -> anyhow::Result<PathBuf> {
    let canonical_path = path
        .canonicalize()
        .map_err(|e| anyhow::anyhow!("Failed to resolve path {}: {}", path.display(), e))?;
    let canonical_root = root
        .canonicalize()
        .map_err(|e| anyhow::anyhow!("Failed to resolve root {}: {}", root.display(), e))?;

    if canonical_path.starts_with(&canonical_root) {
        Ok(canonical_path)
    } else {
        anyhow::bail!(
            "Path traversal detected: {} is outside of {}",
            path.display(),
            root.display()
        )
    }
}
