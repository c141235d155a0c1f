//! Shared constants and lazily compiled regex patterns.

use regex::Regex;
use std::sync::OnceLock;

/// Name of the tool settings file searched for upward from the working directory.
pub const CONFIG_FILENAME: &str = ".depshake.toml";

/// Table inside the settings file holding the tool's options.
pub const CONFIG_SECTION: &str = "depshake";

/// Override document used when none is configured.
pub const DEFAULT_OVERRIDES_PATH: &str = "depshake.json";

/// Extension of compiled module artifacts.
pub const ARTIFACT_EXTENSION: &str = "json";

/// Extension of source files rewritten by `--fix`.
pub const DEFAULT_SOURCE_EXTENSION: &str = "lean";

/// Modules treated as used everywhere unless the override document says
/// otherwise.
pub const DEFAULT_IGNORE_IMPORT: &[&str] = &["Init"];

/// Regex matching a dotted module name such as `Pkg.Data.List`.
///
/// # Panics
///
/// Panics if the regex pattern is invalid.
pub fn get_module_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"^[\p{L}_][\p{L}\p{N}_'!?]*(?:\.[\p{L}_][\p{L}\p{N}_'!?]*)*$")
            .expect("Invalid module name regex pattern")
    })
}

pub use get_module_name_re as MODULE_NAME_RE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_name_re() {
        for name in ["Init", "Pkg.Data.List", "Mathlib.Order.Basic'", "_root_.X"] {
            assert!(MODULE_NAME_RE().is_match(name), "{name}");
        }
        for name in ["", "Pkg.", ".Pkg", "Pkg..Data", "1Pkg", "Pkg-Data", "--"] {
            assert!(!MODULE_NAME_RE().is_match(name), "{name}");
        }
    }
}
