use clap::{Args, Parser};
use std::path::PathBuf;

/// Help text for configuration file options, shown at the bottom of --help.
const CONFIG_HELP: &str = "\
CONFIGURATION FILE (.depshake.toml):
  Create this file in your project root to set defaults.
  Relative paths are resolved against the file's directory.

  [depshake]
  package = \"Pkg\"                 # Primary package, default root module
  search_path = [\"build/ir\"]      # Artifact directories, searched in order
  source_roots = [\".\"]            # Source directories rewritten by --fix
  source_extension = \"lean\"       # Source file extension
  config = \"scripts/noshake.json\" # Override document
  downstream = true               # Repair modules broken by removals
  threads = 8                     # Worker threads (default: all cores)

EXIT CODES:
  0  no edits needed, or --fix/--update handled them
  1  edits found (dry run), or invalid arguments
  2  modules could not be loaded
";

/// What to do with the computed edits.
#[derive(Args, Debug, Default, Clone)]
pub struct ModeOptions {
    /// Apply the edits to the module source files.
    #[arg(long)]
    pub fix: bool,

    /// Record every finding as a legitimate exception in the override document.
    #[arg(long)]
    pub update: bool,

    /// With --update, record exceptions in the global `ignoreImport` list.
    #[arg(long, requires = "update")]
    pub global: bool,
}

/// Which modules are analysed and edited.
#[derive(Args, Debug, Default, Clone)]
pub struct ScopeOptions {
    /// Only analyse and edit modules of the primary package.
    #[arg(long)]
    pub package_only: bool,

    /// Do not repair downstream modules that relied on a removed import.
    #[arg(long)]
    pub no_downstream: bool,

    /// Primary package name (overrides the settings file).
    #[arg(long, value_name = "NAME")]
    pub package: Option<String>,
}

/// Where inputs and outputs live.
#[derive(Args, Debug, Default, Clone)]
pub struct PathOptions {
    /// Override document path.
    #[arg(long = "cfg", value_name = "FILE")]
    pub cfg: Option<PathBuf>,

    /// Directory searched for compiled module artifacts. Repeatable.
    #[arg(long = "search-path", value_name = "DIR")]
    pub search_path: Vec<PathBuf>,

    /// Directory holding module sources. Repeatable.
    #[arg(long = "source-root", value_name = "DIR")]
    pub source_roots: Vec<PathBuf>,
}

/// Options for output formatting and verbosity.
#[derive(Args, Debug, Default, Clone)]
pub struct OutputOptions {
    /// Output raw JSON.
    #[arg(long)]
    pub json: bool,

    /// Show, for every module that is kept or added, the declaration that needs it.
    #[arg(long)]
    pub explain: bool,

    /// Enable verbose output for debugging (shows load and analysis phases).
    #[arg(short, long)]
    pub verbose: bool,
}

/// Command line interface configuration using `clap`.
/// This struct defines the arguments and flags accepted by the program.
#[derive(Parser, Debug)]
#[command(
    name = "depshake",
    author,
    version,
    about = "depshake - Find unused imports and compute the minimal import edits for a module graph",
    long_about = None,
    after_help = CONFIG_HELP
)]
pub struct Cli {
    /// Root modules to analyse. Defaults to the configured package.
    #[arg(value_name = "MODULE")]
    pub modules: Vec<String>,

    /// Edit handling.
    #[command(flatten)]
    pub mode: ModeOptions,

    /// Analysis scope.
    #[command(flatten)]
    pub scope: ScopeOptions,

    /// Input and output locations.
    #[command(flatten)]
    pub paths: PathOptions,

    /// Output formatting.
    #[command(flatten)]
    pub output: OutputOptions,

    /// Number of worker threads (default: all cores).
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let cli = Cli::try_parse_from([
            "depshake",
            "Pkg",
            "Other.Root",
            "--fix",
            "--package-only",
            "--no-downstream",
            "--cfg",
            "scripts/noshake.json",
            "--search-path",
            "build/a",
            "--search-path",
            "build/b",
            "--source-root",
            ".",
            "--threads",
            "2",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.modules, vec!["Pkg", "Other.Root"]);
        assert!(cli.mode.fix);
        assert!(!cli.mode.update);
        assert!(cli.scope.package_only);
        assert!(cli.scope.no_downstream);
        assert_eq!(cli.paths.cfg, Some(PathBuf::from("scripts/noshake.json")));
        assert_eq!(cli.paths.search_path.len(), 2);
        assert_eq!(cli.paths.source_roots, vec![PathBuf::from(".")]);
        assert_eq!(cli.threads, Some(2));
        assert!(cli.output.verbose);
    }

    #[test]
    fn test_global_requires_update() {
        assert!(Cli::try_parse_from(["depshake", "--global"]).is_err());
        let cli = Cli::try_parse_from(["depshake", "--update", "--global"]).unwrap();
        assert!(cli.mode.global);
    }
}
