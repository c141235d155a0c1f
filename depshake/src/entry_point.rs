use crate::cli::Cli;
use crate::commands::{run_shake, ShakeOptions};
use crate::config::Config;
use crate::constants::{DEFAULT_OVERRIDES_PATH, DEFAULT_SOURCE_EXTENSION};
use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Run depshake with the given arguments (program name excluded).
///
/// # Errors
///
/// Returns an error if the run fails outside of the reported exit codes.
pub fn run_with_args(args: Vec<String>) -> Result<i32> {
    run_with_args_to(args, &mut std::io::stdout())
}

/// Run depshake with the given arguments, writing output to the specified writer.
///
/// This is the testable version of `run_with_args` that allows output capture.
///
/// # Errors
///
/// Returns an error if the options are inconsistent, or if writing output,
/// the override document or a source file fails.
pub fn run_with_args_to<W: std::io::Write>(args: Vec<String>, writer: &mut W) -> Result<i32> {
    let mut program_args = vec!["depshake".to_owned()];
    program_args.extend(args);
    let cli_var = match Cli::try_parse_from(program_args) {
        Ok(c) => c,
        Err(e) => match e.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                write!(writer, "{e}")?;
                writer.flush()?;
                return Ok(0);
            }
            _ => {
                eprint!("{e}");
                return Ok(1);
            }
        },
    };

    let config = Config::load_from_path(Path::new("."));
    let options = resolve_options(&cli_var, &config);

    if let Some(threads) = cli_var.threads.or(config.depshake.threads) {
        // The global pool can only be built once per process.
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            if options.verbose {
                eprintln!("[VERBOSE] Keeping existing thread pool: {e}");
            }
        }
    }

    if options.verbose {
        eprintln!("[VERBOSE] depshake v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("[VERBOSE] Using {} threads", rayon::current_num_threads());
        match &config.config_file_path {
            Some(path) => eprintln!("[VERBOSE] Settings: {}", path.display()),
            None => eprintln!("[VERBOSE] Settings: defaults"),
        }
        eprintln!("[VERBOSE] Overrides: {}", options.overrides_path.display());
        eprintln!();
    }

    if options.roots.is_empty() {
        eprintln!("Error: no root modules given; pass MODULE or set `package` in .depshake.toml");
        return Ok(1);
    }

    run_shake(&options, writer)
}

/// Merge CLI flags over the settings file.
///
/// Paths from the settings file are resolved against the file's directory;
/// paths from the command line are taken as given.
#[must_use]
pub fn resolve_options(cli: &Cli, config: &Config) -> ShakeOptions {
    let settings = &config.depshake;
    let package = cli.scope.package.clone().or_else(|| settings.package.clone());

    let roots = if cli.modules.is_empty() {
        package.iter().cloned().collect()
    } else {
        cli.modules.clone()
    };

    let from_settings = |paths: &Option<Vec<PathBuf>>| -> Vec<PathBuf> {
        paths
            .iter()
            .flatten()
            .map(|p| config.resolve(p))
            .collect()
    };
    let search_path = if cli.paths.search_path.is_empty() {
        from_settings(&settings.search_path)
    } else {
        cli.paths.search_path.clone()
    };
    let mut source_roots = if cli.paths.source_roots.is_empty() {
        from_settings(&settings.source_roots)
    } else {
        cli.paths.source_roots.clone()
    };
    if source_roots.is_empty() {
        source_roots.push(PathBuf::from("."));
    }

    let overrides_path = cli.paths.cfg.clone().unwrap_or_else(|| {
        config.resolve(
            settings
                .config
                .as_deref()
                .unwrap_or(Path::new(DEFAULT_OVERRIDES_PATH)),
        )
    });

    ShakeOptions {
        roots,
        package,
        search_path,
        source_roots,
        source_extension: settings
            .source_extension
            .clone()
            .unwrap_or_else(|| DEFAULT_SOURCE_EXTENSION.to_owned()),
        overrides_path,
        fix: cli.mode.fix,
        update: cli.mode.update,
        global: cli.mode.global,
        package_only: cli.scope.package_only,
        downstream: !cli.scope.no_downstream && settings.downstream.unwrap_or(true),
        explain: cli.output.explain,
        json: cli.output.json,
        verbose: cli.output.verbose,
    }
}
