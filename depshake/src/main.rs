//! Main binary entry point for `depshake`.
//!
//! This binary simply delegates to the shared `entry_point::run_with_args()` function
//! so that it behaves exactly like the `depshake-cli` binary.

use anyhow::Result;
use depshake::entry_point;

fn main() -> Result<()> {
    let code = entry_point::run_with_args(std::env::args().skip(1).collect())?;
    std::process::exit(code);
}
