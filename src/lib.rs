pub mod error;
pub mod set;
pub mod vector;

pub use error::{Error, Result};
pub use set::Set;
pub use vector::Vector;

use std::env;
use std::fs;
use std::io::{self, Read};
use anyhow::Context;

/// Environment variable naming the default input file for the binaries.
pub const INPUT_ENV: &str = "CONTAINERS_INPUT";

/// Pick the input file using the following priority:
/// 1. Explicit path argument (`-` means stdin)
/// 2. CONTAINERS_INPUT environment variable, when non-empty
/// 3. stdin
///
/// Returns `None` when input should come from stdin.
pub fn resolve_input(path: Option<&str>) -> Option<String> {
    let path = match path {
        Some(p) => Some(p.to_string()),
        None => env::var(INPUT_ENV).ok().filter(|p| !p.is_empty()),
    };
    path.filter(|p| p != "-")
}

pub fn read_input(path: Option<&str>) -> anyhow::Result<String> {
    match resolve_input(path) {
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
        Some(p) => fs::read_to_string(&p).with_context(|| format!("failed to read {}", p)),
    }
}
