use std::time::Instant;

use anyhow::{bail, Context, Result};
use itertools::Itertools;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gemma_vcf::{import_vcf, ImportOptions};

const USAGE: &str = "usage: gemma-vcf <input.vcf[.gz]> <database> [--append] [--strict]";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (flags, paths): (Vec<_>, Vec<_>) = std::env::args()
        .skip(1)
        .partition(|arg| arg.starts_with("--"));
    let (input, database) = match paths.iter().collect_tuple() {
        Some(paths) => paths,
        None => bail!(USAGE),
    };
    let mut options = ImportOptions::default();
    for flag in &flags {
        match flag.as_str() {
            "--append" => options.append = true,
            "--strict" => options.strict = true,
            other => bail!("unknown option {}\n{}", other, USAGE),
        }
    }

    let now = Instant::now();
    let summary = import_vcf(input, database, &options)
        .with_context(|| format!("failed to import {} into {}", input, database))?;
    for err in &summary.skipped {
        eprintln!("{}", err);
    }
    info!(
        records = summary.records,
        skipped = summary.skipped.len(),
        elapsed = ?now.elapsed(),
        "done"
    );
    Ok(())
}
