use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use fare_scenarios::{load_spec_from_path, resolve_analysis, ResolvedAnalysis};
use rayon::ThreadPoolBuilder;
use serde_json::Value;
use tracing::debug;

pub fn configure_threads(spec: &str) {
    let count = if spec.eq_ignore_ascii_case("auto") {
        num_cpus::get()
    } else {
        spec.parse().unwrap_or_else(|_| num_cpus::get())
    };
    let _ = ThreadPoolBuilder::new().num_threads(count).build_global();
    debug!(threads = count, "configured worker pool");
}

/// Load and validate an analysis spec in one step.
pub fn load_analysis(path: &Path) -> Result<ResolvedAnalysis> {
    let spec = load_spec_from_path(path)?;
    resolve_analysis(&spec).with_context(|| format!("invalid analysis spec '{}'", path.display()))
}

/// Pretty JSON to `out` when given, stdout otherwise.
pub fn emit_json(value: &Value, out: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("writing '{}'", path.display())),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}
