//! `blok validate`: static schema checks only.

use super::{Output, read_schema};
use anyhow::Result;
use std::path::Path;

pub fn execute(schema_path: &Path, output: Output) -> Result<()> {
    let document = read_schema(schema_path)?;
    let issues = blok_validator::validate(&document);

    output.emit(&issues, || {
        if issues.is_empty() {
            format!("{}: OK", schema_path.display())
        } else {
            issues
                .iter()
                .map(|i| format!("  {}", i))
                .collect::<Vec<_>>()
                .join("\n")
        }
    })?;

    if !issues.is_empty() {
        anyhow::bail!("Schema has {} issue(s)", issues.len());
    }
    Ok(())
}
