//! Guards against overwriting the wrong file.
//!
//! `import --replace` deletes an existing catalog before writing. These checks
//! make sure the path being removed is a catalog database and not one of the
//! inputs.

use anyhow::{bail, Result};
use std::path::Path;

/// Extensions accepted for a catalog database.
pub const CATALOG_EXTENSIONS: &[&str] = &["sqlite", "sqlite3", "db"];

/// Validates that a catalog output path is safe to overwrite.
///
/// Checks:
/// - Output must carry a SQLite extension
/// - Output cannot be a directory
/// - Output cannot be the same as any source path
pub fn validate_catalog_output(output: &Path, source_paths: &[&Path]) -> Result<()> {
    let extension = output.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !CATALOG_EXTENSIONS.contains(&extension) {
        bail!(
            "Safety check failed: output '{}' must end in one of .{}",
            output.display(),
            CATALOG_EXTENSIONS.join(", .")
        );
    }

    if output.is_dir() {
        bail!("Safety check failed: output '{}' is a directory", output.display());
    }

    for source in source_paths {
        if output == *source || same_file(output, source) {
            bail!(
                "Safety check failed: output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
