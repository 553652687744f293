//! Completion marker handling.
//!
//! The sentinel is a zero-byte file on the cloned boot partition; its mere
//! presence makes every later run take the no-op path.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const SENTINEL_NAME: &str = ".emmc-provisioned";

/// Path of the sentinel relative to the root-partition mount, with the boot
/// partition nested at `boot/`.
pub fn sentinel_path(scratch: &Path) -> PathBuf {
    scratch.join("boot").join(SENTINEL_NAME)
}

pub fn is_present(scratch: &Path) -> bool {
    sentinel_path(scratch).exists()
}

pub fn write(scratch: &Path) -> Result<()> {
    let path = sentinel_path(scratch);
    fs::File::create(&path)
        .with_context(|| format!("Failed to create sentinel {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sentinel_roundtrip() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("boot")).unwrap();

        assert!(!is_present(dir.path()));
        write(dir.path()).unwrap();
        assert!(is_present(dir.path()));

        let meta = fs::metadata(sentinel_path(dir.path())).unwrap();
        assert_eq!(meta.len(), 0);
    }
}
