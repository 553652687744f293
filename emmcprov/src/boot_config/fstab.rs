//! Filesystem table (`etc/fstab`) identifier rewriting.
//!
//! Only the device-spec field of each line is touched; everything after the
//! first whitespace run passes through byte-identical. Comments, blank lines
//! and unrecognized specs are left alone.

use super::{INTERNAL_BOOT, INTERNAL_ROOT, TEMPLATE_BOOT, TEMPLATE_ROOT};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Fresh identifiers of the two cloned partitions.
#[derive(Debug, Clone)]
pub struct PartitionIds {
    pub boot_partuuid: String,
    pub root_partuuid: String,
}

/// Rewrites one fstab device-spec field, or returns `None` to keep it.
///
/// Recognized patterns, each independent of the others:
/// - `PARTUUID=*-01` (boot suffix convention) -> fresh boot id
/// - `PARTUUID=*-02` (root suffix convention) -> fresh root id
/// - the four literal device paths for boot/root on USB and eMMC
fn rewrite_spec(spec: &str, ids: &PartitionIds) -> Option<String> {
    if let Some(value) = spec.strip_prefix("PARTUUID=") {
        if value.ends_with("-01") {
            return Some(format!("PARTUUID={}", ids.boot_partuuid));
        }
        if value.ends_with("-02") {
            return Some(format!("PARTUUID={}", ids.root_partuuid));
        }
        return None;
    }
    match spec {
        TEMPLATE_BOOT | INTERNAL_BOOT => Some(format!("PARTUUID={}", ids.boot_partuuid)),
        TEMPLATE_ROOT | INTERNAL_ROOT => Some(format!("PARTUUID={}", ids.root_partuuid)),
        _ => None,
    }
}

/// Rewrites fstab content line by line. Idempotent: rerunning on
/// already-correct text returns it unchanged.
pub fn rewrite_fstab(content: &str, ids: &PartitionIds) -> String {
    let mut out = String::with_capacity(content.len());
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            out.push_str(line);
            out.push('\n');
            continue;
        }

        // Split the spec field off while keeping the rest verbatim.
        let spec_end = line
            .find(|c: char| c.is_whitespace())
            .unwrap_or(line.len());
        let (spec, rest) = line.split_at(spec_end);

        match rewrite_spec(spec, ids) {
            Some(new_spec) => {
                out.push_str(&new_spec);
                out.push_str(rest);
            }
            None => out.push_str(line),
        }
        out.push('\n');
    }
    out
}

/// Patches `etc/fstab` in place, writing only when the content changed.
pub fn patch_fstab(path: &Path, ids: &PartitionIds) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let updated = rewrite_fstab(&content, ids);
    if updated != content {
        fs::write(path, updated)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}
