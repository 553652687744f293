//! Helpers related to block devices in sysfs.

use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub fn device_basename(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .ok_or_else(|| anyhow!("invalid device path {}", path.display()))?
        .to_string_lossy()
        .to_string();
    Ok(name)
}

/// Reads the `removable` attribute from `/sys/block/<dev>/removable`.
///
/// Missing or unreadable attributes count as non-removable.
pub fn is_removable(sys_block_root: &Path, disk_name: &str) -> bool {
    read_trimmed(sys_block_root.join(disk_name).join("removable"))
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
        == 1
}

/// Whether the device name follows the USB mass-storage naming convention
/// (`sda`, `sdb1`, ...). Pure string check so preflight classification stays
/// testable without live hardware.
pub fn matches_usb_pattern(device: &str) -> bool {
    let name = device.rsplit('/').next().unwrap_or(device);
    let Some(rest) = name.strip_prefix("sd") else {
        return false;
    };
    let mut chars = rest.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

fn read_trimmed(path: PathBuf) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .and_then(|s| if s.is_empty() { None } else { Some(s) })
}
