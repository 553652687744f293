//! Parsing helpers for `/proc/self/mountinfo` (and similar mountinfo files).

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub mount_point: PathBuf,
    pub fstype: String,
    pub source: String,
}

pub fn parse_mountinfo(content: &str) -> Vec<MountEntry> {
    content
        .lines()
        .filter_map(|line| {
            // mountinfo format:
            //   <pre fields...> <mount point> <...> - <fstype> <source> <superopts>
            let (pre, post) = line.split_once(" - ")?;
            let pre_fields: Vec<&str> = pre.split_whitespace().collect();
            if pre_fields.len() < 5 {
                return None;
            }
            let mount_point = unescape_mount_path(pre_fields[4]);
            let mut post_fields = post.split_whitespace();
            let fstype = post_fields.next()?.to_string();
            let source = post_fields.next()?.to_string();
            Some(MountEntry {
                mount_point: PathBuf::from(mount_point),
                fstype,
                source,
            })
        })
        .collect()
}

/// Returns the source device of the `/` mount, if present.
pub fn root_mount_source(entries: &[MountEntry]) -> Option<&str> {
    entries
        .iter()
        .find(|e| e.mount_point == Path::new("/"))
        .map(|e| e.source.as_str())
}

pub fn is_mounted_from_info(path: &Path, entries: &[MountEntry]) -> bool {
    let target = normalize_path(path);
    entries
        .iter()
        .any(|entry| normalize_path(&entry.mount_point) == target)
}

pub fn unescape_mount_path(raw: &str) -> String {
    raw.replace("\\040", " ")
        .replace("\\011", "\t")
        .replace("\\012", "\n")
        .replace("\\134", "\\")
}

fn normalize_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    if s.len() > 1 && s.ends_with('/') {
        s.trim_end_matches('/').to_string()
    } else {
        s.to_string()
    }
}
