//! Kernel command-line (`cmdline.txt`) root reference rewriting.
//!
//! The `root=` token is rewritten with an ordered fallback so exactly one
//! branch fires per run, and the caller can see which one did.

use super::{INTERNAL_ROOT, TEMPLATE_ROOT};
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

/// Which rewrite branch fired for the `root=` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootRewrite {
    /// An existing `root=PARTUUID=...` reference was updated.
    PartUuid,
    /// The template/USB device path was replaced.
    TemplatePath,
    /// The internal-storage device path was replaced.
    InternalPath,
    /// Unrecognized reference overwritten unconditionally (last resort).
    Fallback,
}

/// Rewrites the `root=` reference in a cmdline options line.
///
/// Precedence: existing PARTUUID reference, then the template device path,
/// then the internal-storage path, then whatever follows `root=`. A line
/// without any `root=` token gets one appended (fallback branch). Pure
/// function over the token list so the precedence is independently testable.
pub fn rewrite_root(line: &str, root_partuuid: &str) -> (String, RootRewrite) {
    let mut tokens: Vec<String> = line.split_whitespace().map(|s| s.to_string()).collect();
    let fresh = format!("root=PARTUUID={}", root_partuuid);

    let template = format!("root={}", TEMPLATE_ROOT);
    let internal = format!("root={}", INTERNAL_ROOT);

    for branch in [
        RootRewrite::PartUuid,
        RootRewrite::TemplatePath,
        RootRewrite::InternalPath,
        RootRewrite::Fallback,
    ] {
        let hit = tokens.iter().position(|token| match branch {
            RootRewrite::PartUuid => token.starts_with("root=PARTUUID="),
            RootRewrite::TemplatePath => token == &template,
            RootRewrite::InternalPath => token == &internal,
            RootRewrite::Fallback => token.starts_with("root="),
        });
        if let Some(i) = hit {
            if tokens[i] == fresh {
                // Already carries the fresh identifier; keep the line
                // byte-identical, nonstandard spacing included.
                return (line.to_string(), branch);
            }
            if branch == RootRewrite::Fallback {
                log::warn!(
                    "cmdline carried an unrecognized root reference '{}'; overwriting",
                    tokens[i]
                );
            }
            tokens[i] = fresh.clone();
            return (tokens.join(" "), branch);
        }
    }

    // No root= token at all. Append one so the clone still boots.
    log::warn!("cmdline carried no root= token; appending one");
    tokens.push(fresh);
    (tokens.join(" "), RootRewrite::Fallback)
}

/// Patches `cmdline.txt` in place, writing only when the content changed.
pub fn patch_cmdline(path: &Path, root_partuuid: &str) -> Result<RootRewrite> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let line = content.trim();
    if line.is_empty() {
        return Err(anyhow!("Kernel cmdline is empty: {}", path.display()));
    }
    let (updated, branch) = rewrite_root(line, root_partuuid);
    let updated = format!("{}\n", updated);
    if updated != content {
        fs::write(path, updated)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(branch)
}
