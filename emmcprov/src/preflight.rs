//! Precondition checks. Queries live OS state, mutates nothing.

use crate::errors::ProvisionError;
use anyhow::{Context, Result};
use emmcprov_hal::{path as dev_path, sysfs, CloneOps, ProbeOps};
use log::info;
use std::path::{Path, PathBuf};

const SYS_BLOCK: &str = "/sys/block";

#[derive(Clone, Debug)]
pub struct PreflightConfig {
    pub target_disk: PathBuf,
    pub clone_tool: String,
    pub sys_block_root: PathBuf,
    /// Skip the euid check (container/CI test runs).
    pub require_root: bool,
}

impl PreflightConfig {
    pub fn new(target_disk: PathBuf, clone_tool: String) -> Self {
        Self {
            target_disk,
            clone_tool,
            sys_block_root: PathBuf::from(SYS_BLOCK),
            require_root: true,
        }
    }
}

pub fn run<H: ProbeOps + CloneOps>(hal: &H, cfg: &PreflightConfig) -> Result<()> {
    info!("🧪 Preflight checks");

    if cfg.require_root {
        check_root()?;
    }
    check_root_device_removable(hal, &cfg.sys_block_root)?;
    check_target_disk(&cfg.target_disk)?;
    check_clone_tool(hal, &cfg.clone_tool)?;

    info!("✅ Preflight complete");
    Ok(())
}

fn check_root() -> Result<()> {
    if !nix::unistd::geteuid().is_root() {
        return Err(ProvisionError::NotRoot.into());
    }
    Ok(())
}

fn check_root_device_removable<H: ProbeOps>(hal: &H, sys_block_root: &Path) -> Result<()> {
    let source = hal
        .root_source()
        .context("failed to determine the device backing /")?;
    if !root_source_is_usb_backed(&source, sys_block_root) {
        return Err(ProvisionError::RootNotRemovable(source).into());
    }
    info!("Root filesystem backed by {} (USB)", source);
    Ok(())
}

/// USB-backed means the device name matches the `sd*` convention, or its
/// parent disk carries the sysfs `removable` flag.
pub fn root_source_is_usb_backed(source: &str, sys_block_root: &Path) -> bool {
    if sysfs::block::matches_usb_pattern(source) {
        return true;
    }
    let parent = dev_path::parent_disk_path(source);
    match sysfs::block::device_basename(Path::new(&parent)) {
        Ok(name) => sysfs::block::is_removable(sys_block_root, &name),
        Err(_) => false,
    }
}

fn check_target_disk(target: &Path) -> Result<()> {
    if !target.exists() {
        return Err(ProvisionError::TargetMissing(target.display().to_string()).into());
    }
    info!("Target device {} present", target.display());
    Ok(())
}

fn check_clone_tool<H: CloneOps>(hal: &H, tool: &str) -> Result<()> {
    let available = hal
        .clone_tool_available(tool)
        .with_context(|| format!("failed to probe for {}", tool))?;
    if !available {
        return Err(ProvisionError::CloneToolMissing(tool.to_string()).into());
    }
    Ok(())
}
