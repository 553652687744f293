//! The provisioning pipeline.
//!
//! Linear sequence: preflight, idempotency guard, delegated clone,
//! identifier rewrite, completion marker, poweroff. No retries; the only
//! state persisted across runs is the sentinel.

use crate::boot_config::{cmdline, fstab};
use crate::preflight::{self, PreflightConfig};
use crate::sentinel;
use anyhow::{Context, Result};
use emmcprov_hal::{path as dev_path, CloneOptions, MountGuard, MountOptions, SystemHal};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

const SHUTDOWN_DELAY_MINUTES: u32 = 1;

// mount(2) rejects a missing filesystem type for new mounts, so the cloned
// partitions are always mounted with the layout's explicit types.
const BOOT_FSTYPE: &str = "vfat";
const ROOT_FSTYPE: &str = "ext4";

#[derive(Clone, Debug)]
pub struct ProvisionConfig {
    pub target_disk: PathBuf,
    pub clone_tool: String,
    pub scratch_dir: PathBuf,
    pub dry_run: bool,
    pub no_shutdown: bool,
    pub preflight: PreflightConfig,
}

impl ProvisionConfig {
    pub fn new(target_disk: PathBuf, clone_tool: String, scratch_dir: PathBuf) -> Self {
        let preflight = PreflightConfig::new(target_disk.clone(), clone_tool.clone());
        Self {
            target_disk,
            clone_tool,
            scratch_dir,
            dry_run: false,
            no_shutdown: false,
            preflight,
        }
    }

    fn boot_partition(&self) -> PathBuf {
        PathBuf::from(dev_path::partition_path(
            &self.target_disk.display().to_string(),
            1,
        ))
    }

    fn root_partition(&self) -> PathBuf {
        PathBuf::from(dev_path::partition_path(
            &self.target_disk.display().to_string(),
            2,
        ))
    }
}

/// How a run ended (both are exit status 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Sentinel already present; nothing was written.
    AlreadyProvisioned,
    Provisioned,
}

pub fn run<H: SystemHal>(hal: &H, cfg: &ProvisionConfig) -> Result<RunOutcome> {
    info!(
        "Provisioning {} from the running system",
        cfg.target_disk.display()
    );

    preflight::run(hal, &cfg.preflight)?;

    if target_is_provisioned(hal, cfg)? {
        info!("Sentinel found on target; nothing to do");
        return Ok(RunOutcome::AlreadyProvisioned);
    }

    info!("💾 Cloning with {} (force, verbose, expand)", cfg.clone_tool);
    hal.clone_disk(
        &cfg.clone_tool,
        &cfg.target_disk,
        &CloneOptions::new(cfg.dry_run),
    )
    .context("clone tool failed")?;

    if cfg.dry_run {
        info!("DRY RUN: would rewrite identifiers, write sentinel and shut down");
        return Ok(RunOutcome::Provisioned);
    }

    rewrite_identifiers(hal, cfg)?;

    if let Err(err) = hal.sync() {
        warn!("sync failed: {}", err);
    }

    if cfg.no_shutdown {
        info!("Provisioning complete (--no-shutdown)");
        return Ok(RunOutcome::Provisioned);
    }

    info!(
        "✅ Provisioning complete; halting in {} minute(s)",
        SHUTDOWN_DELAY_MINUTES
    );
    hal.shutdown(SHUTDOWN_DELAY_MINUTES, cfg.dry_run)?;
    Ok(RunOutcome::Provisioned)
}

/// Idempotency guard: best-effort mount of the cloned partitions, then a
/// sentinel check. Mount failures are tolerated since the target may be
/// blank on first run.
pub fn target_is_provisioned<H: SystemHal>(hal: &H, cfg: &ProvisionConfig) -> Result<bool> {
    fs::create_dir_all(&cfg.scratch_dir)
        .with_context(|| format!("Failed to create {}", cfg.scratch_dir.display()))?;

    let _root_guard = match try_mount(
        hal,
        &cfg.root_partition(),
        &cfg.scratch_dir,
        ROOT_FSTYPE,
        cfg.dry_run,
    ) {
        Some(guard) => guard,
        None => return Ok(false),
    };
    // The boot mount may also fail (clone interrupted before partition 1
    // was created); the sentinel check below just comes up empty then.
    let _boot_guard = try_mount(
        hal,
        &cfg.boot_partition(),
        &cfg.scratch_dir.join("boot"),
        BOOT_FSTYPE,
        cfg.dry_run,
    );

    Ok(sentinel::is_present(&cfg.scratch_dir))
}

/// Mounts both cloned partitions, queries their fresh PARTUUIDs and rewrites
/// cmdline.txt and etc/fstab, then writes the sentinel. Mounts are held by
/// guards so they are released on every exit path.
fn rewrite_identifiers<H: SystemHal>(hal: &H, cfg: &ProvisionConfig) -> Result<()> {
    let boot_dev = cfg.boot_partition();
    let root_dev = cfg.root_partition();

    let _root_guard = mount(hal, &root_dev, &cfg.scratch_dir, ROOT_FSTYPE, cfg.dry_run)?;
    let _boot_guard = mount(
        hal,
        &boot_dev,
        &cfg.scratch_dir.join("boot"),
        BOOT_FSTYPE,
        cfg.dry_run,
    )?;

    let boot_partuuid = hal
        .blkid_partuuid(&boot_dev)
        .with_context(|| format!("Failed to query PARTUUID of {}", boot_dev.display()))?;
    let root_partuuid = hal
        .blkid_partuuid(&root_dev)
        .with_context(|| format!("Failed to query PARTUUID of {}", root_dev.display()))?;
    info!(
        "New partition ids: boot={} root={}",
        boot_partuuid, root_partuuid
    );

    let cmdline_path = cfg.scratch_dir.join("boot/cmdline.txt");
    let branch = cmdline::patch_cmdline(&cmdline_path, &root_partuuid)?;
    info!("Rewrote {} ({:?} branch)", cmdline_path.display(), branch);

    let fstab_path = cfg.scratch_dir.join("etc/fstab");
    fstab::patch_fstab(
        &fstab_path,
        &fstab::PartitionIds {
            boot_partuuid,
            root_partuuid,
        },
    )?;
    info!("Rewrote {}", fstab_path.display());

    sentinel::write(&cfg.scratch_dir)?;
    info!(
        "Sentinel written to {}",
        sentinel::sentinel_path(&cfg.scratch_dir).display()
    );

    Ok(())
}

fn mount<'a, H: SystemHal>(
    hal: &'a H,
    device: &Path,
    target: &Path,
    fstype: &str,
    dry_run: bool,
) -> Result<MountGuard<'a, H>> {
    hal.mount_device(device, target, Some(fstype), MountOptions::new(), dry_run)
        .with_context(|| {
            format!("Failed to mount {} at {}", device.display(), target.display())
        })?;
    Ok(MountGuard::new(hal, target, dry_run))
}

fn try_mount<'a, H: SystemHal>(
    hal: &'a H,
    device: &Path,
    target: &Path,
    fstype: &str,
    dry_run: bool,
) -> Option<MountGuard<'a, H>> {
    match hal.mount_device(device, target, Some(fstype), MountOptions::new(), dry_run) {
        Ok(()) => Some(MountGuard::new(hal, target, dry_run)),
        Err(err) => {
            info!(
                "Could not mount {} at {} ({}); treating target as unprovisioned",
                device.display(),
                target.display(),
                err
            );
            None
        }
    }
}
