//! Linux HAL implementation using real system calls.

use super::{CloneOps, CloneOptions, MountOps, MountOptions, ProbeOps, SystemOps};
use crate::{HalError, HalResult};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Real HAL implementation for Linux systems.
#[derive(Debug, Clone, Default)]
pub struct LinuxHal;

impl LinuxHal {
    pub fn new() -> Self {
        Self
    }
}

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const SYNC_TIMEOUT: Duration = Duration::from_secs(60);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
// Whole-disk copy of a live system onto eMMC; generous upper bound.
const CLONE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

fn map_command_err(program: &str, err: std::io::Error) -> HalError {
    if err.kind() == std::io::ErrorKind::NotFound {
        return HalError::CommandNotFound(program.to_string());
    }
    HalError::Io(err)
}

fn output_failed(program: &str, output: &Output) -> HalError {
    HalError::CommandFailed {
        program: program.to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

fn output_with_timeout(program: &str, cmd: &mut Command, timeout: Duration) -> HalResult<Output> {
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = cmd.spawn().map_err(|e| map_command_err(program, e))?;

    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    // Drain pipes concurrently to avoid deadlocks on large output.
    let stdout_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout.take() {
            let _ = out.read_to_end(&mut buf);
        }
        buf
    });
    let stderr_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr.take() {
            let _ = err.read_to_end(&mut buf);
        }
        buf
    });

    let status = match child.wait_timeout(timeout).map_err(HalError::Io)? {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            let _ = stdout_handle.join();
            let _ = stderr_handle.join();
            return Err(HalError::CommandTimeout {
                program: program.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

fn status_with_timeout(program: &str, cmd: &mut Command, timeout: Duration) -> HalResult<()> {
    let output = output_with_timeout(program, cmd, timeout)?;
    if !output.status.success() {
        return Err(output_failed(program, &output));
    }
    Ok(())
}

fn map_nix_err(err: nix::errno::Errno) -> HalError {
    use nix::errno::Errno;
    match err {
        Errno::EBUSY => HalError::DiskBusy,
        Errno::EACCES | Errno::EPERM => HalError::PermissionDenied,
        other => HalError::Nix(other),
    }
}

impl MountOps for LinuxHal {
    fn mount_device(
        &self,
        device: &Path,
        target: &Path,
        fstype: Option<&str>,
        options: MountOptions,
        dry_run: bool,
    ) -> HalResult<()> {
        if dry_run {
            log::info!(
                "DRY RUN: mount {} -> {}",
                device.display(),
                target.display()
            );
            return Ok(());
        }

        let flags = nix::mount::MsFlags::empty();
        let data = options.options.as_deref();

        nix::mount::mount(Some(device), target, fstype, flags, data).map_err(map_nix_err)?;

        Ok(())
    }

    fn unmount(&self, target: &Path, dry_run: bool) -> HalResult<()> {
        if dry_run {
            log::info!("DRY RUN: unmount {}", target.display());
            return Ok(());
        }

        nix::mount::umount2(target, nix::mount::MntFlags::empty()).map_err(map_nix_err)?;

        Ok(())
    }

    fn is_mounted(&self, path: &Path) -> HalResult<bool> {
        let content = fs::read_to_string("/proc/self/mountinfo")?;
        let entries = crate::procfs::mountinfo::parse_mountinfo(&content);
        Ok(crate::procfs::mountinfo::is_mounted_from_info(
            path, &entries,
        ))
    }
}

impl ProbeOps for LinuxHal {
    fn blkid_partuuid(&self, device: &Path) -> HalResult<String> {
        let mut cmd = Command::new("blkid");
        cmd.args(["-s", "PARTUUID", "-o", "value"]).arg(device);
        let output = output_with_timeout("blkid", &mut cmd, PROBE_TIMEOUT)?;

        if !output.status.success() {
            return Err(output_failed("blkid", &output));
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if value.is_empty() {
            return Err(HalError::Parse(format!(
                "blkid returned no PARTUUID for {}",
                device.display()
            )));
        }
        Ok(value)
    }

    fn root_source(&self) -> HalResult<String> {
        let content = fs::read_to_string("/proc/self/mountinfo")?;
        let entries = crate::procfs::mountinfo::parse_mountinfo(&content);
        crate::procfs::mountinfo::root_mount_source(&entries)
            .map(|s| s.to_string())
            .ok_or_else(|| HalError::Parse("no / mount in mountinfo".to_string()))
    }
}

impl CloneOps for LinuxHal {
    fn clone_disk(&self, tool: &str, target_disk: &Path, opts: &CloneOptions) -> HalResult<()> {
        // The clone tool takes the bare device name (`mmcblk0`), not the node path.
        let disk_name = target_disk
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                HalError::Parse(format!("invalid target disk {}", target_disk.display()))
            })?;

        let mut args: Vec<&str> = Vec::new();
        if opts.force {
            args.push("-f");
        }
        if opts.verbose {
            args.push("-v");
        }
        if opts.expand {
            args.push("-x");
        }
        args.push(&disk_name);

        if opts.dry_run {
            log::info!("DRY RUN: {} {}", tool, args.join(" "));
            return Ok(());
        }

        let mut cmd = Command::new(tool);
        cmd.args(&args);
        let output = output_with_timeout(tool, &mut cmd, CLONE_TIMEOUT)?;

        // The tool's verbose output is worth keeping around in the provision log.
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            log::info!("[{}] {}", tool, line);
        }

        if !output.status.success() {
            return Err(output_failed(tool, &output));
        }
        Ok(())
    }

    fn clone_tool_available(&self, tool: &str) -> HalResult<bool> {
        let mut cmd = Command::new("which");
        cmd.arg(tool);
        let output = output_with_timeout("which", &mut cmd, PROBE_TIMEOUT)?;
        Ok(output.status.success())
    }
}

impl SystemOps for LinuxHal {
    fn sync(&self) -> HalResult<()> {
        // Avoid linking libc directly; keep behavior aligned with existing shell usage.
        let mut cmd = Command::new("sync");
        status_with_timeout("sync", &mut cmd, SYNC_TIMEOUT)
    }

    fn shutdown(&self, delay_minutes: u32, dry_run: bool) -> HalResult<()> {
        if dry_run {
            log::info!("DRY RUN: shutdown -h +{}", delay_minutes);
            return Ok(());
        }
        let delay = format!("+{}", delay_minutes);
        let mut cmd = Command::new("shutdown");
        cmd.args(["-h", &delay]);
        status_with_timeout("shutdown", &mut cmd, SHUTDOWN_TIMEOUT)
    }
}
