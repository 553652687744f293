//! Fake HAL implementation for testing.
//!
//! Records operations without executing them, allowing CI-safe tests of the
//! provisioning pipeline without root privileges or real hardware.

use super::{CloneOps, CloneOptions, MountOps, MountOptions, ProbeOps, SystemOps};
use crate::{HalError, HalResult};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Operation records for testing and verification.
#[derive(Debug, Clone)]
pub enum Operation {
    Mount {
        device: PathBuf,
        target: PathBuf,
        fstype: Option<String>,
    },
    Unmount {
        target: PathBuf,
    },
    BlkidPartUuid {
        device: PathBuf,
    },
    CloneDisk {
        tool: String,
        target: PathBuf,
    },
    Sync,
    Shutdown {
        delay_minutes: u32,
    },
}

#[derive(Debug, Default)]
struct FakeHalState {
    operations: Vec<Operation>,
    mounted_paths: HashSet<PathBuf>,
    partuuids: HashMap<PathBuf, String>,
    root_source: String,
    clone_tools: HashSet<String>,
    /// Devices whose mount attempts should fail (blank disk on first run).
    failing_mounts: HashSet<PathBuf>,
}

/// Fake HAL that records operations instead of executing them.
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.state.lock().unwrap().operations.clone()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.state.lock().unwrap().operations.iter().any(check)
    }

    /// Script the PARTUUID that `blkid_partuuid` reports for a partition.
    pub fn set_partuuid(&self, device: impl Into<PathBuf>, partuuid: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .partuuids
            .insert(device.into(), partuuid.into());
    }

    /// Script the device backing the running root filesystem.
    pub fn set_root_source(&self, source: impl Into<String>) {
        self.state.lock().unwrap().root_source = source.into();
    }

    /// Mark a clone tool as resolvable on PATH.
    pub fn add_clone_tool(&self, tool: impl Into<String>) {
        self.state.lock().unwrap().clone_tools.insert(tool.into());
    }

    /// Make mount attempts for a device fail, as on an unpartitioned disk.
    pub fn fail_mounts_for(&self, device: impl Into<PathBuf>) {
        self.state
            .lock()
            .unwrap()
            .failing_mounts
            .insert(device.into());
    }

    fn record(&self, op: Operation) {
        self.state.lock().unwrap().operations.push(op);
    }
}

impl MountOps for FakeHal {
    fn mount_device(
        &self,
        device: &Path,
        target: &Path,
        fstype: Option<&str>,
        _options: MountOptions,
        _dry_run: bool,
    ) -> HalResult<()> {
        {
            let state = self.state.lock().unwrap();
            if state.failing_mounts.contains(device) {
                return Err(HalError::Nix(nix::errno::Errno::EINVAL));
            }
        }
        self.record(Operation::Mount {
            device: device.to_path_buf(),
            target: target.to_path_buf(),
            fstype: fstype.map(|s| s.to_string()),
        });
        self.state
            .lock()
            .unwrap()
            .mounted_paths
            .insert(target.to_path_buf());
        Ok(())
    }

    fn unmount(&self, target: &Path, _dry_run: bool) -> HalResult<()> {
        self.record(Operation::Unmount {
            target: target.to_path_buf(),
        });
        let removed = self
            .state
            .lock()
            .unwrap()
            .mounted_paths
            .remove(target);
        if !removed {
            return Err(HalError::Nix(nix::errno::Errno::EINVAL));
        }
        Ok(())
    }

    fn is_mounted(&self, path: &Path) -> HalResult<bool> {
        Ok(self.state.lock().unwrap().mounted_paths.contains(path))
    }
}

impl ProbeOps for FakeHal {
    fn blkid_partuuid(&self, device: &Path) -> HalResult<String> {
        self.record(Operation::BlkidPartUuid {
            device: device.to_path_buf(),
        });
        self.state
            .lock()
            .unwrap()
            .partuuids
            .get(device)
            .cloned()
            .ok_or_else(|| {
                HalError::Parse(format!("no scripted PARTUUID for {}", device.display()))
            })
    }

    fn root_source(&self) -> HalResult<String> {
        let source = self.state.lock().unwrap().root_source.clone();
        if source.is_empty() {
            return Err(HalError::Parse("no scripted root source".to_string()));
        }
        Ok(source)
    }
}

impl CloneOps for FakeHal {
    fn clone_disk(&self, tool: &str, target_disk: &Path, opts: &CloneOptions) -> HalResult<()> {
        if opts.dry_run {
            return Ok(());
        }
        self.record(Operation::CloneDisk {
            tool: tool.to_string(),
            target: target_disk.to_path_buf(),
        });
        Ok(())
    }

    fn clone_tool_available(&self, tool: &str) -> HalResult<bool> {
        Ok(self.state.lock().unwrap().clone_tools.contains(tool))
    }
}

impl SystemOps for FakeHal {
    fn sync(&self) -> HalResult<()> {
        self.record(Operation::Sync);
        Ok(())
    }

    fn shutdown(&self, delay_minutes: u32, dry_run: bool) -> HalResult<()> {
        if dry_run {
            return Ok(());
        }
        self.record(Operation::Shutdown { delay_minutes });
        Ok(())
    }
}
