use crate::MountOps;
use std::path::{Path, PathBuf};

/// RAII guard that unmounts a target path when dropped.
///
/// The provisioner mounts scratch paths on every run; holding them in a
/// guard keeps the unmount on every exit path, error paths included.
#[derive(Debug)]
pub struct MountGuard<'a, H: MountOps + ?Sized> {
    hal: &'a H,
    target: PathBuf,
    dry_run: bool,
    active: bool,
}

impl<'a, H: MountOps + ?Sized> MountGuard<'a, H> {
    pub fn new(hal: &'a H, target: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            hal,
            target: target.into(),
            dry_run,
            active: true,
        }
    }

    /// Prevent automatic unmounting and return the target path.
    pub fn release(mut self) -> PathBuf {
        self.active = false;
        self.target.clone()
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

impl<'a, H: MountOps + ?Sized> Drop for MountGuard<'a, H> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(err) = self.hal.unmount(&self.target, self.dry_run) {
            log::warn!(
                "mount guard failed to unmount {}: {}",
                self.target.display(),
                err
            );
        }
    }
}
