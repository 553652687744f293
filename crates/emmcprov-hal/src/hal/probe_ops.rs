//! Device probing operations (blkid, mountinfo).

use crate::HalResult;
use std::path::Path;

/// Probing operations trait.
pub trait ProbeOps {
    /// Return PARTUUID for a partition (e.g. `/dev/mmcblk0p2`).
    fn blkid_partuuid(&self, device: &Path) -> HalResult<String>;

    /// Source device of the currently booted root filesystem.
    fn root_source(&self) -> HalResult<String>;
}
