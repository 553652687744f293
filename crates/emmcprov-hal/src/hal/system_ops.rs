//! System-level operations (sync, shutdown).

use crate::HalResult;

/// System operations trait.
pub trait SystemOps {
    /// Best-effort filesystem sync.
    fn sync(&self) -> HalResult<()>;

    /// Schedule a halt after the given delay in minutes.
    fn shutdown(&self, delay_minutes: u32, dry_run: bool) -> HalResult<()>;
}
