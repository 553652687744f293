//! Whole-disk clone delegation trait.
//!
//! Partitioning, block copy and filesystem resize all belong to the external
//! clone tool; the HAL only runs it and reports the outcome.

use crate::HalResult;
use std::path::Path;

/// Options for the destructive clone step.
#[derive(Debug, Clone)]
pub struct CloneOptions {
    pub dry_run: bool,
    /// Overwrite the destination without interactive confirmation.
    pub force: bool,
    /// Ask the tool for verbose output (it lands in our log file).
    pub verbose: bool,
    /// Expand the destination root filesystem to fill the device.
    pub expand: bool,
}

impl CloneOptions {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            force: true,
            verbose: true,
            expand: true,
        }
    }
}

/// Trait for cloning the running system onto a target disk.
pub trait CloneOps {
    /// Clone the running system onto `target_disk` using the named external
    /// tool. Blocks until the tool exits.
    fn clone_disk(&self, tool: &str, target_disk: &Path, opts: &CloneOptions) -> HalResult<()>;

    /// Check that the clone tool binary is resolvable on PATH.
    fn clone_tool_available(&self, tool: &str) -> HalResult<bool>;
}
