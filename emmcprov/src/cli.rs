//! CLI argument parsing for emmcprov.
//!
//! Running without a subcommand performs the full provisioning run, matching
//! the zero-argument factory invocation.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "emmcprov")]
#[command(about = "One-shot eMMC factory provisioner")]
#[command(long_about = "One-shot eMMC factory provisioner.\n\n\
    Clones the running USB-booted system onto the internal eMMC, expands the\n\
    destination filesystem, rewrites boot/mount PARTUUIDs and marks\n\
    completion so repeat invocations are no-ops.\n\n\
    Run without a subcommand to perform the full provisioning run.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Target internal storage device
    #[arg(long, default_value = "/dev/mmcblk0", global = true)]
    pub target_disk: PathBuf,

    /// External whole-disk clone tool
    #[arg(long, default_value = "rpi-clone", global = true)]
    pub clone_tool: String,

    /// Scratch mount point for the cloned partitions
    #[arg(long, default_value = "/mnt/clone", global = true)]
    pub scratch_dir: PathBuf,

    /// Log file path (default /var/log/emmcprov/provision.log)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Run in dry-run mode (no changes made)
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Skip the final poweroff (bench/factory-line debugging)
    #[arg(long, global = true)]
    pub no_shutdown: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the precondition checks only
    Preflight,

    /// Report whether the target already carries the completion marker
    Status,
}
