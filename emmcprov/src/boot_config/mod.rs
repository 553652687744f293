//! Rewriting of boot/mount identifiers on the cloned system.

pub mod cmdline;
pub mod fstab;

/// Device paths the running USB system and template images reference.
/// The rewriters recognize these literally, each independently optional.
pub const TEMPLATE_BOOT: &str = "/dev/sda1";
pub const TEMPLATE_ROOT: &str = "/dev/sda2";
pub const INTERNAL_BOOT: &str = "/dev/mmcblk0p1";
pub const INTERNAL_ROOT: &str = "/dev/mmcblk0p2";
