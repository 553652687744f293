//! HAL trait definitions and implementations.
//!
//! This module defines the core traits for system operations and provides
//! both real (LinuxHal) and fake (FakeHal) implementations.

pub mod clone_ops;
pub mod fake_hal;
pub mod guards;
pub mod linux_hal;
pub mod mount_ops;
pub mod probe_ops;
pub mod system_ops;

pub use clone_ops::{CloneOps, CloneOptions};
pub use fake_hal::{FakeHal, Operation};
pub use guards::MountGuard;
pub use linux_hal::LinuxHal;
pub use mount_ops::{MountOps, MountOptions};
pub use probe_ops::ProbeOps;
pub use system_ops::SystemOps;

/// Complete HAL combining all system operation traits.
pub trait SystemHal: MountOps + ProbeOps + CloneOps + SystemOps + Send + Sync {}

/// Automatically implement SystemHal for any type implementing all required traits.
impl<T> SystemHal for T where T: MountOps + ProbeOps + CloneOps + SystemOps + Send + Sync {}
