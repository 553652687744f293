//! System abstraction layer for the emmcprov provisioner.
//!
//! External commands and mounts are "world-touching" and go through the HAL
//! traits here so the provisioning pipeline can be tested without touching
//! real block devices.

pub mod error;
pub mod hal;
pub mod path;
pub mod procfs;
pub mod sysfs;

pub use error::{HalError, HalResult};
pub use hal::{
    CloneOps, CloneOptions, FakeHal, LinuxHal, MountGuard, MountOps, MountOptions, Operation,
    ProbeOps, SystemHal, SystemOps,
};
