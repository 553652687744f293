use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Root filesystem is not USB-backed: {0}")]
    RootNotRemovable(String),

    #[error("Target device not found: {0}")]
    TargetMissing(String),

    #[error("Clone tool not found on PATH: {0}")]
    CloneToolMissing(String),

    #[error("Must run as root")]
    NotRoot,
}
