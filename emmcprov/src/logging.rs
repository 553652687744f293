use std::path::{Path, PathBuf};

const DEFAULT_LOG_FILE: &str = "/var/log/emmcprov/provision.log";

pub fn init_with(log_file: Option<PathBuf>) {
    use env_logger::Target;
    use std::fs;
    use std::io;

    // Prefer appending to a stable location so every provisioning attempt of
    // a unit stays in one file. If we cannot create the file (permissions,
    // readonly FS, etc.), fall back to stderr.
    let path = log_file.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    let target = (|| -> io::Result<Target> {
        if let Some(parent) = Path::new(&path).parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Target::Pipe(Box::new(file)))
    })()
    .unwrap_or(Target::Stderr);

    env_logger::Builder::from_default_env()
        .target(target)
        .filter_level(log::LevelFilter::Info)
        .init();
}
