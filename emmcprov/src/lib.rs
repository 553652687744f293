use clap::Parser;

pub mod boot_config;
pub mod cli;
pub mod errors;
pub mod logging;
pub mod preflight;
pub mod provision;
pub mod sentinel;

pub fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    logging::init_with(cli.log_file.clone());

    let hal = emmcprov_hal::LinuxHal::new();
    let mut cfg = provision::ProvisionConfig::new(
        cli.target_disk.clone(),
        cli.clone_tool.clone(),
        cli.scratch_dir.clone(),
    );
    cfg.dry_run = cli.dry_run;
    cfg.no_shutdown = cli.no_shutdown;

    match &cli.command {
        // No subcommand = full provisioning run (the factory invocation).
        None => {
            match provision::run(&hal, &cfg)? {
                provision::RunOutcome::AlreadyProvisioned => {
                    log::info!("Target already provisioned; exiting");
                }
                provision::RunOutcome::Provisioned => {}
            }
            Ok(())
        }
        Some(cli::Command::Preflight) => {
            log::info!("Running preflight checks only");
            preflight::run(&hal, &cfg.preflight)
        }
        Some(cli::Command::Status) => {
            let provisioned = provision::target_is_provisioned(&hal, &cfg)?;
            if provisioned {
                println!("provisioned");
            } else {
                println!("not provisioned");
            }
            Ok(())
        }
    }
}
