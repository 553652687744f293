use emmcprov::preflight::{self, PreflightConfig};
use emmcprov_hal::FakeHal;
use std::fs;
use tempfile::TempDir;

fn config(dir: &TempDir) -> PreflightConfig {
    let target = dir.path().join("mmcblk0");
    fs::write(&target, "").unwrap();
    let mut cfg = PreflightConfig::new(target, "rpi-clone".to_string());
    cfg.require_root = false;
    cfg.sys_block_root = dir.path().join("sys-block");
    cfg
}

#[test]
fn usb_backed_root_with_target_and_tool_passes() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    let hal = FakeHal::new();
    hal.set_root_source("/dev/sdb2");
    hal.add_clone_tool("rpi-clone");

    preflight::run(&hal, &cfg).unwrap();
}

#[test]
fn emmc_backed_root_is_rejected() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    let hal = FakeHal::new();
    hal.set_root_source("/dev/mmcblk0p2");
    hal.add_clone_tool("rpi-clone");

    let err = preflight::run(&hal, &cfg).unwrap_err();
    assert!(err.to_string().contains("not USB-backed"));
}

#[test]
fn sysfs_removable_flag_admits_non_sd_names() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    fs::create_dir_all(cfg.sys_block_root.join("vda")).unwrap();
    fs::write(cfg.sys_block_root.join("vda/removable"), "1\n").unwrap();

    let hal = FakeHal::new();
    hal.set_root_source("/dev/vda2");
    hal.add_clone_tool("rpi-clone");

    preflight::run(&hal, &cfg).unwrap();
}

#[test]
fn missing_target_node_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(&dir);
    cfg.target_disk = dir.path().join("missing");
    let hal = FakeHal::new();
    hal.set_root_source("/dev/sda2");
    hal.add_clone_tool("rpi-clone");

    let err = preflight::run(&hal, &cfg).unwrap_err();
    assert!(err.to_string().contains("Target device not found"));
}

#[test]
fn missing_clone_tool_is_rejected() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    let hal = FakeHal::new();
    hal.set_root_source("/dev/sda2");

    let err = preflight::run(&hal, &cfg).unwrap_err();
    assert!(err.to_string().contains("Clone tool not found"));
}
