use emmcprov::provision::{self, ProvisionConfig, RunOutcome};
use emmcprov_hal::{FakeHal, MountOps, Operation};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const BOOT_UUID: &str = "9ac3f81b-01";
const ROOT_UUID: &str = "9ac3f81b-02";

struct Fixture {
    hal: FakeHal,
    cfg: ProvisionConfig,
    _dir: TempDir,
}

/// Builds a FakeHal plus a config rooted in a tempdir. The target "disk" is
/// a regular file named like the eMMC node so the existence check passes.
fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("mmcblk0");
    fs::write(&target, "").unwrap();

    let scratch = dir.path().join("clone");
    fs::create_dir_all(scratch.join("boot")).unwrap();
    fs::create_dir_all(scratch.join("etc")).unwrap();
    fs::write(
        scratch.join("boot/cmdline.txt"),
        "console=serial0,115200 root=/dev/sda2 rootfstype=ext4 rootwait\n",
    )
    .unwrap();
    fs::write(
        scratch.join("etc/fstab"),
        "proc            /proc  proc    defaults          0 0\n\
         PARTUUID=dead-01 /boot  vfat    defaults          0 2\n\
         PARTUUID=dead-02 /      ext4    defaults,noatime  0 1\n",
    )
    .unwrap();

    let hal = FakeHal::new();
    hal.set_root_source("/dev/sda2");
    hal.add_clone_tool("rpi-clone");
    hal.set_partuuid(boot_partition(&target), BOOT_UUID);
    hal.set_partuuid(root_partition(&target), ROOT_UUID);

    let mut cfg = ProvisionConfig::new(target, "rpi-clone".to_string(), scratch);
    cfg.preflight.require_root = false;
    cfg.preflight.sys_block_root = dir.path().join("sys-block");
    cfg.no_shutdown = false;

    Fixture {
        hal,
        cfg,
        _dir: dir,
    }
}

fn boot_partition(target: &Path) -> PathBuf {
    PathBuf::from(format!("{}p1", target.display()))
}

fn root_partition(target: &Path) -> PathBuf {
    PathBuf::from(format!("{}p2", target.display()))
}

#[test]
fn full_run_rewrites_identifiers_and_writes_sentinel() {
    let f = fixture();

    let outcome = provision::run(&f.hal, &f.cfg).unwrap();
    assert_eq!(outcome, RunOutcome::Provisioned);

    let cmdline = fs::read_to_string(f.cfg.scratch_dir.join("boot/cmdline.txt")).unwrap();
    assert!(cmdline.contains(&format!("root=PARTUUID={}", ROOT_UUID)));
    assert!(!cmdline.contains("/dev/sda2"));

    let fstab = fs::read_to_string(f.cfg.scratch_dir.join("etc/fstab")).unwrap();
    assert!(fstab.contains(&format!("PARTUUID={} /boot", BOOT_UUID)));
    assert!(fstab.contains(&format!("PARTUUID={} /", ROOT_UUID)));

    assert!(f.cfg.scratch_dir.join("boot/.emmc-provisioned").exists());

    assert!(f
        .hal
        .has_operation(|op| matches!(op, Operation::CloneDisk { tool, .. } if tool == "rpi-clone")));
    assert!(f
        .hal
        .has_operation(|op| matches!(op, Operation::Shutdown { delay_minutes: 1 })));
}

#[test]
fn every_mount_names_its_device_and_filesystem_type() {
    let f = fixture();
    provision::run(&f.hal, &f.cfg).unwrap();

    let boot = boot_partition(&f.cfg.target_disk);
    let root = root_partition(&f.cfg.target_disk);
    let mut saw_boot = 0;
    let mut saw_root = 0;
    for op in f.hal.operations() {
        if let Operation::Mount {
            device, fstype, ..
        } = op
        {
            // mount(2) refuses a missing type; every pipeline mount must
            // spell out the layout's filesystem.
            if device == boot {
                assert_eq!(fstype.as_deref(), Some("vfat"));
                saw_boot += 1;
            } else if device == root {
                assert_eq!(fstype.as_deref(), Some("ext4"));
                saw_root += 1;
            } else {
                panic!("mount of unexpected device {}", device.display());
            }
        }
    }
    // Both the idempotency guard and the rewrite phase mount each partition.
    assert_eq!(saw_boot, 2);
    assert_eq!(saw_root, 2);
}

#[test]
fn guard_tolerates_a_failing_boot_mount() {
    let f = fixture();
    f.hal.fail_mounts_for(boot_partition(&f.cfg.target_disk));

    // Partition 2 mounts fine, partition 1 does not (clone interrupted
    // before it was created); the sentinel check just comes up empty.
    let provisioned = provision::target_is_provisioned(&f.hal, &f.cfg).unwrap();
    assert!(!provisioned);

    assert!(f.hal.has_operation(|op| matches!(
        op,
        Operation::Mount { device, .. } if device == &root_partition(&f.cfg.target_disk)
    )));
    assert!(f.hal.has_operation(
        |op| matches!(op, Operation::Unmount { target } if target == &f.cfg.scratch_dir)
    ));
    assert!(!f.hal.is_mounted(&f.cfg.scratch_dir).unwrap());
}

#[test]
fn every_mount_is_paired_with_an_unmount() {
    let f = fixture();
    provision::run(&f.hal, &f.cfg).unwrap();

    let ops = f.hal.operations();
    let mounts = ops
        .iter()
        .filter(|op| matches!(op, Operation::Mount { .. }))
        .count();
    let unmounts = ops
        .iter()
        .filter(|op| matches!(op, Operation::Unmount { .. }))
        .count();
    assert_eq!(mounts, unmounts);
    assert!(mounts >= 2);
}

#[test]
fn sentinel_present_short_circuits_to_a_noop() {
    let f = fixture();
    fs::write(f.cfg.scratch_dir.join("boot/.emmc-provisioned"), "").unwrap();

    let outcome = provision::run(&f.hal, &f.cfg).unwrap();
    assert_eq!(outcome, RunOutcome::AlreadyProvisioned);

    // Only mounts and unmounts; the clone tool never ran and nothing was
    // rewritten.
    for op in f.hal.operations() {
        assert!(
            matches!(op, Operation::Mount { .. } | Operation::Unmount { .. }),
            "unexpected operation: {:?}",
            op
        );
    }
    let cmdline = fs::read_to_string(f.cfg.scratch_dir.join("boot/cmdline.txt")).unwrap();
    assert!(cmdline.contains("root=/dev/sda2"));
}

#[test]
fn missing_target_device_aborts_before_any_mount_or_clone() {
    let f = fixture();
    fs::remove_file(&f.cfg.target_disk).unwrap();

    assert!(provision::run(&f.hal, &f.cfg).is_err());
    assert!(f.hal.operations().is_empty());
}

#[test]
fn non_removable_root_device_aborts_before_any_mutation() {
    let f = fixture();
    f.hal.set_root_source("/dev/mmcblk0p2");

    assert!(provision::run(&f.hal, &f.cfg).is_err());
    assert!(f.hal.operations().is_empty());
}

#[test]
fn blank_target_counts_as_unprovisioned() {
    let f = fixture();
    f.hal.fail_mounts_for(root_partition(&f.cfg.target_disk));

    let provisioned = provision::target_is_provisioned(&f.hal, &f.cfg).unwrap();
    assert!(!provisioned);
    assert!(!f
        .hal
        .has_operation(|op| matches!(op, Operation::Unmount { .. })));
}

#[test]
fn no_shutdown_flag_skips_the_poweroff() {
    let mut f = fixture();
    f.cfg.no_shutdown = true;

    let outcome = provision::run(&f.hal, &f.cfg).unwrap();
    assert_eq!(outcome, RunOutcome::Provisioned);
    assert!(!f
        .hal
        .has_operation(|op| matches!(op, Operation::Shutdown { .. })));
}

#[test]
fn dry_run_clones_nothing_and_leaves_files_alone() {
    let mut f = fixture();
    f.cfg.dry_run = true;

    let outcome = provision::run(&f.hal, &f.cfg).unwrap();
    assert_eq!(outcome, RunOutcome::Provisioned);

    assert!(!f
        .hal
        .has_operation(|op| matches!(op, Operation::CloneDisk { .. })));
    assert!(!f.cfg.scratch_dir.join("boot/.emmc-provisioned").exists());
    let cmdline = fs::read_to_string(f.cfg.scratch_dir.join("boot/cmdline.txt")).unwrap();
    assert!(cmdline.contains("root=/dev/sda2"));
}

#[test]
fn rerunning_after_success_is_a_noop() {
    let mut f = fixture();
    f.cfg.no_shutdown = true;

    assert_eq!(provision::run(&f.hal, &f.cfg).unwrap(), RunOutcome::Provisioned);
    assert_eq!(
        provision::run(&f.hal, &f.cfg).unwrap(),
        RunOutcome::AlreadyProvisioned
    );
}
