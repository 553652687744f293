/// Partition path helper for block devices. Handles nvme/mmcblk postfixing.
pub fn partition_path(disk: &str, num: u32) -> String {
    if disk.contains("nvme") || disk.contains("mmcblk") {
        format!("{}p{}", disk, num)
    } else {
        format!("{}{}", disk, num)
    }
}

/// Strips a partition suffix from a device path, yielding the whole-disk path.
///
/// `/dev/sda2` -> `/dev/sda`, `/dev/mmcblk0p2` -> `/dev/mmcblk0`,
/// `/dev/nvme0n1p1` -> `/dev/nvme0n1`. Paths without a partition suffix are
/// returned unchanged.
pub fn parent_disk_path(device: &str) -> String {
    if device.contains("nvme") || device.contains("mmcblk") {
        if let Some(pos) = device.rfind('p') {
            if device[pos + 1..].chars().all(|c| c.is_ascii_digit())
                && !device[pos + 1..].is_empty()
            {
                return device[..pos].to_string();
            }
        }
        return device.to_string();
    }
    device.trim_end_matches(|c: char| c.is_ascii_digit()).to_string()
}
