// Linux-specific readers: /proc/diskstats, thermal zones, process table.

use std::path::Path;

use crate::source::{DiskSectors, NetBytes};

const PHYSICAL_DISK_PREFIXES: [&str; 3] = ["sd", "nvme", "vd"];
const THERMAL_ZONE_PREFERENCE: [&str; 2] = ["x86_pkg_temp", "acpitz"];

/// Whole-disk entries of the SSD/NVMe/virtio families. Loop and RAM devices are
/// excluded, as is any name ending in a digit (`sda1`, `nvme0n1`, `nvme0n1p1`).
pub(crate) fn is_physical_disk(name: &str) -> bool {
    if name.starts_with("loop") || name.starts_with("ram") {
        return false;
    }
    PHYSICAL_DISK_PREFIXES.iter().any(|p| name.starts_with(p))
        && !name.ends_with(|c: char| c.is_ascii_digit())
}

/// Sum sectors read (field 6) and written (field 10) across physical disks.
/// Malformed lines are skipped.
pub(crate) fn parse_diskstats(content: &str) -> DiskSectors {
    let mut total = DiskSectors::default();
    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() <= 10 || !is_physical_disk(parts[2]) {
            continue;
        }
        if let (Ok(read), Ok(written)) = (parts[5].parse::<u64>(), parts[9].parse::<u64>()) {
            total.read += read;
            total.written += written;
        }
    }
    total
}

pub(crate) fn read_diskstats(proc_root: &Path) -> anyhow::Result<DiskSectors> {
    let content = std::fs::read_to_string(proc_root.join("diskstats"))?;
    Ok(parse_diskstats(&content))
}

/// Sum rx/tx counters over every interface except loopback.
pub(crate) fn sum_interface_bytes<'a, I>(interfaces: I) -> NetBytes
where
    I: IntoIterator<Item = (&'a str, u64, u64)>,
{
    interfaces
        .into_iter()
        .filter(|(name, _, _)| !name.starts_with("lo"))
        .fold(NetBytes::default(), |acc, (_, rx, tx)| NetBytes {
            received: acc.received + rx,
            transmitted: acc.transmitted + tx,
        })
}

/// Package temperature in whole degrees from `<sys_root>/class/thermal/thermal_zone*`.
/// `x86_pkg_temp` is preferred over `acpitz`; other zone types are ignored.
pub(crate) fn read_cpu_temperature(sys_root: &Path) -> anyhow::Result<Option<i64>> {
    let thermal = sys_root.join("class").join("thermal");
    let mut zones: Vec<(usize, std::path::PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(&thermal)? {
        let entry = entry?;
        if !entry.file_name().to_string_lossy().starts_with("thermal_zone") {
            continue;
        }
        let Ok(kind) = std::fs::read_to_string(entry.path().join("type")) else {
            continue;
        };
        if let Some(rank) = THERMAL_ZONE_PREFERENCE
            .iter()
            .position(|t| *t == kind.trim())
        {
            zones.push((rank, entry.path()));
        }
    }
    zones.sort_by_key(|(rank, _)| *rank);

    let Some((_, zone)) = zones.first() else {
        return Ok(None);
    };
    let raw = std::fs::read_to_string(zone.join("temp"))?;
    Ok(Some(millidegrees_to_degrees(raw.trim())?))
}

fn millidegrees_to_degrees(raw: &str) -> anyhow::Result<i64> {
    let milli: f64 = raw
        .parse()
        .map_err(|e| anyhow::anyhow!("thermal temp {:?}: {}", raw, e))?;
    Ok((milli / 1000.0).round() as i64)
}

/// Number of numeric (PID) entries under `proc_root`.
pub(crate) fn count_processes(proc_root: &Path) -> anyhow::Result<u32> {
    let mut count = 0u32;
    for entry in std::fs::read_dir(proc_root)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().parse::<u32>().is_ok() {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISKSTATS: &str = "\
   7       0 loop0 120 0 2400 10 0 0 0 0 0 20 10 0 0 0 0 0 0
   1       0 ram0 5 0 40 0 0 0 0 0 0 0 0 0 0 0 0 0 0
   8       0 sda 5000 100 80000 900 3000 200 64000 1200 0 2000 2100 0 0 0 0 0 0
   8       1 sda1 4000 90 70000 800 2500 150 60000 1000 0 1800 1800 0 0 0 0 0 0
 259       0 nvme0n1 900 0 10000 50 400 0 6000 30 0 60 80 0 0 0 0 0 0
 259       1 nvme0n1p1 800 0 9000 40 300 0 5000 20 0 50 60 0 0 0 0 0 0
 253       0 dm-0 100 0 999 10 100 0 999 10 0 10 20 0 0 0 0 0 0
";

    #[test]
    fn physical_disk_filter() {
        assert!(is_physical_disk("sda"));
        assert!(is_physical_disk("vdb"));
        assert!(is_physical_disk("nvme0"));
        assert!(!is_physical_disk("sda1"));
        assert!(!is_physical_disk("vda2"));
        assert!(!is_physical_disk("nvme0n1"));
        assert!(!is_physical_disk("nvme0n1p1"));
        assert!(!is_physical_disk("loop0"));
        assert!(!is_physical_disk("ram0"));
        assert!(!is_physical_disk("dm-0"));
        assert!(!is_physical_disk("sr0"));
    }

    #[test]
    fn diskstats_sums_whole_disks_only() {
        let sectors = parse_diskstats(DISKSTATS);
        assert_eq!(sectors.read, 80_000);
        assert_eq!(sectors.written, 64_000);
    }

    #[test]
    fn nvme_namespace_ending_in_digit_does_not_contribute() {
        let nvme_only = "259 0 nvme0n1 900 0 10000 50 400 0 6000 30 0 60 80\n";
        assert_eq!(parse_diskstats(nvme_only), DiskSectors::default());
    }

    #[test]
    fn partition_sectors_do_not_contribute() {
        let only_sda = "8 0 sda 1 0 100 0 1 0 200 0 0 0 0\n8 1 sda1 1 0 50 0 1 0 70 0 0 0 0\n";
        assert_eq!(
            parse_diskstats(only_sda),
            DiskSectors {
                read: 100,
                written: 200
            }
        );
    }

    #[test]
    fn diskstats_skips_short_and_garbled_lines() {
        let content = "8 0 sda 1 2\n8 16 sdb 1 0 x 0 1 0 5 0 0 0 0\n8 32 sdc 1 0 7 0 1 0 9 0 0 0 0\n";
        assert_eq!(
            parse_diskstats(content),
            DiskSectors {
                read: 7,
                written: 9
            }
        );
    }

    #[test]
    fn loopback_interfaces_are_ignored() {
        let totals = sum_interface_bytes([
            ("lo", 1_000_000, 1_000_000),
            ("eth0", 300, 100),
            ("wlan0", 50, 20),
        ]);
        assert_eq!(
            totals,
            NetBytes {
                received: 350,
                transmitted: 120
            }
        );
    }

    fn write_zone(root: &Path, idx: usize, kind: &str, temp: &str) {
        let zone = root
            .join("class")
            .join("thermal")
            .join(format!("thermal_zone{idx}"));
        std::fs::create_dir_all(&zone).unwrap();
        std::fs::write(zone.join("type"), format!("{kind}\n")).unwrap();
        std::fs::write(zone.join("temp"), format!("{temp}\n")).unwrap();
    }

    #[test]
    fn temperature_prefers_package_sensor() {
        let dir = tempfile::TempDir::new().unwrap();
        write_zone(dir.path(), 0, "acpitz", "27800");
        write_zone(dir.path(), 1, "iwlwifi_1", "40000");
        write_zone(dir.path(), 2, "x86_pkg_temp", "51600");
        assert_eq!(read_cpu_temperature(dir.path()).unwrap(), Some(52));
    }

    #[test]
    fn temperature_falls_back_to_acpi_zone() {
        let dir = tempfile::TempDir::new().unwrap();
        write_zone(dir.path(), 0, "acpitz", "27800");
        assert_eq!(read_cpu_temperature(dir.path()).unwrap(), Some(28));
    }

    #[test]
    fn temperature_unknown_without_matching_zone() {
        let dir = tempfile::TempDir::new().unwrap();
        write_zone(dir.path(), 0, "iwlwifi_1", "40000");
        assert_eq!(read_cpu_temperature(dir.path()).unwrap(), None);
    }

    #[test]
    fn temperature_parse_failure_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        write_zone(dir.path(), 0, "x86_pkg_temp", "hot");
        assert!(read_cpu_temperature(dir.path()).is_err());
    }

    #[test]
    fn process_count_only_counts_pid_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["1", "42", "3011", "self", "net", "sys"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("uptime"), "1 2").unwrap();
        assert_eq!(count_processes(dir.path()).unwrap(), 3);
    }
}
