// Human-readable formatting for dashboard fields.

use chrono::{DateTime, Duration, TimeZone};

const MIB: f64 = 1024.0 * 1024.0;
const GIB: u64 = 1024 * 1024 * 1024;

/// Cumulative byte total: one decimal GB above 1 GiB, otherwise whole MB.
pub fn format_bytes(bytes: u64) -> String {
    if bytes > GIB {
        format!("{:.1} GB", bytes as f64 / GIB as f64)
    } else {
        format!("{:.0} MB", bytes as f64 / MIB)
    }
}

/// `<days>d <hours>h <minutes>m`
pub fn format_uptime(uptime_secs: u64) -> String {
    let days = uptime_secs / 86_400;
    let hours = (uptime_secs % 86_400) / 3_600;
    let minutes = (uptime_secs % 3_600) / 60;
    format!("{days}d {hours}h {minutes}m")
}

/// Boot instant (`now - uptime`) as `dd/MM HH:mm`.
pub fn format_boot_time<Tz: TimeZone>(now: DateTime<Tz>, uptime_secs: u64) -> String
where
    Tz::Offset: std::fmt::Display,
{
    i64::try_from(uptime_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|uptime| now.checked_sub_signed(uptime))
        .map(|boot| boot.format("%d/%m %H:%M").to_string())
        .unwrap_or_else(|| "--/-- --:--".to_string())
}

pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn bytes_below_one_gib_are_whole_megabytes() {
        assert_eq!(format_bytes(0), "0 MB");
        assert_eq!(format_bytes(300 * 1024 * 1024), "300 MB");
        assert_eq!(format_bytes(GIB), "1024 MB");
    }

    #[test]
    fn bytes_above_one_gib_are_gigabytes_with_one_decimal() {
        assert_eq!(format_bytes(GIB + 1), "1.0 GB");
        assert_eq!(format_bytes(5 * GIB / 2), "2.5 GB");
    }

    #[test]
    fn uptime_breaks_into_days_hours_minutes() {
        assert_eq!(format_uptime(0), "0d 0h 0m");
        assert_eq!(format_uptime(59), "0d 0h 0m");
        assert_eq!(format_uptime(3 * 86_400 + 4 * 3_600 + 5 * 60 + 7), "3d 4h 5m");
    }

    #[test]
    fn boot_time_is_now_minus_uptime() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 30, 0).unwrap();
        assert_eq!(format_boot_time(now, 86_400 + 3_600), "09/03 11:30");
    }

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(round1(12.34), 12.3);
        assert_eq!(round1(12.36), 12.4);
    }
}
