//! Human-readable renderings for progress lines and chat messages.

use std::time::Duration;

/// Render a duration as `1h 2m 3s`, dropping leading zero units.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Render a byte count with a binary unit (`1.5 GiB`).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// `Downloading: 40% (eta 3m 12s)`.
pub fn format_progress(label: &str, fraction: f64, eta: Option<Duration>) -> String {
    format_percent(label, fraction_to_percent(fraction), eta)
}

/// Same line as [`format_progress`] for an already whole percentage.
pub fn format_percent(label: &str, percent: u32, eta: Option<Duration>) -> String {
    let percent = percent.min(100);
    match eta {
        Some(eta) => format!("{}: {}% (eta {})", label, percent, format_duration(eta)),
        None => format!("{}: {}%", label, percent),
    }
}

/// Whole percent of a `0.0..=1.0` fraction, rounded down.
///
/// `0.29 * 100.0` is `28.999999999999996`; the epsilon keeps such values
/// from losing a point.
pub(crate) fn fraction_to_percent(fraction: f64) -> u32 {
    (fraction.clamp(0.0, 1.0) * 100.0 + 1e-9).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0s");
        assert_eq!(format_duration(Duration::from_secs(59)), "59s");
        assert_eq!(format_duration(Duration::from_secs(62)), "1m 2s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h 2m 3s");
        assert_eq!(format_duration(Duration::from_secs(7200)), "2h 0m 0s");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }

    #[test]
    fn test_format_progress() {
        assert_eq!(
            format_progress("Downloading", 0.4, Some(Duration::from_secs(192))),
            "Downloading: 40% (eta 3m 12s)"
        );
        assert_eq!(format_progress("Compressing", 1.7, None), "Compressing: 100%");
        assert_eq!(format_progress("Muxing", 0.999, None), "Muxing: 99%");
        assert_eq!(format_progress("Downloading", 0.29, None), "Downloading: 29%");
        assert_eq!(format_progress("Downloading", 0.57, None), "Downloading: 57%");
    }

    #[test]
    fn test_format_percent_is_exact() {
        for percent in 0..=100 {
            assert_eq!(
                format_percent("Downloading", percent, None),
                format!("Downloading: {}%", percent)
            );
        }
        assert_eq!(format_percent("Burning", 250, None), "Burning: 100%");
    }
}
