//! Human readable sizes.

/// Render a byte count with binary prefixes, one decimal place.
///
/// # Example
///
/// ```
/// use playsync_schema::format_size;
///
/// assert_eq!(format_size(512), "512.0B");
/// assert_eq!(format_size(1536), "1.5KiB");
/// assert_eq!(format_size(3 * 1024 * 1024), "3.0MiB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 8] = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "Zi"];

    let mut value = bytes as f64;
    for unit in UNITS {
        if value.abs() < 1024.0 {
            return format!("{value:.1}{unit}B");
        }
        value /= 1024.0;
    }
    format!("{value:.1}YiB")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(format_size(0), "0.0B");
        assert_eq!(format_size(1023), "1023.0B");
        assert_eq!(format_size(1024), "1.0KiB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0GiB");
    }
}
