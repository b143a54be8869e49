//! Human-readable byte sizes for logs and summaries.

const UNITS: [&str; 8] = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "Zi"];

/// Format a byte count with binary units, e.g. `1536` -> `"1.5 KiB"`
pub fn format_bytes(bytes: u64) -> String {
    let mut num = bytes as f64;

    for unit in UNITS {
        if num < 1024.0 {
            return format!("{:.1} {}B", num, unit);
        }
        num /= 1024.0;
    }

    format!("{:.1} YiB", num)
}
