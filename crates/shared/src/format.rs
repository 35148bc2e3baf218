//! Human-readable formatting for usage figures.

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;

/// Formats a byte count using binary units (1 KB = 1024 B).
///
/// Each step divides by 1024 with truncation, so `1536` renders as `1 KB`.
/// The integral part uses thousands separators: `1023` renders as `1,023 B`.
pub fn format_bytes(bytes: u64) -> String {
    let mut remaining = bytes;
    let mut unit_index = 0;

    while remaining >= 1024 && unit_index < BYTE_UNITS.len() - 1 {
        remaining /= 1024;
        unit_index += 1;
    }

    format!("{} {}", group_thousands(remaining), BYTE_UNITS[unit_index])
}

/// Formats a duration in milliseconds as `"H h M m S s"`.
///
/// Hours are not wrapped into days; sub-second remainders are dropped.
pub fn format_duration_breakdown(millis: u64) -> String {
    let hours = millis / MILLIS_PER_HOUR;
    let minutes = (millis % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE;
    let seconds = (millis % MILLIS_PER_MINUTE) / MILLIS_PER_SECOND;

    format!("{} h {} m {} s", hours, minutes, seconds)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}
