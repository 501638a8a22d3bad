//! human-readable byte sizes.

use humansize::{DECIMAL, FormatSizeOptions};

/// formats a byte count with decimal units and one decimal place, e.g. `204.8 kB`.
///
/// negative counts are shown as zero.
pub fn bytes(n: f64) -> String {
    let options = FormatSizeOptions::from(DECIMAL).decimal_places(1);
    humansize::format_size(n.max(0.0) as u64, options)
}
