//! Human-readable bit rates.

const UNITS: [&str; 5] = ["bps", "Kbps", "Mbps", "Gbps", "Tbps"];

/// Format `bps` with a decimal unit prefix.
///
/// Two decimals below 10, one below 100, none above. Zero (and NaN) is
/// rendered as a bare `0` when `compact` is set.
pub fn format_bitrate(bps: f64, compact: bool) -> String {
    if bps.is_nan() || bps == 0.0 {
        return if compact { "0".to_string() } else { "0 bps".to_string() };
    }

    let mut value = bps;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    let decimals = if value < 10.0 {
        2
    } else if value < 100.0 {
        1
    } else {
        0
    };
    format!("{value:.decimals$} {}", UNITS[unit])
}
