/// Round to `places` decimal places, resolving ties to the even neighbour.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round_ties_even() / factor
}

/// Render whole seconds as `M:SS`.
pub fn format_clock(elapsed_secs: u64) -> String {
    format!("{}:{:02}", elapsed_secs / 60, elapsed_secs % 60)
}

/// Render a rate with exactly two decimals.
pub fn format_rate(rate: f64) -> String {
    format!("{rate:.2}")
}

/// Render a 0..=1 ratio as a whole percentage.
pub fn format_percent(ratio: f64) -> String {
    format!("{} %", (ratio * 100.0).round() as i64)
}
