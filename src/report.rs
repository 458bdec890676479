use std::fmt::Write;

use unicode_truncate::UnicodeTruncateStr;

use crate::stats::{EndpointSeries, PercentileSnapshot};

const NOT_AVAILABLE: &str = "N/A";

fn to_fixed_width(input: &str, width: usize) -> String {
    let (truncated, _) = input.unicode_truncate(width);
    format!("{:<width$}", truncated, width = width)
}

fn format_ms(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.2}"))
}

/// Renders the quality-of-service table: one row per endpoint with its
/// p50/p90/p99 latency in milliseconds and the share of successful probes.
pub fn render_table(series: &[EndpointSeries], endpoint_width: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {:>10} {:>10} {:>10} {:>8}",
        to_fixed_width("Endpoint", endpoint_width),
        "p50 (ms)",
        "p90 (ms)",
        "p99 (ms)",
        "ok %"
    );

    for s in series {
        let PercentileSnapshot { endpoint, p50, p90, p99 } = s.snapshot();
        let ok = s
            .success_ratio()
            .map_or_else(|| NOT_AVAILABLE.to_string(), |r| format!("{:.1}", r * 100.0));
        let _ = writeln!(
            out,
            "{} {:>10} {:>10} {:>10} {:>8}",
            to_fixed_width(endpoint.as_str(), endpoint_width),
            format_ms(p50),
            format_ms(p90),
            format_ms(p99),
            ok
        );
    }
    out
}
