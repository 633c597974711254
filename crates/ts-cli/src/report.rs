use std::time::Duration;

use ts_offload::{Efficiency, OffloadTimings, ValidationReport};
use ts_tile::TileGrid;

/// `s.nnnnnnnnn`, the resolution timings are reported at.
pub fn format_seconds(d: Duration) -> String {
    format!("{}.{:09}", d.as_secs(), d.subsec_nanos())
}

/// Problem and engine-fit lines printed before an offload.
pub fn dgemm_summary(
    seed: u64,
    grid: &TileGrid,
    efficiency: &Efficiency,
    frequency_mhz: u32,
) -> Vec<String> {
    vec![
        format!("Random seed: {}", seed),
        format!(
            "Matrix dimensions: m = {}, n = {}, k = {}",
            grid.m(),
            grid.n(),
            grid.k()
        ),
        format!("Engine tile size: {}", grid.tile()),
        format!(
            "Engine compute dimensions: m = {}, n = {}, k = {}",
            grid.padded_m(),
            grid.padded_n(),
            grid.padded_k()
        ),
        format!("Engine compute efficiency: {:.6}", efficiency.ratio),
        format!("Engine frequency: {} MHz", frequency_mhz),
        format!(
            "Engine predicted compute time: {:.6} s",
            efficiency.predicted_seconds
        ),
    ]
}

pub fn offload_timing(timings: &OffloadTimings) -> String {
    format!(
        "took: {} s (engine time: {} s, host time: {} s)",
        format_seconds(timings.total),
        format_seconds(timings.engine),
        format_seconds(timings.host())
    )
}

pub fn verdict(matched: bool) -> &'static str {
    if matched {
        "CORRECT"
    } else {
        "WRONG"
    }
}

/// Final line of a FIFO validation.
pub fn fifo_verdict(report: &ValidationReport) -> String {
    if report.passed() {
        "Success".to_string()
    } else {
        format!(
            "FAILED! {} mismatching fields in {} records",
            report.mismatch_count, report.records
        )
    }
}
