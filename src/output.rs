use crate::types::{ProbeResult, ScanOutcome};
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs::{self, File};
use std::path::Path;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

pub const DEFAULT_TOP: usize = 20;

/// Console notice for a scan that found nothing reachable.
pub const NO_RESULTS: &str = "No valid endpoints found.";

const HEADER_TIME: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Render the ranked list: a timestamped header, then `"<endpoint>, <ms> ms"` per line.
///
/// A UTC timestamp is marked as such; any other offset is the local zone.
pub fn render_report(results: &[ProbeResult], top: usize, generated_at: OffsetDateTime) -> Result<String> {
    let stamp = generated_at.format(HEADER_TIME)?;
    let zone = if generated_at.offset().is_utc() { " UTC" } else { "" };
    let mut out = String::new();
    writeln!(out, "# Top {top} Endpoints - {stamp}{zone}")?;
    for r in results.iter().take(top) {
        writeln!(out, "{}, {:.2} ms", r.endpoint, r.latency_ms)?;
    }
    Ok(out)
}

/// Write the fastest `top` endpoints to `path`.
///
/// Returns `Ok(false)` without touching the filesystem when the scan found
/// nothing, so an empty run never leaves a header-only file behind.
/// The header is stamped with the current time shifted to `offset`.
pub fn write_report(path: &Path, outcome: &ScanOutcome, top: usize, offset: UtcOffset) -> Result<bool> {
    if outcome.is_empty() {
        return Ok(false);
    }
    let now = OffsetDateTime::now_utc().to_offset(offset);
    let body = render_report(outcome.top(top), top, now)?;
    fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

/// Write the report and return the line to show on the console:
/// where the list went, or [`NO_RESULTS`] when nothing was written.
pub fn save_report(path: &Path, outcome: &ScanOutcome, top: usize, offset: UtcOffset) -> Result<String> {
    if !write_report(path, outcome, top, offset)? {
        return Ok(NO_RESULTS.to_string());
    }
    Ok(format!(
        ">>> Top {} endpoints saved to {}",
        outcome.top(top).len(),
        path.display()
    ))
}

/// Dump the whole outcome, counters included, as pretty JSON.
pub fn write_json(path: &Path, outcome: &ScanOutcome) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, outcome)?;
    Ok(())
}

/// The local UTC offset, or UTC when it cannot be determined.
///
/// Call this before any other thread is started: on some platforms the
/// offset is only readable while the process is single-threaded.
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}
