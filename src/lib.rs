//! Library crate for endpoint-scout: sample candidate endpoints from IP ranges,
//! probe them with bounded-concurrency TCP connects and rank the reachable ones.
pub mod config;
pub mod generator;
pub mod output;
pub mod ports;
pub mod ranges;
pub mod scanner;
pub mod types;

use anyhow::Result;
use config::Settings;
use log::{info, warn};
use rand::Rng;
use scanner::Connector;
use std::sync::Arc;
use types::ScanOutcome;

/// Generate candidates from `settings` and probe them through `connector`.
///
/// Malformed ranges are skipped and unreachable endpoints dropped, so an
/// error here means the scan machinery itself broke.
pub async fn discover<C: Connector, R: Rng + ?Sized>(
    settings: &Settings,
    connector: Arc<C>,
    rng: &mut R,
    show_progress: bool,
) -> Result<ScanOutcome> {
    let nets = ranges::parse_ranges(&settings.ranges);
    if nets.is_empty() {
        warn!("none of the {} configured ranges is a valid CIDR", settings.ranges.len());
    }
    let endpoints =
        generator::generate_endpoints(&nets, &settings.ports, settings.max_ips_per_range, rng);
    info!("generated {} endpoints from {} ranges", endpoints.len(), nets.len());

    let pb = scanner::progress_bar(endpoints.len() as u64, show_progress)?;
    let outcome = scanner::scan_with(endpoints, settings.probe, connector, pb).await?;
    info!(
        "{} of {} endpoints reachable",
        outcome.results.len(),
        outcome.scanned_done
    );
    Ok(outcome)
}
