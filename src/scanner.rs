use crate::types::{Endpoint, ProbeResult, ScanOutcome};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, warn};
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{self, Instant};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1500);
pub const DEFAULT_CONCURRENCY: usize = 200;

/// Opens one TCP connection and reports how long the handshake took.
///
/// Implementations must release the socket before returning. The caller
/// bounds the call with its own timeout.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, host: String, port: u16) -> impl Future<Output = io::Result<Duration>> + Send;
}

/// The real network: `tokio::net::TcpStream`, closed right after the handshake.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    async fn connect(&self, host: String, port: u16) -> io::Result<Duration> {
        let start = Instant::now();
        let stream = TcpStream::connect((host.as_str(), port)).await?;
        let elapsed = start.elapsed();
        drop(stream);
        Ok(elapsed)
    }
}

/// Why a single probe produced no result. Callers only drop the endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ProbeFailure {
    #[error("malformed endpoint {0}")]
    Malformed(Endpoint),
    #[error("no handshake within {0:?}")]
    TimedOut(Duration),
    #[error("connect failed: {0}")]
    Connect(#[from] io::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct ProbeOptions {
    /// Per-attempt connect timeout.
    pub timeout: Duration,
    /// Maximum number of attempts in flight at once.
    pub concurrency: usize,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Probe one endpoint. Every failure class is reported the same way: `Err`.
pub async fn probe_endpoint<C: Connector>(
    connector: &C,
    endpoint: &Endpoint,
    timeout: Duration,
) -> Result<ProbeResult, ProbeFailure> {
    let (host, port) = endpoint
        .target()
        .ok_or_else(|| ProbeFailure::Malformed(endpoint.clone()))?;
    let latency = time::timeout(timeout, connector.connect(host, port))
        .await
        .map_err(|_| ProbeFailure::TimedOut(timeout))??;
    Ok(ProbeResult {
        endpoint: endpoint.clone(),
        latency_ms: latency.as_nanos() as f64 / 1_000_000.0,
    })
}

/// Progress bar for a scan of `total` endpoints; hidden when `visible` is false.
pub fn progress_bar(total: u64, visible: bool) -> Result<ProgressBar> {
    if !visible {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::with_template("Scanning {pos}/{len} [{bar:40.cyan/blue}] {elapsed_precise}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Probe every endpoint over real TCP with no progress output.
pub async fn scan(endpoints: Vec<Endpoint>, opts: ProbeOptions) -> Result<ScanOutcome> {
    scan_with(endpoints, opts, Arc::new(TcpConnector), ProgressBar::hidden()).await
}

/// Probe every endpoint exactly once with at most `opts.concurrency` attempts in flight.
///
/// - A `Semaphore` permit is taken before a task is spawned and held until its
///   attempt finishes, timed out or not.
/// - Each task sends one completion message to a single aggregator, which owns
///   the result list and the completed counter and advances `progress`.
/// - Unreachable endpoints simply produce no result.
///
/// Results come back ascending by latency, ties ordered by endpoint string.
pub async fn scan_with<C: Connector>(
    endpoints: Vec<Endpoint>,
    opts: ProbeOptions,
    connector: Arc<C>,
    progress: ProgressBar,
) -> Result<ScanOutcome> {
    let total = endpoints.len() as u64;
    let sem = Arc::new(Semaphore::new(opts.concurrency.max(1)));
    let (tx, mut rx) = mpsc::unbounded_channel::<Option<ProbeResult>>();

    let pb = progress.clone();
    let aggregator = tokio::spawn(async move {
        let mut done = 0u64;
        let mut results = Vec::new();
        while let Some(msg) = rx.recv().await {
            done += 1;
            pb.inc(1);
            if let Some(r) = msg {
                results.push(r);
            }
        }
        (done, results)
    });

    let mut set = JoinSet::new();
    for endpoint in endpoints {
        let permit = sem.clone().acquire_owned().await?;
        let connector = connector.clone();
        let worker_tx = tx.clone();
        let timeout = opts.timeout;
        set.spawn(async move {
            let res = probe_endpoint(connector.as_ref(), &endpoint, timeout).await.ok();
            drop(permit);
            let _ = worker_tx.send(res);
        });
        while let Some(joined) = set.try_join_next() {
            reap(joined, &tx);
        }
    }
    while let Some(joined) = set.join_next().await {
        reap(joined, &tx);
    }
    drop(tx);

    let (done, mut results) = aggregator.await?;
    progress.finish_and_clear();
    results.sort_by(ProbeResult::rank_cmp);
    debug!("scan finished: {} reachable of {done} probed", results.len());

    Ok(ScanOutcome {
        scanned_total: total,
        scanned_done: done,
        results,
    })
}

// A worker that panicked never sent its completion; count it here instead.
fn reap(joined: Result<(), JoinError>, tx: &mpsc::UnboundedSender<Option<ProbeResult>>) {
    if let Err(e) = joined {
        warn!("probe task aborted: {e}");
        let _ = tx.send(None);
    }
}
