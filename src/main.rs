use std::path::PathBuf;
use std::sync::Arc;

use endpoint_scout::config::{timeout_from_secs, FileConfig, Settings};
use endpoint_scout::output;
use endpoint_scout::ports::{load_ports_file, parse_port_list};
use endpoint_scout::scanner::TcpConnector;

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use time::UtcOffset;

/// endpoint-scout — sample endpoints from IP ranges and rank the reachable ones by TCP connect latency.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "endpoint-scout",
    version,
    about = "Sample endpoints from IP ranges and rank the reachable ones by TCP connect latency.",
    long_about = None
)]
struct Cli {
    /// TOML config file. Command-line flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated CIDR ranges to sample hosts from.
    #[arg(long, value_delimiter = ',')]
    ranges: Option<Vec<String>>,

    /// Ports to probe on every sampled host, e.g. "2408,500,4500" or "8886-8890".
    #[arg(long, conflicts_with = "ports_file")]
    ports: Option<String>,

    /// File with one port or inclusive range per line.
    #[arg(long = "ports-file")]
    ports_file: Option<PathBuf>,

    /// Hosts sampled from each range.
    #[arg(long = "max-ips-per-range")]
    max_ips_per_range: Option<usize>,

    /// Max concurrent TCP connect attempts.
    #[arg(long = "max-threads")]
    max_threads: Option<usize>,

    /// Per-attempt connect timeout in seconds.
    #[arg(long)]
    timeout: Option<f64>,

    /// Where to write the ranked endpoint list.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also dump every result as pretty JSON to this path.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Number of endpoints to keep in the output file.
    #[arg(long)]
    top: Option<usize>,

    /// Seed for host sampling and shuffling; makes the candidate list reproducible.
    #[arg(long)]
    seed: Option<u64>,

    /// Hide the progress bar.
    #[arg(short, long, default_value_t = false)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut s = Settings::default();
        if let Some(path) = &self.config {
            s = s.merge_file(FileConfig::read(path)?)?;
        }
        if let Some(r) = &self.ranges {
            s.ranges = r.clone();
        }
        if let Some(p) = &self.ports {
            s.ports = parse_port_list(p)?;
        }
        if let Some(path) = &self.ports_file {
            s.ports = load_ports_file(path)?;
        }
        if let Some(n) = self.max_ips_per_range {
            s.max_ips_per_range = n;
        }
        if let Some(n) = self.max_threads {
            s.probe.concurrency = n;
        }
        if let Some(secs) = self.timeout {
            s.probe.timeout = timeout_from_secs(secs)?;
        }
        if let Some(o) = &self.output {
            s.output = o.clone();
        }
        if self.json.is_some() {
            s.json = self.json.clone();
        }
        if let Some(n) = self.top {
            s.top = n;
        }
        if self.seed.is_some() {
            s.seed = self.seed;
        }
        s.validate()?;
        Ok(s)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let offset = output::local_offset();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli, offset))
}

async fn run(cli: Cli, offset: UtcOffset) -> Result<()> {
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let settings = cli.settings()?;

    println!("endpoint-scout configuration:");
    println!("  ranges            : {}", settings.ranges.join(", "));
    println!(
        "  ports             : {}",
        settings
            .ports
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  max_ips_per_range : {}", settings.max_ips_per_range);
    println!("  max_threads       : {}", settings.probe.concurrency);
    println!("  tcp_timeout       : {:?}", settings.probe.timeout);
    println!("  output            : {}", settings.output.display());
    println!(
        "  seed              : {}",
        settings
            .seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| "<random>".to_string())
    );

    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    println!(">>> Generating endpoints and scanning...");
    let outcome =
        endpoint_scout::discover(&settings, Arc::new(TcpConnector), &mut rng, !cli.quiet).await?;

    if let Some(path) = settings.json.as_deref() {
        output::write_json(path, &outcome)?;
        println!("Wrote JSON results to {}", path.display());
    }

    println!(
        "{}",
        output::save_report(&settings.output, &outcome, settings.top, offset)?
    );
    Ok(())
}
