use crate::output::DEFAULT_TOP;
use crate::ports::DEFAULT_PORTS;
use crate::scanner::ProbeOptions;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Ranges scanned when neither a config file nor the command line names any.
pub const DEFAULT_RANGES: &[&str] = &[
    "162.159.192.0/24",
    "162.159.193.0/24",
    "162.159.195.0/24",
    "162.159.204.0/24",
    "188.114.96.0/24",
    "188.114.97.0/24",
    "188.114.98.0/24",
    "188.114.99.0/24",
];
pub const DEFAULT_MAX_IPS_PER_RANGE: usize = 25;
pub const DEFAULT_OUTPUT: &str = "endpoints.txt";

/// On-disk configuration. Every key is optional and falls back to the defaults.
///
/// ```toml
/// ranges = ["162.159.192.0/24", "188.114.96.0/24"]
/// ports = [2408, 500, 4500]
/// max_ips_per_range = 25
/// max_threads = 200
/// tcp_timeout = 1.5   # seconds
/// output = "endpoints.txt"
/// top = 20
/// seed = 7
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub ranges: Option<Vec<String>>,
    pub ports: Option<Vec<u16>>,
    pub max_ips_per_range: Option<usize>,
    pub max_threads: Option<usize>,
    pub tcp_timeout: Option<f64>,
    pub output: Option<PathBuf>,
    pub top: Option<usize>,
    pub seed: Option<u64>,
}

impl FileConfig {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config file: {}", path.display()))
    }
}

/// Fully resolved run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub ranges: Vec<String>,
    pub ports: Vec<u16>,
    pub max_ips_per_range: usize,
    pub probe: ProbeOptions,
    pub output: PathBuf,
    pub json: Option<PathBuf>,
    pub top: usize,
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ranges: DEFAULT_RANGES.iter().map(|s| s.to_string()).collect(),
            ports: DEFAULT_PORTS.to_vec(),
            max_ips_per_range: DEFAULT_MAX_IPS_PER_RANGE,
            probe: ProbeOptions::default(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            json: None,
            top: DEFAULT_TOP,
            seed: None,
        }
    }
}

impl Settings {
    /// Layer a config file over these settings.
    pub fn merge_file(mut self, file: FileConfig) -> Result<Self> {
        if let Some(r) = file.ranges {
            self.ranges = r;
        }
        if let Some(p) = file.ports {
            if p.contains(&0) {
                bail!("port 0 is not a valid TCP port");
            }
            self.ports = p;
        }
        if let Some(n) = file.max_ips_per_range {
            self.max_ips_per_range = n;
        }
        if let Some(n) = file.max_threads {
            self.probe.concurrency = n;
        }
        if let Some(secs) = file.tcp_timeout {
            self.probe.timeout = timeout_from_secs(secs)?;
        }
        if let Some(o) = file.output {
            self.output = o;
        }
        if let Some(n) = file.top {
            self.top = n;
        }
        if file.seed.is_some() {
            self.seed = file.seed;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ports.is_empty() {
            bail!("no ports configured");
        }
        if self.probe.concurrency == 0 {
            bail!("max_threads must be at least 1");
        }
        if self.probe.timeout.is_zero() {
            bail!("tcp_timeout must be positive");
        }
        if self.top == 0 {
            bail!("top must be at least 1");
        }
        Ok(())
    }
}

pub fn timeout_from_secs(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).with_context(|| format!("invalid tcp_timeout: {secs}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_constants() {
        let s = Settings::default();
        assert_eq!(s.ranges.len(), 8);
        assert_eq!(s.ports, vec![2408, 1701, 500, 4500, 8886, 908]);
        assert_eq!(s.max_ips_per_range, 25);
        assert_eq!(s.probe.concurrency, 200);
        assert_eq!(s.probe.timeout, Duration::from_millis(1500));
        assert_eq!(s.output, PathBuf::from("endpoints.txt"));
        assert_eq!(s.top, 20);
        s.validate().unwrap();
    }

    #[test]
    fn file_overrides_only_named_keys() {
        let file = FileConfig::parse(
            r#"
            ranges = ["10.0.0.0/30"]
            tcp_timeout = 0.25
            seed = 11
            "#,
        )
        .unwrap();
        let s = Settings::default().merge_file(file).unwrap();
        assert_eq!(s.ranges, vec!["10.0.0.0/30".to_string()]);
        assert_eq!(s.probe.timeout, Duration::from_millis(250));
        assert_eq!(s.seed, Some(11));
        assert_eq!(s.ports.len(), 6);
        assert_eq!(s.probe.concurrency, 200);
    }

    #[test]
    fn unknown_keys_and_bad_values_rejected() {
        assert!(FileConfig::parse("threads = 5").is_err());
        let neg = FileConfig::parse("tcp_timeout = -1.0").unwrap();
        assert!(Settings::default().merge_file(neg).is_err());
        let zero_port = FileConfig::parse("ports = [0, 80]").unwrap();
        assert!(Settings::default().merge_file(zero_port).is_err());
    }

    #[test]
    fn validate_catches_empty_ports_and_zero_threads() {
        let mut s = Settings::default();
        s.ports.clear();
        assert!(s.validate().is_err());
        let mut s = Settings::default();
        s.probe.concurrency = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn zero_top_is_rejected() {
        let file = FileConfig::parse("top = 0").unwrap();
        let s = Settings::default().merge_file(file).unwrap();
        assert!(s.validate().is_err());
    }
}
