use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// A candidate `host:port` pair in its canonical string form.
///
/// IPv4 hosts render as `1.2.3.4:80`, IPv6 hosts as `[2001:db8::1]:80`.
/// Ordering is plain string ordering, which is what result tie-breaks use.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self(SocketAddr::new(ip, port).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into host and port. Returns `None` for strings that are not `host:port`.
    ///
    /// The host part is not required to be an IP literal; name resolution
    /// happens at connect time.
    pub fn target(&self) -> Option<(String, u16)> {
        if let Ok(sa) = self.0.parse::<SocketAddr>() {
            return Some((sa.ip().to_string(), sa.port()));
        }
        let (host, port) = self.0.rsplit_once(':')?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return None;
        }
        let port = port.parse::<u16>().ok()?;
        Some((host.to_string(), port))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Endpoint {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Endpoint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One endpoint that completed a TCP handshake within the timeout.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub endpoint: Endpoint,
    pub latency_ms: f64,
}

impl ProbeResult {
    /// Ascending latency, then endpoint string.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.latency_ms
            .total_cmp(&other.latency_ms)
            .then_with(|| self.endpoint.cmp(&other.endpoint))
    }
}

/// Ranked results of one scan plus the progress counters.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ScanOutcome {
    pub scanned_total: u64,
    pub scanned_done: u64,
    pub results: Vec<ProbeResult>,
}

impl ScanOutcome {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The fastest `n` results (fewer if the scan found fewer).
    pub fn top(&self, n: usize) -> &[ProbeResult] {
        &self.results[..n.min(self.results.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn canonical_forms() {
        let v4 = Endpoint::new(IpAddr::V4(Ipv4Addr::new(162, 159, 192, 7)), 2408);
        assert_eq!(v4.as_str(), "162.159.192.7:2408");
        let v6 = Endpoint::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 443);
        assert_eq!(v6.as_str(), "[::1]:443");
    }

    #[test]
    fn target_parses_hosts_and_rejects_junk() {
        assert_eq!(
            Endpoint::from("10.0.0.1:80").target(),
            Some(("10.0.0.1".to_string(), 80))
        );
        assert_eq!(
            Endpoint::from("[::1]:8443").target(),
            Some(("::1".to_string(), 8443))
        );
        assert_eq!(
            Endpoint::from("example.test:500").target(),
            Some(("example.test".to_string(), 500))
        );
        assert_eq!(Endpoint::from("10.0.0.1").target(), None);
        assert_eq!(Endpoint::from("10.0.0.1:99999").target(), None);
        assert_eq!(Endpoint::from(":80").target(), None);
        assert_eq!(Endpoint::from("10.0.0.1:http").target(), None);
    }

    #[test]
    fn rank_breaks_ties_by_endpoint() {
        let a = ProbeResult { endpoint: "10.0.0.2:80".into(), latency_ms: 5.0 };
        let b = ProbeResult { endpoint: "10.0.0.1:80".into(), latency_ms: 5.0 };
        let c = ProbeResult { endpoint: "10.0.0.0:80".into(), latency_ms: 7.5 };
        let mut v = vec![c.clone(), a.clone(), b.clone()];
        v.sort_by(ProbeResult::rank_cmp);
        assert_eq!(v, vec![b, a, c]);
    }

    #[test]
    fn top_clamps_to_len() {
        let outcome = ScanOutcome {
            scanned_total: 3,
            scanned_done: 3,
            results: vec![ProbeResult { endpoint: "1.1.1.1:1".into(), latency_ms: 1.0 }],
        };
        assert_eq!(outcome.top(20).len(), 1);
        assert_eq!(outcome.top(0).len(), 0);
    }
}
