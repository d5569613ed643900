use ipnet::IpNet;
use log::warn;
use rand::Rng;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Parse CIDR strings into networks, skipping anything malformed.
///
/// A bare address is accepted as a single-host network. Networks written with
/// host bits set (`10.0.0.5/24`) are rejected rather than silently truncated.
pub fn parse_ranges<S: AsRef<str>>(specs: &[S]) -> Vec<IpNet> {
    let mut out = Vec::with_capacity(specs.len());
    for spec in specs {
        match parse_range(spec.as_ref()) {
            Some(net) => out.push(net),
            None => warn!("skipping malformed address range: {:?}", spec.as_ref()),
        }
    }
    out
}

fn parse_range(s: &str) -> Option<IpNet> {
    let s = s.trim();
    if let Ok(net) = s.parse::<IpNet>() {
        return (net.trunc() == net).then_some(net);
    }
    s.parse::<IpAddr>().ok().map(IpNet::from)
}

/// A contiguous run of usable host addresses inside one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSpan {
    first: IpAddr,
    count: u128,
}

/// Usable hosts of a network with the usual subnet semantics.
///
/// IPv4 drops the network and broadcast addresses, IPv6 drops the
/// subnet-router anycast address. Point-to-point (`/31`, `/127`) and
/// single-host (`/32`, `/128`) networks keep every address.
pub fn usable_hosts(net: IpNet) -> HostSpan {
    match net {
        IpNet::V4(n) => {
            let base = u32::from(n.network());
            let last_offset = (1u64 << (32 - n.prefix_len())) - 1;
            let (start, count) = if n.prefix_len() <= 30 {
                (base + 1, u128::from(last_offset) - 1)
            } else {
                (base, u128::from(last_offset) + 1)
            };
            HostSpan {
                first: IpAddr::V4(Ipv4Addr::from(start)),
                count,
            }
        }
        IpNet::V6(n) => {
            let base = u128::from(n.network());
            let last_offset = u128::MAX
                .checked_shr(u32::from(n.prefix_len()))
                .unwrap_or(0);
            let (start, count) = if n.prefix_len() <= 126 {
                (base + 1, last_offset)
            } else {
                (base, last_offset + 1)
            };
            HostSpan {
                first: IpAddr::V6(Ipv6Addr::from(start)),
                count,
            }
        }
    }
}

impl HostSpan {
    pub fn len(&self) -> u128 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The `i`-th usable host. `i` must be below `len()`.
    pub fn nth(&self, i: u128) -> IpAddr {
        match self.first {
            IpAddr::V4(a) => IpAddr::V4(Ipv4Addr::from(u32::from(a) + i as u32)),
            IpAddr::V6(a) => IpAddr::V6(Ipv6Addr::from(u128::from(a) + i)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = IpAddr> + '_ {
        (0..self.count).map(move |i| self.nth(i))
    }

    /// Uniformly sample `min(k, len)` distinct hosts without replacement.
    ///
    /// Hosts are picked by index, so large IPv6 networks are never expanded.
    pub fn sample<R: Rng + ?Sized>(&self, k: usize, rng: &mut R) -> Vec<IpAddr> {
        if k as u128 >= self.count {
            return self.iter().collect();
        }
        match usize::try_from(self.count) {
            Ok(len) => rand::seq::index::sample(rng, len, k)
                .into_iter()
                .map(|i| self.nth(i as u128))
                .collect(),
            Err(_) => {
                let mut seen = HashSet::with_capacity(k);
                let mut out = Vec::with_capacity(k);
                while out.len() < k {
                    let i = rng.random_range(0..self.count);
                    if seen.insert(i) {
                        out.push(self.nth(i));
                    }
                }
                out
            }
        }
    }
}
