//! Candidate endpoint generation.
//!
//! Each range contributes at most `max_per_range` hosts, each crossed with
//! every port. The union is deduplicated and then shuffled so that probing
//! order carries no bias from range or address order.
use crate::ranges::usable_hosts;
use crate::types::Endpoint;
use ipnet::IpNet;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

/// Sample hosts from every range, cross them with `ports` and shuffle.
///
/// Output is a pure function of the inputs and `rng`: a seeded `rng` yields
/// the same sequence every time.
pub fn generate_endpoints<R: Rng + ?Sized>(
    ranges: &[IpNet],
    ports: &[u16],
    max_per_range: usize,
    rng: &mut R,
) -> Vec<Endpoint> {
    let mut set = BTreeSet::new();
    for &net in ranges {
        let span = usable_hosts(net);
        if span.is_empty() {
            debug!("{net}: no usable hosts, skipped");
            continue;
        }
        let hosts = span.sample(max_per_range, rng);
        debug!("{net}: sampled {} of {} hosts", hosts.len(), span.len());
        for ip in hosts {
            for &port in ports {
                set.insert(Endpoint::new(ip, port));
            }
        }
    }

    let mut endpoints: Vec<Endpoint> = set.into_iter().collect();
    endpoints.shuffle(rng);
    endpoints
}
