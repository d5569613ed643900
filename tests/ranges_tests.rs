use endpoint_scout::generator::generate_endpoints;
use endpoint_scout::ranges::{parse_ranges, usable_hosts};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};

#[test]
fn slash_30_has_two_usable_hosts() {
    let nets = parse_ranges(&["10.0.0.0/30"]);
    let hosts: Vec<IpAddr> = usable_hosts(nets[0]).iter().collect();
    assert_eq!(
        hosts,
        vec![
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
        ]
    );
}

#[test]
fn per_range_cap_and_global_uniqueness() {
    let nets = parse_ranges(&[
        "162.159.192.0/24",
        "162.159.192.0/25",
        "188.114.96.0/24",
        "10.9.9.0/29",
        "garbage/99",
    ]);
    assert_eq!(nets.len(), 4);
    let ports = [2408, 1701, 500, 4500, 8886, 908];
    let mut rng = StdRng::seed_from_u64(2024);
    let eps = generate_endpoints(&nets, &ports, 25, &mut rng);

    let uniq: HashSet<_> = eps.iter().collect();
    assert_eq!(uniq.len(), eps.len());
    assert!(eps.len() <= nets.len() * 25 * ports.len());

    for net in &nets {
        let in_net = eps
            .iter()
            .filter(|e| {
                let (host, _) = e.target().unwrap();
                net.contains(&host.parse::<IpAddr>().unwrap())
            })
            .count();
        let hosts = usable_hosts(*net).len().min(25) as usize;
        // overlapping ranges can only add hosts on top of their own sample
        assert!(in_net >= hosts * ports.len());
    }
}

#[test]
fn small_range_is_taken_whole() {
    let nets = parse_ranges(&["10.9.9.0/29"]);
    let mut rng = StdRng::seed_from_u64(5);
    let eps = generate_endpoints(&nets, &[80], 25, &mut rng);
    let mut got: Vec<String> = eps.iter().map(ToString::to_string).collect();
    got.sort();
    let want: Vec<String> = (1..=6).map(|i| format!("10.9.9.{i}:80")).collect();
    assert_eq!(got, want);
}

#[test]
fn seeded_runs_agree() {
    let nets = parse_ranges(&["188.114.96.0/24", "188.114.97.0/24"]);
    let a = generate_endpoints(&nets, &[2408, 500], 25, &mut StdRng::seed_from_u64(77));
    let b = generate_endpoints(&nets, &[2408, 500], 25, &mut StdRng::seed_from_u64(77));
    assert_eq!(a, b);
}
