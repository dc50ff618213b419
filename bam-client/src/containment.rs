//! Longest-prefix containment: the server's `range:contains(addr)` filter
//! narrows the candidate set, then this computes the longest-prefix match
//! client-side using standard CIDR arithmetic. O(N) in the candidate set,
//! where N is typically bounded by tree depth.

use cidr::{Ipv4Cidr, Ipv6Cidr};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// A candidate block/network: its remote id and parsed CIDR.
#[derive(Debug, Clone)]
pub struct CidrCandidate {
    pub resource_id: i64,
    pub cidr: String,
}

/// Picks the candidate with the longest prefix (most specific network)
/// that contains `address`, or `None` if none do.
pub fn longest_prefix_match(candidates: &[CidrCandidate], address: IpAddr) -> Option<i64> {
    candidates
        .iter()
        .filter_map(|candidate| contains(&candidate.cidr, address).map(|prefix| (prefix, candidate.resource_id)))
        .max_by_key(|(prefix, _)| *prefix)
        .map(|(_, resource_id)| resource_id)
}

fn contains(cidr: &str, address: IpAddr) -> Option<u8> {
    match address {
        IpAddr::V4(addr) => {
            let network: Ipv4Cidr = cidr.parse().ok()?;
            contains_v4(network, addr).then_some(network.network_length())
        }
        IpAddr::V6(addr) => {
            let network: Ipv6Cidr = cidr.parse().ok()?;
            contains_v6(network, addr).then_some(network.network_length())
        }
    }
}

fn contains_v4(network: Ipv4Cidr, address: Ipv4Addr) -> bool {
    network.contains(&address)
}

fn contains_v6(network: Ipv6Cidr, address: Ipv6Addr) -> bool {
    network.contains(&address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_most_specific_containing_network() {
        let candidates = vec![
            CidrCandidate { resource_id: 1, cidr: "10.0.0.0/8".to_string() },
            CidrCandidate { resource_id: 2, cidr: "10.0.1.0/24".to_string() },
            CidrCandidate { resource_id: 3, cidr: "192.168.0.0/16".to_string() },
        ];
        let address: IpAddr = "10.0.1.5".parse().unwrap();
        assert_eq!(longest_prefix_match(&candidates, address), Some(2));
    }

    #[test]
    fn returns_none_when_nothing_contains_the_address() {
        let candidates = vec![CidrCandidate { resource_id: 1, cidr: "10.0.0.0/8".to_string() }];
        let address: IpAddr = "192.168.1.1".parse().unwrap();
        assert_eq!(longest_prefix_match(&candidates, address), None);
    }

    #[test]
    fn works_for_ipv6_candidates() {
        let candidates = vec![
            CidrCandidate { resource_id: 1, cidr: "2001:db8::/32".to_string() },
            CidrCandidate { resource_id: 2, cidr: "2001:db8:1::/48".to_string() },
        ];
        let address: IpAddr = "2001:db8:1::5".parse().unwrap();
        assert_eq!(longest_prefix_match(&candidates, address), Some(2));
    }
}
