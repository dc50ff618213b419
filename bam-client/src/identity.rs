//! Hierarchical identity recovery: the server does not accept compound
//! FQDNs in every context, so resolving a zone by its absolute name tries
//! an absolute-name match, then a bare-name match, then a reversed
//! label-walk from the TLD downward through `sub_zones`.

/// The ordered label segments of an absolute name, from TLD to leaf, e.g.
/// `www.example.com` -> `["com", "example", "www"]`.
pub fn reversed_labels(absolute_name: &str) -> Vec<&str> {
    absolute_name.trim_end_matches('.').rsplit('.').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverses_labels_from_tld_down() {
        assert_eq!(reversed_labels("www.example.com"), vec!["com", "example", "www"]);
    }

    #[test]
    fn strips_trailing_dot() {
        assert_eq!(reversed_labels("example.com."), vec!["com", "example"]);
    }

    #[test]
    fn single_label_has_no_parent_walk() {
        assert_eq!(reversed_labels("localhost"), vec!["localhost"]);
    }
}
