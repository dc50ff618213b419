//! Static CIDR-containment dependency edges: a block/network row depends
//! on whichever other row in the same batch is its most specific
//! containing block, computed purely from the parsed CIDRs with no
//! network call. Named explicitly in the dependency-edge design ("a row
//! creating a block is a dependency of a row creating any network inside
//! it, transitively") as distinct from the reference-field mechanism used
//! for an explicit `parent_block_cidr` column.

use bam_model::{ObjectType, Row};
use cidr::{Cidr, IpCidr};

fn cidr_of(row: &Row) -> Option<IpCidr> {
    match row.object_type() {
        ObjectType::Ip4Block | ObjectType::Ip6Block | ObjectType::Ip4Network | ObjectType::Ip6Network => {
            row.payload_json().get("cidr")?.as_str()?.parse().ok()
        }
        _ => None,
    }
}

/// The row_id of `row`'s most specific containing block/network among
/// `all_rows`, if any. "Most specific" = the candidate with the longest
/// prefix that still properly contains `row`'s CIDR.
pub fn containing_row_id(row: &Row, all_rows: &[Row]) -> Option<String> {
    let child = cidr_of(row)?;
    all_rows
        .iter()
        .filter(|other| other.row_id() != row.row_id())
        .filter_map(|other| cidr_of(other).map(|parent| (other, parent)))
        .filter(|(_, parent)| parent.network_length() < child.network_length())
        .filter(|(_, parent)| parent.contains(&child.first_address()))
        .max_by_key(|(_, parent)| parent.network_length())
        .map(|(other, _)| other.row_id().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bam_model::{RowEnvelope, RowAction, RowFields};
    use std::collections::BTreeMap;

    fn row(row_id: &str, object_type: ObjectType, cidr: &str) -> Row {
        let envelope = RowEnvelope::new(row_id, RowAction::Create);
        let fields = RowFields::new(
            [("cidr".to_string(), cidr.to_string())].into_iter().collect::<BTreeMap<_, _>>(),
        );
        Row::parse(envelope, object_type, &fields).0
    }

    #[test]
    fn network_depends_on_its_containing_block() {
        let block = row("r1", ObjectType::Ip4Block, "10.0.0.0/8");
        let network = row("r2", ObjectType::Ip4Network, "10.0.1.0/24");
        let rows = vec![block, network.clone()];
        assert_eq!(containing_row_id(&network, &rows), Some("r1".to_string()));
    }

    #[test]
    fn picks_the_most_specific_nested_block() {
        let outer = row("r1", ObjectType::Ip4Block, "10.0.0.0/8");
        let inner = row("r2", ObjectType::Ip4Block, "10.0.1.0/24");
        let network = row("r3", ObjectType::Ip4Network, "10.0.1.128/28");
        let rows = vec![outer, inner, network.clone()];
        assert_eq!(containing_row_id(&network, &rows), Some("r2".to_string()));
    }

    #[test]
    fn unrelated_rows_produce_no_dependency() {
        let block = row("r1", ObjectType::Ip4Block, "192.168.0.0/16");
        let network = row("r2", ObjectType::Ip4Network, "10.0.1.0/24");
        let rows = vec![block, network.clone()];
        assert_eq!(containing_row_id(&network, &rows), None);
    }
}
