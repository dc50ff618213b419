//! The remote collection and identity fields each `object_type` is looked
//! up by, generalizing `CSV_TO_BAM_TYPE_MAP`/`RESOLVER_TYPE_MAP`: a row's
//! payload already carries the identifying field(s) under its own
//! snake_case name, so the planner reads them back out of
//! [`bam_model::Row::payload_json`] rather than re-deriving them per kind.

use bam_model::ObjectType;

/// One identity component: the payload's JSON field name, and the remote
/// API's field name for the same value (most are identical; a few, like
/// the CIDR-bearing kinds, differ).
pub struct IdentityField {
    pub payload_field: &'static str,
    pub remote_field: &'static str,
}

pub struct TypeMapping {
    pub collection: &'static str,
    pub identity: &'static [IdentityField],
}

const fn id(field: &'static str) -> IdentityField {
    IdentityField { payload_field: field, remote_field: field }
}

const fn renamed(payload_field: &'static str, remote_field: &'static str) -> IdentityField {
    IdentityField { payload_field, remote_field }
}

/// A cross-row parent reference carried in a payload field, resolved
/// through the path resolver (C4) rather than queried directly (C3):
/// `payload_field` holds the human-readable identity, `referenced_type`
/// names what it should resolve to.
pub struct ReferenceField {
    pub payload_field: &'static str,
    pub referenced_type: ObjectType,
}

/// The `kind` a resolved/deferred reference is recorded under, matching
/// [`bam_model::DeferredReference`]'s `_deferred_<kind>` / `<kind>_id`
/// convention: the field name with a `parent_` prefix stripped.
pub fn reference_kind(payload_field: &str) -> &str {
    payload_field.strip_prefix("parent_").unwrap_or(payload_field)
}

pub fn reference_fields(object_type: ObjectType) -> &'static [ReferenceField] {
    use ObjectType::*;
    match object_type {
        Ip4Network => &[ReferenceField { payload_field: "parent_block_cidr", referenced_type: Ip4Block }],
        Ip6Network => &[ReferenceField { payload_field: "parent_block_cidr", referenced_type: Ip6Block }],
        Ip4Address => &[ReferenceField { payload_field: "parent_network_cidr", referenced_type: Ip4Network }],
        Ip6Address => &[ReferenceField { payload_field: "parent_network_cidr", referenced_type: Ip6Network }],
        Ipv4DhcpRange => &[ReferenceField { payload_field: "parent_network_cidr", referenced_type: Ip4Network }],
        Ipv6DhcpRange => &[ReferenceField { payload_field: "parent_network_cidr", referenced_type: Ip6Network }],
        DeviceSubtype => &[ReferenceField { payload_field: "parent_device_type", referenced_type: DeviceType }],
        Device => &[
            ReferenceField { payload_field: "device_type", referenced_type: DeviceType },
            ReferenceField { payload_field: "device_subtype", referenced_type: DeviceSubtype },
        ],
        MacAddress => &[ReferenceField { payload_field: "parent_pool", referenced_type: MacPool }],
        Tag => &[ReferenceField { payload_field: "parent_tag_group", referenced_type: TagGroup }],
        Location => &[ReferenceField { payload_field: "parent_location", referenced_type: Location }],
        _ => &[],
    }
}

pub fn type_mapping(object_type: ObjectType) -> TypeMapping {
    use ObjectType::*;
    match object_type {
        Configuration => TypeMapping { collection: "configurations", identity: &[id("name")] },
        View => TypeMapping { collection: "views", identity: &[id("name")] },
        Ip4Block | Ip6Block => TypeMapping { collection: "blocks", identity: &[renamed("cidr", "range")] },
        Ip4Network | Ip6Network => TypeMapping { collection: "networks", identity: &[renamed("cidr", "range")] },
        Ip4Group => TypeMapping { collection: "blocks", identity: &[renamed("cidr", "range")] },
        Ip4Address | Ip6Address => TypeMapping { collection: "addresses", identity: &[id("address")] },
        Ipv4DhcpRange | Ipv6DhcpRange => {
            TypeMapping { collection: "dhcp_ranges", identity: &[renamed("start_address", "start")] }
        }
        DhcpDeploymentRole | DnsDeploymentRole => {
            TypeMapping { collection: "deployment_roles", identity: &[id("server_interface"), id("role")] }
        }
        Dhcpv4ClientDeploymentOption | Dhcpv4ServiceDeploymentOption => {
            TypeMapping { collection: "deployment_options", identity: &[id("option_code"), id("server_scope")] }
        }
        DnsZone => TypeMapping { collection: "zones", identity: &[renamed("absolute_name", "absoluteName")] },
        HostRecord | AliasRecord | MxRecord | TxtRecord | SrvRecord | ExternalHostRecord | GenericRecord => {
            TypeMapping { collection: "resource_records", identity: &[renamed("absolute_name", "absoluteName")] }
        }
        Location => TypeMapping { collection: "locations", identity: &[id("name")] },
        UdfDefinition => TypeMapping { collection: "udf_definitions", identity: &[id("name")] },
        UdlDefinition => TypeMapping { collection: "udl_definitions", identity: &[id("name")] },
        UserDefinedLink => TypeMapping { collection: "user_defined_links", identity: &[id("link_name")] },
        MacPool => TypeMapping { collection: "mac_pools", identity: &[id("name")] },
        MacAddress => TypeMapping { collection: "mac_addresses", identity: &[id("mac_address")] },
        TagGroup => TypeMapping { collection: "tag_groups", identity: &[id("name")] },
        Tag => TypeMapping { collection: "tags", identity: &[id("name"), id("parent_tag_group")] },
        ResourceTag => TypeMapping { collection: "resource_tags", identity: &[id("tag"), id("resource")] },
        DeviceType => TypeMapping { collection: "device_types", identity: &[id("name")] },
        DeviceSubtype => TypeMapping { collection: "device_subtypes", identity: &[id("name")] },
        Device => TypeMapping { collection: "devices", identity: &[id("name")] },
        DeviceAddress => TypeMapping { collection: "device_addresses", identity: &[id("device"), id("address")] },
        Acl => TypeMapping { collection: "acls", identity: &[id("name")] },
        AccessRight => {
            TypeMapping { collection: "access_rights", identity: &[id("user_or_group"), id("resource")] }
        }
    }
}
