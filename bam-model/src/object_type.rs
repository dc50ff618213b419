//! The closed vocabulary of `object_type` values a row may carry, and the
//! lookup tables the resolver, handlers, and safety gate need to translate
//! between the CSV's snake_case names and the remote API's PascalCase type
//! discriminators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A resource kind the pipeline knows how to plan and execute an operation
/// for. New kinds are added here, to the handler registry (`bam-executor`),
/// and nowhere else (see the strategy-table design note).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Configuration,
    View,
    Ip4Block,
    Ip4Group,
    Ip4Network,
    Ip4Address,
    Ip6Block,
    Ip6Network,
    Ip6Address,
    Ipv4DhcpRange,
    Ipv6DhcpRange,
    DhcpDeploymentRole,
    DnsDeploymentRole,
    Dhcpv4ClientDeploymentOption,
    Dhcpv4ServiceDeploymentOption,
    DnsZone,
    HostRecord,
    AliasRecord,
    MxRecord,
    TxtRecord,
    SrvRecord,
    ExternalHostRecord,
    GenericRecord,
    Location,
    UdfDefinition,
    UdlDefinition,
    UserDefinedLink,
    MacPool,
    MacAddress,
    TagGroup,
    Tag,
    ResourceTag,
    DeviceType,
    DeviceSubtype,
    Device,
    DeviceAddress,
    Acl,
    AccessRight,
}

impl ObjectType {
    /// All object types the registry must have a handler for before the
    /// executor is allowed to start (see "handler registry bootstrap").
    pub const ALL: &'static [ObjectType] = &[
        ObjectType::Configuration,
        ObjectType::View,
        ObjectType::Ip4Block,
        ObjectType::Ip4Group,
        ObjectType::Ip4Network,
        ObjectType::Ip4Address,
        ObjectType::Ip6Block,
        ObjectType::Ip6Network,
        ObjectType::Ip6Address,
        ObjectType::Ipv4DhcpRange,
        ObjectType::Ipv6DhcpRange,
        ObjectType::DhcpDeploymentRole,
        ObjectType::DnsDeploymentRole,
        ObjectType::Dhcpv4ClientDeploymentOption,
        ObjectType::Dhcpv4ServiceDeploymentOption,
        ObjectType::DnsZone,
        ObjectType::HostRecord,
        ObjectType::AliasRecord,
        ObjectType::MxRecord,
        ObjectType::TxtRecord,
        ObjectType::SrvRecord,
        ObjectType::ExternalHostRecord,
        ObjectType::GenericRecord,
        ObjectType::Location,
        ObjectType::UdfDefinition,
        ObjectType::UdlDefinition,
        ObjectType::UserDefinedLink,
        ObjectType::MacPool,
        ObjectType::MacAddress,
        ObjectType::TagGroup,
        ObjectType::Tag,
        ObjectType::ResourceTag,
        ObjectType::DeviceType,
        ObjectType::DeviceSubtype,
        ObjectType::Device,
        ObjectType::DeviceAddress,
        ObjectType::Acl,
        ObjectType::AccessRight,
    ];

    /// The snake_case CSV column value, e.g. `ip4_block`. Accepts the short
    /// IPv4-only aliases (`block`, `network`, `address`) on the way in via
    /// [`ObjectType::from_str`], but never emits them.
    pub fn as_csv_str(self) -> &'static str {
        match self {
            ObjectType::Configuration => "configuration",
            ObjectType::View => "view",
            ObjectType::Ip4Block => "ip4_block",
            ObjectType::Ip4Group => "ip4_group",
            ObjectType::Ip4Network => "ip4_network",
            ObjectType::Ip4Address => "ip4_address",
            ObjectType::Ip6Block => "ip6_block",
            ObjectType::Ip6Network => "ip6_network",
            ObjectType::Ip6Address => "ip6_address",
            ObjectType::Ipv4DhcpRange => "ipv4_dhcp_range",
            ObjectType::Ipv6DhcpRange => "ipv6_dhcp_range",
            ObjectType::DhcpDeploymentRole => "dhcp_deployment_role",
            ObjectType::DnsDeploymentRole => "dns_deployment_role",
            ObjectType::Dhcpv4ClientDeploymentOption => "dhcpv4_client_deployment_option",
            ObjectType::Dhcpv4ServiceDeploymentOption => "dhcpv4_service_deployment_option",
            ObjectType::DnsZone => "dns_zone",
            ObjectType::HostRecord => "host_record",
            ObjectType::AliasRecord => "alias_record",
            ObjectType::MxRecord => "mx_record",
            ObjectType::TxtRecord => "txt_record",
            ObjectType::SrvRecord => "srv_record",
            ObjectType::ExternalHostRecord => "external_host_record",
            ObjectType::GenericRecord => "generic_record",
            ObjectType::Location => "location",
            ObjectType::UdfDefinition => "udf_definition",
            ObjectType::UdlDefinition => "udl_definition",
            ObjectType::UserDefinedLink => "user_defined_link",
            ObjectType::MacPool => "mac_pool",
            ObjectType::MacAddress => "mac_address",
            ObjectType::TagGroup => "tag_group",
            ObjectType::Tag => "tag",
            ObjectType::ResourceTag => "resource_tag",
            ObjectType::DeviceType => "device_type",
            ObjectType::DeviceSubtype => "device_subtype",
            ObjectType::Device => "device",
            ObjectType::DeviceAddress => "device_address",
            ObjectType::Acl => "acl",
            ObjectType::AccessRight => "access_right",
        }
    }

    /// The PascalCase `type` discriminator the remote API uses
    /// (`CSV_TO_BAM_TYPE_MAP`).
    pub fn as_bam_type(self) -> &'static str {
        match self {
            ObjectType::Configuration => "Configuration",
            ObjectType::View => "View",
            ObjectType::Ip4Block => "IPv4Block",
            ObjectType::Ip4Group => "IPv4Group",
            ObjectType::Ip4Network => "IPv4Network",
            ObjectType::Ip4Address => "IPv4Address",
            ObjectType::Ip6Block => "IPv6Block",
            ObjectType::Ip6Network => "IPv6Network",
            ObjectType::Ip6Address => "IPv6Address",
            ObjectType::Ipv4DhcpRange => "IPv4DHCPRange",
            ObjectType::Ipv6DhcpRange => "IPv6DHCPRange",
            ObjectType::DhcpDeploymentRole => "DHCPDeploymentRole",
            ObjectType::DnsDeploymentRole => "DNSDeploymentRole",
            ObjectType::Dhcpv4ClientDeploymentOption => "DHCPv4ClientDeploymentOption",
            ObjectType::Dhcpv4ServiceDeploymentOption => "DHCPv4ServiceDeploymentOption",
            ObjectType::DnsZone => "DNSZone",
            ObjectType::HostRecord => "HostRecord",
            ObjectType::AliasRecord => "AliasRecord",
            ObjectType::MxRecord => "MXRecord",
            ObjectType::TxtRecord => "TXTRecord",
            ObjectType::SrvRecord => "SRVRecord",
            ObjectType::ExternalHostRecord => "ExternalHostRecord",
            ObjectType::GenericRecord => "GenericRecord",
            ObjectType::Location => "Location",
            ObjectType::UdfDefinition => "UDFDefinition",
            ObjectType::UdlDefinition => "UDLDefinition",
            ObjectType::UserDefinedLink => "UserDefinedLink",
            ObjectType::MacPool => "MACPool",
            ObjectType::MacAddress => "MACAddress",
            ObjectType::TagGroup => "TagGroup",
            ObjectType::Tag => "Tag",
            ObjectType::ResourceTag => "ResourceTag",
            ObjectType::DeviceType => "DeviceType",
            ObjectType::DeviceSubtype => "DeviceSubtype",
            ObjectType::Device => "Device",
            ObjectType::DeviceAddress => "DeviceAddress",
            ObjectType::Acl => "Access",
            ObjectType::AccessRight => "AccessRight",
        }
    }

    /// Deletion of these kinds is refused without
    /// `allow_dangerous_operations` (`BAM_TO_SAFETY_TYPE_MAP`'s domain).
    pub fn is_protected(self) -> bool {
        matches!(
            self,
            ObjectType::Configuration
                | ObjectType::View
                | ObjectType::Ip4Block
                | ObjectType::Ip6Block
                | ObjectType::Ip4Network
                | ObjectType::Ip6Network
                | ObjectType::DnsZone
        )
    }

    /// Immutable kinds whose handler raises `unsupported-update` rather
    /// than accepting a PATCH-shaped payload (handler update idiom 1).
    pub fn update_unsupported(self) -> bool {
        matches!(
            self,
            ObjectType::Tag | ObjectType::ResourceTag | ObjectType::DeviceAddress
        )
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_csv_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("`{0}` is not a recognized object_type")]
pub struct UnknownObjectType(pub String);

impl FromStr for ObjectType {
    type Err = UnknownObjectType;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        // Short aliases for convenience (explicit IPv4 only).
        let canonical = match normalized.as_str() {
            "block" => "ip4_block",
            "network" => "ip4_network",
            "address" => "ip4_address",
            other => other,
        };
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_csv_str() == canonical)
            .ok_or_else(|| UnknownObjectType(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_csv_str() {
        for ty in ObjectType::ALL {
            assert_eq!(ObjectType::from_str(ty.as_csv_str()).unwrap(), *ty);
        }
    }

    #[test]
    fn short_ipv4_aliases_resolve() {
        assert_eq!(ObjectType::from_str("block").unwrap(), ObjectType::Ip4Block);
        assert_eq!(
            ObjectType::from_str("network").unwrap(),
            ObjectType::Ip4Network
        );
        assert_eq!(
            ObjectType::from_str("address").unwrap(),
            ObjectType::Ip4Address
        );
    }

    #[test]
    fn protected_kinds_match_safety_registry() {
        assert!(ObjectType::Ip4Block.is_protected());
        assert!(ObjectType::DnsZone.is_protected());
        assert!(!ObjectType::HostRecord.is_protected());
        assert!(!ObjectType::AccessRight.is_protected());
    }

    #[test]
    fn unknown_type_is_an_error_not_a_panic() {
        assert!(ObjectType::from_str("not_a_real_type").is_err());
    }
}
