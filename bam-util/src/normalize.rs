//! Field-level normalization and syntactic validation shared by every row
//! schema: CIDR well-formedness, MAC canonicalization, FQDN trailing-dot
//! stripping, access-level case folding, and the `|`-delimited list
//! convention used by multi-valued CSV fields.

use cidr::IpCidr;

/// Multi-valued CSV fields use `|` as the list delimiter. Empty segments
/// (from a trailing `|` or an empty field) are dropped.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Validate and canonicalize a CIDR string (`10.0.0.0/8`, `2001:db8::/32`).
pub fn normalize_cidr(raw: &str) -> Result<String, String> {
    raw.trim()
        .parse::<IpCidr>()
        .map(|cidr| cidr.to_string())
        .map_err(|_| format!("`{raw}` is not a well-formed CIDR"))
}

/// Normalize a MAC address to colon-separated uppercase hex
/// (`aa-bb-cc-dd-ee-ff` / `aabbccddeeff` → `AA:BB:CC:DD:EE:FF`).
pub fn normalize_mac(raw: &str) -> Result<String, String> {
    let hex: String = raw.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    if hex.len() != 12 {
        return Err(format!("`{raw}` is not a well-formed MAC address"));
    }
    let upper = hex.to_ascii_uppercase();
    let octets: Vec<&str> = upper
        .as_bytes()
        .chunks(2)
        .map(|chunk| std::str::from_utf8(chunk).unwrap())
        .collect();
    Ok(octets.join(":"))
}

/// Strip a single trailing dot from a fully-qualified domain name; the BAM
/// API never accepts the trailing-dot absolute form.
pub fn normalize_fqdn(raw: &str) -> String {
    raw.trim().trim_end_matches('.').to_string()
}

/// Access levels are normalized to uppercase (`full`, `Full` and `FULL` all
/// become `FULL`).
pub fn normalize_access_level(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// `user_type` fields are normalized to lowercase.
pub fn normalize_user_type(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

const VALID_SERVER_SCOPES: &[&str] = &["server-wide", "service-wide", "client-wide", "all-servers"];

/// DHCP option server scope is one of a closed set of values.
pub fn validate_server_scope(raw: &str) -> Result<String, String> {
    let scope = raw.trim().to_ascii_lowercase();
    if VALID_SERVER_SCOPES.contains(&scope.as_str()) {
        Ok(scope)
    } else {
        Err(format!(
            "`{raw}` is not a valid server scope (expected one of {VALID_SERVER_SCOPES:?})"
        ))
    }
}

/// DHCP option codes are in the range 1-254 inclusive.
pub fn validate_dhcp_option_code(raw: &str) -> Result<u8, String> {
    let code: u16 = raw
        .trim()
        .parse()
        .map_err(|_| format!("`{raw}` is not a valid DHCP option code"))?;
    if (1..=254).contains(&code) {
        Ok(code as u8)
    } else {
        Err(format!("DHCP option code {code} is out of range 1-254"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pipe_delimited_lists() {
        assert_eq!(parse_list("a|b|c"), vec!["a", "b", "c"]);
        assert_eq!(parse_list(" a | | b "), vec!["a", "b"]);
        assert_eq!(parse_list(""), Vec::<String>::new());
    }

    #[test]
    fn normalizes_mac_variants() {
        for input in ["aa-bb-cc-dd-ee-ff", "aabb.ccdd.eeff", "AABBCCDDEEFF"] {
            assert_eq!(normalize_mac(input).unwrap(), "AA:BB:CC:DD:EE:FF");
        }
        assert!(normalize_mac("not-a-mac").is_err());
    }

    #[test]
    fn rejects_malformed_cidr() {
        assert!(normalize_cidr("10.0.0.0/8").is_ok());
        assert!(normalize_cidr("not-a-cidr").is_err());
    }

    #[test]
    fn strips_trailing_dot() {
        assert_eq!(normalize_fqdn("example.com."), "example.com");
        assert_eq!(normalize_fqdn("example.com"), "example.com");
    }

    #[test]
    fn server_scope_is_closed() {
        assert_eq!(validate_server_scope("Server-Wide").unwrap(), "server-wide");
        assert!(validate_server_scope("bogus").is_err());
    }

    #[test]
    fn dhcp_option_code_range() {
        assert_eq!(validate_dhcp_option_code("66").unwrap(), 66);
        assert!(validate_dhcp_option_code("0").is_err());
        assert!(validate_dhcp_option_code("255").is_err());
    }
}
