//! The server's filter grammar: `field:value`, `field:op(value)`, joined
//! by `and`. String values are single-quote-escaped; IPv6 address values
//! are double-quoted because their colons collide with the grammar;
//! numbers and booleans are unquoted.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Like,
    Ne,
    Contains,
    Gt,
}

impl FilterOp {
    fn suffix(self) -> Option<&'static str> {
        match self {
            FilterOp::Eq => None,
            FilterOp::Like => Some("like"),
            FilterOp::Ne => Some("ne"),
            FilterOp::Contains => Some("contains"),
            FilterOp::Gt => Some("gt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Str(String),
    Ipv6(String),
    Number(i64),
    Bool(bool),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Str(s) => write!(f, "'{}'", escape_single_quotes(s)),
            FilterValue::Ipv6(s) => write!(f, "\"{s}\""),
            FilterValue::Number(n) => write!(f, "{n}"),
            FilterValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

fn escape_single_quotes(raw: &str) -> String {
    raw.replace('\'', "\\'")
}

#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: FilterValue,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: FilterValue) -> Self {
        Self { field: field.into(), op: FilterOp::Eq, value }
    }

    pub fn op(field: impl Into<String>, op: FilterOp, value: FilterValue) -> Self {
        Self { field: field.into(), op, value }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op.suffix() {
            Some(suffix) => write!(f, "{}:{suffix}({})", self.field, self.value),
            None => write!(f, "{}:{}", self.field, self.value),
        }
    }
}

/// Joins filters with `and`, the grammar the server's `filter` query
/// parameter expects.
pub fn build_filter_string(filters: &[Filter]) -> String {
    filters
        .iter()
        .map(Filter::to_string)
        .collect::<Vec<_>>()
        .join(" and ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_single_quotes_in_string_values() {
        let filter = Filter::eq("name", FilterValue::Str("O'Brien".to_string()));
        assert_eq!(filter.to_string(), "name:'O\\'Brien'");
    }

    #[test]
    fn ipv6_values_are_double_quoted() {
        let filter = Filter::eq("address", FilterValue::Ipv6("fe80::1".to_string()));
        assert_eq!(filter.to_string(), "address:\"fe80::1\"");
    }

    #[test]
    fn numeric_and_bool_values_are_unquoted() {
        assert_eq!(Filter::eq("ttl", FilterValue::Number(3600)).to_string(), "ttl:3600");
        assert_eq!(Filter::eq("enabled", FilterValue::Bool(true)).to_string(), "enabled:true");
    }

    #[test]
    fn operator_suffixes_wrap_the_value() {
        let filter = Filter::op("name", FilterOp::Like, FilterValue::Str("%host%".to_string()));
        assert_eq!(filter.to_string(), "name:like('%host%')");
    }

    #[test]
    fn multiple_filters_join_with_and() {
        let filters = vec![
            Filter::eq("type", FilterValue::Str("IPv4Network".to_string())),
            Filter::op("range", FilterOp::Contains, FilterValue::Str("10.0.1.5".to_string())),
        ];
        assert_eq!(
            build_filter_string(&filters),
            "type:'IPv4Network' and range:contains('10.0.1.5')"
        );
    }
}
