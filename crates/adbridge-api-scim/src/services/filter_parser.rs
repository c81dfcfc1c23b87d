//! SCIM filter syntax parser (RFC 7644 Section 3.4.2.2), restricted to
//! the subset real identity-provider traffic sends.
//!
//! The grammar accepted is a single binary comparison
//! `<attr> <op> "<value>"` (or `<attr> pr`). Logical connectives,
//! grouping, value paths, and trailing input all parse to
//! [`ScimFilter::Unsupported`], on which the processor serves an
//! unfiltered page rather than failing the request.

use adbridge_db::models::{CacheColumn, CacheFilter};

use crate::services::attribute_mapper::derive_sam;

/// SCIM filter comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Contains
    Co,
    /// Starts with
    Sw,
    /// Ends with
    Ew,
    /// Present (no value)
    Pr,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
}

impl CompareOp {
    fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "eq" => Some(CompareOp::Eq),
            "ne" => Some(CompareOp::Ne),
            "co" => Some(CompareOp::Co),
            "sw" => Some(CompareOp::Sw),
            "ew" => Some(CompareOp::Ew),
            "pr" => Some(CompareOp::Pr),
            "gt" => Some(CompareOp::Gt),
            "ge" => Some(CompareOp::Ge),
            "lt" => Some(CompareOp::Lt),
            "le" => Some(CompareOp::Le),
            _ => None,
        }
    }
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScimFilter {
    /// A single comparison: attribute, operator, optional value
    /// (absent for `pr`).
    Compare {
        attribute: String,
        op: CompareOp,
        value: Option<String>,
    },
    /// Anything outside the supported subset.
    Unsupported,
}

/// Parse a SCIM filter string.
///
/// Quoted values carry no escape interpretation: a backslash-escaped
/// quote terminates the value early, the remainder counts as trailing
/// input, and the filter becomes unsupported.
#[must_use]
pub fn parse_filter(input: &str) -> ScimFilter {
    let Some((attribute, rest)) = split_token(input) else {
        return ScimFilter::Unsupported;
    };
    if !is_attribute_name(attribute) {
        return ScimFilter::Unsupported;
    }

    let Some((op_token, rest)) = split_token(rest) else {
        return ScimFilter::Unsupported;
    };
    let Some(op) = CompareOp::from_str(op_token) else {
        return ScimFilter::Unsupported;
    };

    if op == CompareOp::Pr {
        if !rest.trim().is_empty() {
            return ScimFilter::Unsupported;
        }
        return ScimFilter::Compare {
            attribute: attribute.to_string(),
            op,
            value: None,
        };
    }

    let rest = rest.trim_start();
    let Some(inner) = rest.strip_prefix('"') else {
        return ScimFilter::Unsupported;
    };
    let Some(end) = inner.find('"') else {
        return ScimFilter::Unsupported;
    };
    if !inner[end + 1..].trim().is_empty() {
        return ScimFilter::Unsupported;
    }

    ScimFilter::Compare {
        attribute: attribute.to_string(),
        op,
        value: Some(inner[..end].to_string()),
    }
}

/// Map a parsed filter to a cache predicate.
///
/// Only `eq` against an attribute backed by a dedicated cache column is
/// queryable: `id` and `externalId` hit the primary key (externalId
/// aliases it by construction), `userName` hits `sam_account_name` with
/// the value normalized through the sAM derivation so
/// `userName eq "x@y"` matches the row storing `x`. Everything else
/// returns `None` and the caller pages unfiltered.
#[must_use]
pub fn to_cache_filter(filter: &ScimFilter) -> Option<CacheFilter> {
    let ScimFilter::Compare {
        attribute,
        op: CompareOp::Eq,
        value: Some(value),
    } = filter
    else {
        return None;
    };

    if attribute.eq_ignore_ascii_case("id") || attribute.eq_ignore_ascii_case("externalId") {
        return Some(CacheFilter {
            column: CacheColumn::Id,
            value: value.clone(),
        });
    }
    if attribute.eq_ignore_ascii_case("userName") {
        return Some(CacheFilter {
            column: CacheColumn::SamAccountName,
            value: derive_sam(value),
        });
    }

    None
}

fn split_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(i) => Some((&s[..i], &s[i..])),
        None => Some((s, "")),
    }
}

fn is_attribute_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '$' || c == '-')
}
