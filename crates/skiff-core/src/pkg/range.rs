//! Declared-range validation using semver.
//!
//! Manifests speak npm range syntax, which is a superset of what the
//! `semver` crate parses directly. Hyphen ranges and space-separated
//! comparators are converted; `||` alternatives are validated one by one.

use semver::VersionReq;

use crate::error::{Error, Result};

/// Validate an npm-style version range declared for `name`.
///
/// Accepts standard semver ranges (`^1.0.0`, `~1.2`, `>=1.0.0`), x-ranges
/// (`3.x`, `1.0.x`, `*`), hyphen ranges (`1.0.0 - 2.0.0`), and `||`
/// alternatives.
pub fn validate_range(name: &str, range: &str) -> Result<()> {
    let range = range.trim();
    if range.is_empty() {
        return Err(invalid(name, range, "empty range"));
    }

    if range.contains("||") {
        let mut any = false;
        for alternative in range.split("||").map(str::trim) {
            if alternative.is_empty() {
                continue;
            }
            parse_single(name, alternative)?;
            any = true;
        }
        if !any {
            return Err(invalid(name, range, "no alternatives"));
        }
        return Ok(());
    }

    parse_single(name, range).map(|_| ())
}

/// Parse one range with npm syntax conversions applied.
fn parse_single(name: &str, range: &str) -> Result<VersionReq> {
    // Hyphen range: "1.0.0 - 2.0.0" means ">=1.0.0, <=2.0.0".
    if let Some((low, high)) = split_hyphen_range(range) {
        let converted = format!(">={low}, <={high}");
        return VersionReq::parse(&converted).map_err(|e| invalid(name, range, e.to_string()));
    }

    // npm allows bare "x"/"X" where semver wants "*".
    if range == "x" || range == "X" {
        return VersionReq::parse("*").map_err(|e| invalid(name, range, e.to_string()));
    }

    // Space-separated comparators mean AND: ">= 2.1.2 < 3.0.0".
    let converted = join_comparators(range);
    VersionReq::parse(&converted).map_err(|e| invalid(name, range, e.to_string()))
}

fn invalid(name: &str, range: &str, detail: impl Into<String>) -> Error {
    Error::InvalidRange {
        name: name.to_string(),
        range: range.to_string(),
        detail: detail.into(),
    }
}

fn split_hyphen_range(range: &str) -> Option<(&str, &str)> {
    let (low, high) = range.split_once(" - ")?;
    let (low, high) = (low.trim(), high.trim());
    (!low.is_empty() && !high.is_empty()).then_some((low, high))
}

/// Convert space-separated comparators to the comma form `semver` parses.
fn join_comparators(range: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut pending_op: Option<String> = None;

    for token in range.split_whitespace() {
        let is_bare_op = token.chars().all(|c| !c.is_ascii_digit() && c != '*');
        if is_bare_op {
            // Operator split from its version ("> =1.0" never occurs, but
            // ">= 2.1.2" does): hold it until the version token arrives.
            pending_op = Some(token.to_string());
            continue;
        }
        match pending_op.take() {
            Some(op) => parts.push(format!("{op}{token}")),
            None => parts.push(token.to_string()),
        }
    }

    if let Some(op) = pending_op {
        parts.push(op);
    }
    if parts.is_empty() {
        return range.to_string();
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_ranges() {
        for range in ["^1.0.0", "~1.2.3", ">=1.0.0", "=2.0.0", "1.2.3"] {
            validate_range("pkg", range).unwrap();
        }
    }

    #[test]
    fn test_x_ranges() {
        for range in ["3.x", "1.0.x", "*", "x", "X", "1.*"] {
            validate_range("pkg", range).unwrap();
        }
    }

    #[test]
    fn test_hyphen_range() {
        validate_range("pkg", "1.0.0 - 2.0.0").unwrap();
    }

    #[test]
    fn test_or_alternatives() {
        validate_range("pkg", "^1.0.0 || ^2.0.0").unwrap();
    }

    #[test]
    fn test_space_separated_comparators() {
        validate_range("pkg", ">= 2.1.2 < 3.0.0").unwrap();
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        for range in ["not a range", "", "^x.y.z", "1.0.0 ||| 2.0.0"] {
            assert!(
                validate_range("pkg", range).is_err(),
                "'{range}' should be rejected"
            );
        }
    }
}
