//! Four-component build versions
//!
//! Versions look like `major.minor.build.revision`. An explicit override is
//! validated and kept verbatim; otherwise the build slot of the persisted
//! version record is incremented and the revision reset to zero.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::BuildError;

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([0-9]+\.){3}[0-9]+$").expect("static regex"))
}

/// A validated `major.minor.build.revision` version string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildVersion(String);

impl BuildVersion {
    /// Validate a version string, keeping its text exactly as given
    pub fn parse(s: &str) -> Result<Self, BuildError> {
        if version_pattern().is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(BuildError::InvalidVersion {
                version: s.to_string(),
            })
        }
    }

    /// Derive the next build version from a previously recorded one
    ///
    /// `1.2.3.7` becomes `1.2.4.0`. A three-component record (`1.2.3`) is
    /// accepted and produces `1.2.4.0`.
    pub fn next_build(current: &str) -> Result<Self, BuildError> {
        let current = current.trim();
        let malformed = |reason: String| BuildError::MalformedVersionSource {
            source_text: current.to_string(),
            reason,
        };

        let parts: Vec<&str> = current.split('.').collect();
        if parts.len() < 3 {
            return Err(malformed(format!(
                "expected at least 3 components, found {}",
                parts.len()
            )));
        }
        if parts.len() > 4 {
            return Err(malformed(format!(
                "expected at most 4 components, found {}",
                parts.len()
            )));
        }

        for part in &parts {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed(format!("component '{}' is not numeric", part)));
            }
        }

        // Major and minor are carried over as written; only the build slot is numeric
        let build = parts[2]
            .parse::<u64>()
            .map_err(|e| malformed(format!("component '{}': {}", parts[2], e)))?
            .checked_add(1)
            .ok_or_else(|| malformed("build component overflows".to_string()))?;

        Ok(Self(format!("{}.{}.{}.0", parts[0], parts[1], build)))
    }

    /// The version text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BuildVersion {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Choose the version for this build
///
/// A non-empty `explicit_override` wins and must be a valid four-component
/// version. Otherwise `current` is auto-incremented.
pub fn compute_version(
    explicit_override: Option<&str>,
    current: &str,
) -> Result<BuildVersion, BuildError> {
    match explicit_override.filter(|v| !v.is_empty()) {
        Some(version) => BuildVersion::parse(version),
        None => BuildVersion::next_build(current),
    }
}

/// Like [`compute_version`], but only reads the version record when no
/// override is given
pub fn compute_version_with<F>(
    explicit_override: Option<&str>,
    read_current: F,
) -> anyhow::Result<BuildVersion>
where
    F: FnOnce() -> anyhow::Result<String>,
{
    let current = match explicit_override.filter(|v| !v.is_empty()) {
        Some(_) => String::new(),
        None => read_current()?,
    };
    Ok(compute_version(explicit_override, &current)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_build_component() {
        let v = compute_version(None, "1.2.3.0").unwrap();
        assert_eq!(v.as_str(), "1.2.4.0");
    }

    #[test]
    fn test_increment_resets_revision() {
        let v = compute_version(None, "4.0.17.9").unwrap();
        assert_eq!(v.as_str(), "4.0.18.0");

        let v = compute_version(Some(""), "0.0.0.0").unwrap();
        assert_eq!(v.as_str(), "0.0.1.0");
    }

    #[test]
    fn test_three_component_record() {
        let v = compute_version(None, "2.5.9").unwrap();
        assert_eq!(v.as_str(), "2.5.10.0");
    }

    #[test]
    fn test_increment_keeps_major_and_minor_text() {
        let v = compute_version(None, "01.02.3.0").unwrap();
        assert_eq!(v.as_str(), "01.02.4.0");

        // an override with leading zeros survives the next auto-increment
        let first = compute_version(Some("01.2.3.4"), "1.0.0.0").unwrap();
        let next = compute_version(None, first.as_str()).unwrap();
        assert_eq!(next.as_str(), "01.2.4.0");
    }

    #[test]
    fn test_record_whitespace_is_trimmed() {
        let v = compute_version(None, "  1.0.41.0\n").unwrap();
        assert_eq!(v.as_str(), "1.0.42.0");
    }

    #[test]
    fn test_override_wins_verbatim() {
        let v = compute_version(Some("9.9.9.9"), "1.0.0.0").unwrap();
        assert_eq!(v.as_str(), "9.9.9.9");

        let v = compute_version(Some("01.2.3.4"), "1.0.0.0").unwrap();
        assert_eq!(v.to_string(), "01.2.3.4");
    }

    #[test]
    fn test_invalid_override() {
        for bad in ["1.2.x.0", "1.2.3", "1.2.3.4.5", "v1.2.3.4", "1.2.3.4 ", "1..3.4", "١.2.3.4"] {
            match compute_version(Some(bad), "1.0.0.0") {
                Err(BuildError::InvalidVersion { version }) => assert_eq!(version, bad),
                other => panic!("expected invalid version for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_malformed_record() {
        for bad in ["1.2", "", "1.2.x.0", "1.2.3.4.5", "1.-2.3.0", "1.2.18446744073709551615.0"] {
            assert!(
                matches!(
                    compute_version(None, bad),
                    Err(BuildError::MalformedVersionSource { .. })
                ),
                "expected malformed source for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_override_skips_record_read() {
        let v = compute_version_with(Some("3.1.0.0"), || panic!("record must not be read")).unwrap();
        assert_eq!(v.as_str(), "3.1.0.0");

        let v = compute_version_with(None, || Ok("3.1.0.0".to_string())).unwrap();
        assert_eq!(v.as_str(), "3.1.1.0");
    }

    #[test]
    fn test_from_str() {
        let v: BuildVersion = "10.20.30.40".parse().unwrap();
        assert_eq!(v.as_str(), "10.20.30.40");
        assert!("10.20.30".parse::<BuildVersion>().is_err());
    }
}
