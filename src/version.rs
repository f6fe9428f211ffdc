//! # Version Compatibility
//!
//! Every project manifest records the version of vivamir it was written for.
//! The generated scripts and the manifest schema only change in breaking ways
//! across major versions, so a manifest is accepted when its major version
//! equals the major version of the running tool. The check runs right after
//! the manifest is parsed, before any reference is resolved.

use semver::Version;

use crate::error::{Error, Result};

/// Version of the running vivamir.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The running vivamir version, parsed.
pub fn tool_version() -> Result<Version> {
    Ok(Version::parse(VERSION)?)
}

/// Whether a manifest written for `manifest` can be used by `tool`.
pub fn is_compatible(manifest: &Version, tool: &Version) -> bool {
    manifest.major == tool.major
}

/// Check a manifest's `version` field against the running tool.
///
/// Fails with [`Error::Semver`] if the field is not a semantic version and
/// with [`Error::IncompatibleVersion`] if the major versions differ.
pub fn check_compatible(found: &str) -> Result<()> {
    check_against(found, &tool_version()?)
}

fn check_against(found: &str, tool: &Version) -> Result<()> {
    let manifest = Version::parse(found.trim())?;
    if is_compatible(&manifest, tool) {
        log::debug!("manifest version {} accepted by {}", manifest, tool);
        Ok(())
    } else {
        Err(Error::IncompatibleVersion {
            found: manifest.to_string(),
            expected: format!("{}.x.x", tool.major),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_version_parses() {
        let version = tool_version().unwrap();
        assert_eq!(version.to_string(), VERSION);
    }

    #[test]
    fn test_same_major_is_compatible() {
        let tool = Version::new(2, 1, 0);
        assert!(check_against("2.0.0", &tool).is_ok());
        assert!(check_against("2.9.3", &tool).is_ok());
    }

    #[test]
    fn test_other_major_is_incompatible() {
        let tool = Version::new(2, 1, 0);
        let err = check_against("1.4.0", &tool).unwrap_err();
        match err {
            Error::IncompatibleVersion { found, expected } => {
                assert_eq!(found, "1.4.0");
                assert_eq!(expected, "2.x.x");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(check_against("3.0.0", &tool).is_err());
    }

    #[test]
    fn test_invalid_version() {
        let err = check_against("2.1", &Version::new(2, 1, 0)).unwrap_err();
        assert!(matches!(err, Error::Semver(_)));
    }

    #[test]
    fn test_running_version_accepts_itself() {
        assert!(check_compatible(VERSION).is_ok());
    }
}
