use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use cvm_core::ChangeDescriptor;

use crate::error::DescriptorError;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorFile {
    summary: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    major: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    minor: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    patch: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pre: bool,
}

/// Parses one staged change file.
///
/// # Errors
///
/// Returns `DescriptorError` for malformed TOML, a package named in more
/// than one severity set, or a change naming no packages at all.
pub fn parse_descriptor(id: &str, content: &str) -> Result<ChangeDescriptor, DescriptorError> {
    let file: DescriptorFile = toml::from_str(content)?;

    let mut seen = HashSet::new();
    for package in file.major.iter().chain(&file.minor).chain(&file.patch) {
        if !seen.insert(package.as_str()) {
            return Err(DescriptorError::DuplicatePackage {
                package: package.clone(),
            });
        }
    }

    if seen.is_empty() {
        return Err(DescriptorError::NoPackages);
    }

    Ok(ChangeDescriptor {
        id: id.to_string(),
        summary: file.summary,
        major: file.major,
        minor: file.minor,
        patch: file.patch,
        pre: file.pre,
    })
}

/// Serializes a descriptor back to its file form. Empty severity sets and a
/// false `pre` flag are omitted.
///
/// # Errors
///
/// Returns an error if TOML serialization fails.
pub fn serialize_descriptor(descriptor: &ChangeDescriptor) -> Result<String, toml::ser::Error> {
    let file = DescriptorFile {
        summary: descriptor.summary.clone(),
        major: descriptor.major.clone(),
        minor: descriptor.minor.clone(),
        patch: descriptor.patch.clone(),
        pre: descriptor.pre,
    };

    toml::to_string(&file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvm_core::Severity;

    #[test]
    fn parses_all_fields() {
        let content = r#"
summary = "Rework the frame codec"
major = ["codec"]
minor = ["api"]
patch = ["cli"]
pre = false
"#;

        let descriptor = parse_descriptor("brave-otter", content).expect("should parse");

        assert_eq!(descriptor.id, "brave-otter");
        assert_eq!(descriptor.summary, "Rework the frame codec");
        assert_eq!(descriptor.severity_for("codec"), Some(Severity::Major));
        assert_eq!(descriptor.severity_for("api"), Some(Severity::Minor));
        assert_eq!(descriptor.severity_for("cli"), Some(Severity::Patch));
        assert!(!descriptor.pre);
    }

    #[test]
    fn missing_sets_default_to_empty() {
        let content = r#"
summary = "Fix panic on empty input"
patch = ["parser"]
"#;

        let descriptor = parse_descriptor("id", content).expect("should parse");

        assert!(descriptor.major.is_empty());
        assert!(descriptor.minor.is_empty());
        assert_eq!(descriptor.patch, vec!["parser"]);
        assert!(!descriptor.pre);
    }

    #[test]
    fn pre_flag_parses_true() {
        let content = r#"
summary = "Canary of the new planner"
minor = ["planner"]
pre = true
"#;

        let descriptor = parse_descriptor("id", content).expect("should parse");

        assert!(descriptor.pre);
    }

    #[test]
    fn empty_summary_is_allowed() {
        let content = r#"
summary = ""
patch = ["core"]
"#;

        let descriptor = parse_descriptor("id", content).expect("should parse");

        assert!(descriptor.summary.is_empty());
    }

    #[test]
    fn error_package_in_two_sets() {
        let content = r#"
summary = "Conflicting change"
major = ["core"]
patch = ["core"]
"#;

        let err = parse_descriptor("id", content).expect_err("should fail");

        assert!(matches!(
            err,
            DescriptorError::DuplicatePackage { package } if package == "core"
        ));
    }

    #[test]
    fn error_duplicate_within_one_set() {
        let content = r#"
summary = "Doubled entry"
minor = ["core", "core"]
"#;

        let err = parse_descriptor("id", content).expect_err("should fail");

        assert!(matches!(err, DescriptorError::DuplicatePackage { .. }));
    }

    #[test]
    fn error_no_packages() {
        let content = r#"
summary = "Nothing staged"
"#;

        let err = parse_descriptor("id", content).expect_err("should fail");

        assert!(matches!(err, DescriptorError::NoPackages));
    }

    #[test]
    fn error_unknown_field() {
        let content = r#"
summary = "Typo in severity"
majr = ["core"]
"#;

        let err = parse_descriptor("id", content).expect_err("should fail");

        assert!(matches!(err, DescriptorError::Toml(_)));
    }

    #[test]
    fn error_invalid_toml() {
        let err = parse_descriptor("id", "summary = ").expect_err("should fail");

        assert!(matches!(err, DescriptorError::Toml(_)));
    }

    #[test]
    fn serialize_omits_empty_sets_and_false_pre() {
        let descriptor = ChangeDescriptor {
            id: "id".to_string(),
            summary: "Fix panic".to_string(),
            major: Vec::new(),
            minor: Vec::new(),
            patch: vec!["parser".to_string()],
            pre: false,
        };

        let serialized = serialize_descriptor(&descriptor).expect("should serialize");

        assert!(serialized.contains("summary"));
        assert!(serialized.contains("patch"));
        assert!(!serialized.contains("major"));
        assert!(!serialized.contains("minor"));
        assert!(!serialized.contains("pre"));
    }

    #[test]
    fn serialize_round_trips() {
        let descriptor = ChangeDescriptor {
            id: "round-trip".to_string(),
            summary: "Add streaming reads".to_string(),
            major: vec!["store".to_string()],
            minor: vec!["api".to_string()],
            patch: Vec::new(),
            pre: true,
        };

        let serialized = serialize_descriptor(&descriptor).expect("should serialize");
        let parsed = parse_descriptor("round-trip", &serialized).expect("should parse");

        assert_eq!(parsed, descriptor);
    }
}
