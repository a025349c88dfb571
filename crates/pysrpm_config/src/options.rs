//! Typed access to the `[pysrpm]` control section.

use std::path::PathBuf;

use indexmap::IndexMap;
use pysrpm_types::DirectiveTag;

use crate::error::ConfigError;
use crate::section::Section;

/// The options of the `[pysrpm]` section, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlOptions {
    pub flavour: Option<String>,
    pub preset_dir: Option<PathBuf>,
    pub release: String,
    pub arch: Option<String>,
    /// Prepended to the distribution name to form the RPM name
    pub package_prefix: String,
    /// The interpreter passed to `rpmbuild` as `__python`
    pub python: String,
    pub dest_dir: PathBuf,
    /// Where the `rpmbuild` tree is created, the system temp dir if unset
    pub rpm_base: Option<PathBuf>,
    pub spec_only: bool,
    pub source_only: bool,
    pub binary_only: bool,
    pub dry_run: bool,
    pub keep_temp: bool,
    pub extract_dependencies: bool,
    /// Extra `Requires` lines, emitted verbatim
    pub requires: Vec<String>,
    /// Extra optional dependency lines, emitted verbatim
    pub suggests: Vec<String>,
    pub requires_extras: Vec<String>,
    pub suggests_extras: Vec<String>,
    /// `None` disables optional dependencies
    pub optional_dependency_tag: Option<DirectiveTag>,
    pub environment_markers: IndexMap<String, String>,
    pub optional_keys: Vec<String>,
    pub python_version: Option<String>,
    pub icon: Option<PathBuf>,
    pub epoch: Option<String>,
    pub disabled_entry_points: Vec<String>,
}

/// Parse a configparser-style boolean
pub fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Ok(true),
        "0" | "no" | "false" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            message: "expected one of 1/yes/true/on or 0/no/false/off".to_string(),
        }),
    }
}

/// Parse `name: value` lines into an ordered table
pub fn parse_environment_markers(value: &str) -> Result<IndexMap<String, String>, ConfigError> {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let (name, marker) = line.split_once(':').ok_or_else(|| ConfigError::InvalidValue {
                key: "environment_markers".to_string(),
                value: line.to_string(),
                message: "expected 'name: value'".to_string(),
            })?;
            Ok((name.trim().to_string(), marker.trim().to_string()))
        })
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn words(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn lines(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn flag(section: &Section, key: &str) -> Result<bool, ConfigError> {
    match section.get(key) {
        Some(value) if !value.trim().is_empty() => parse_bool(key, value),
        _ => Ok(false),
    }
}

fn required<'a>(section: &'a Section, key: &str) -> Result<&'a str, ConfigError> {
    section.get(key).ok_or_else(|| ConfigError::MissingKey {
        section: section.name().to_string(),
        key: key.to_string(),
    })
}

impl ControlOptions {
    pub fn from_section(section: &Section) -> Result<Self, ConfigError> {
        let optional_dependency_tag = non_empty(section.get("optional_dependency_tag"))
            .map(|tag| {
                tag.parse::<DirectiveTag>().map_err(|e| ConfigError::InvalidValue {
                    key: "optional_dependency_tag".to_string(),
                    value: tag.clone(),
                    message: e.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            flavour: non_empty(section.get("flavour")),
            preset_dir: non_empty(section.get("preset_dir")).map(PathBuf::from),
            release: required(section, "release")?.trim().to_string(),
            arch: non_empty(section.get("arch")),
            package_prefix: required(section, "package_prefix")?.trim().to_string(),
            python: non_empty(section.get("python")).unwrap_or_else(|| "python3".to_string()),
            dest_dir: non_empty(section.get("dest_dir"))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("dist")),
            rpm_base: non_empty(section.get("rpm_base")).map(PathBuf::from),
            spec_only: flag(section, "spec_only")?,
            source_only: flag(section, "source_only")?,
            binary_only: flag(section, "binary_only")?,
            dry_run: flag(section, "dry_run")?,
            keep_temp: flag(section, "keep_temp")?,
            extract_dependencies: parse_bool("extract_dependencies", required(section, "extract_dependencies")?)?,
            requires: lines(section.get("requires")),
            suggests: lines(section.get("suggests")),
            requires_extras: words(section.get("requires_extras")),
            suggests_extras: words(section.get("suggests_extras")),
            optional_dependency_tag,
            environment_markers: parse_environment_markers(
                section.get("environment_markers").unwrap_or_default(),
            )?,
            optional_keys: words(Some(required(section, "optional_keys")?)),
            python_version: non_empty(section.get("python_version")),
            icon: non_empty(section.get("icon")).map(PathBuf::from),
            epoch: non_empty(section.get("epoch")),
            disabled_entry_points: words(section.get("disabled_entry_points")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn control(extra: &[(&str, &str)]) -> Section {
        let mut section = Section::new("pysrpm");
        section.extend([
            ("release", "1"),
            ("package_prefix", "python3-"),
            ("extract_dependencies", "yes"),
            ("optional_keys", "summary\nlicense-file"),
        ]);
        section.extend(extra.iter().copied());
        section
    }

    #[rstest]
    #[case("1", true)]
    #[case("Yes", true)]
    #[case("TRUE", true)]
    #[case("on", true)]
    #[case("0", false)]
    #[case("no", false)]
    #[case("False", false)]
    #[case("off", false)]
    fn test_parse_bool(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(parse_bool("key", value).unwrap(), expected);
    }

    #[test]
    fn test_invalid_bool() {
        let err = ControlOptions::from_section(&control(&[("dry_run", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "dry_run"));
    }

    #[test]
    fn test_options() {
        let options = ControlOptions::from_section(&control(&[
            ("environment_markers", "os_name: posix\nsys_platform: linux"),
            ("optional_dependency_tag", "Recommends"),
            ("requires", "foo\n\nbar >= 2"),
            ("suggests_extras", "test doc*"),
            ("python_version", ""),
        ]))
        .unwrap();

        assert_eq!(options.release, "1");
        assert_eq!(options.package_prefix, "python3-");
        assert!(options.extract_dependencies);
        assert!(!options.dry_run);
        assert_eq!(options.optional_keys, vec!["summary", "license-file"]);
        assert_eq!(options.environment_markers["sys_platform"], "linux");
        assert_eq!(options.optional_dependency_tag, Some(DirectiveTag::Recommends));
        assert_eq!(options.requires, vec!["foo", "bar >= 2"]);
        assert_eq!(options.suggests_extras, vec!["test", "doc*"]);
        assert_eq!(options.python_version, None);
        assert_eq!(options.dest_dir, PathBuf::from("dist"));
    }

    #[test]
    fn test_empty_tag_disables_optional_dependencies() {
        let options =
            ControlOptions::from_section(&control(&[("optional_dependency_tag", "")])).unwrap();
        assert_eq!(options.optional_dependency_tag, None);
    }

    #[test]
    fn test_missing_required_key() {
        let mut section = control(&[]);
        section.remove("release");
        let err = ControlOptions::from_section(&section).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { key, .. } if key == "release"));
    }
}
