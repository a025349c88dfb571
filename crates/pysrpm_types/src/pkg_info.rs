//! Parsing of `PKG-INFO` documents (core metadata in RFC 822 form).

use crate::error::MetadataError;
use crate::metadata::PackageMetadata;
use crate::normalize::normalize_name;
use crate::requirement::Dependency;

/// Setuptools writes this for fields that were never set
const UNKNOWN: &str = "UNKNOWN";

struct Headers {
    entries: Vec<(String, String)>,
    body: Option<String>,
}

impl Headers {
    fn parse(text: &str) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();
        let mut lines = text.lines();
        let mut body = None;

        while let Some(line) = lines.next() {
            if line.is_empty() {
                let rest = lines.collect::<Vec<_>>().join("\n");
                if !rest.trim().is_empty() {
                    body = Some(rest.trim_end().to_string());
                }
                break;
            }

            if line.starts_with([' ', '\t']) {
                if let Some((_, value)) = entries.last_mut() {
                    value.push('\n');
                    value.push_str(line);
                }
                continue;
            }

            if let Some((name, value)) = line.split_once(':') {
                entries.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
            }
        }

        Self { entries, body }
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty() && *value != UNKNOWN)
    }

    fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty() && *value != UNKNOWN)
    }
}

/// Undo the continuation-line folding of a multi-line header. Both the
/// historical `        |` prefix and plain 8-space indentation are accepted.
fn unfold_description(value: &str) -> String {
    let mut lines = value.lines();
    let mut result = lines.next().unwrap_or_default().to_string();
    for line in lines {
        let line = line.trim_start_matches([' ', '\t']);
        let line = line.strip_prefix('|').unwrap_or(line);
        let line = line.strip_prefix(' ').unwrap_or(line);
        result.push('\n');
        result.push_str(line);
    }
    result.trim_end().to_string()
}

impl PackageMetadata {
    /// Parse the contents of a `PKG-INFO` file.
    ///
    /// `Name` and `Version` are required. Fields holding `UNKNOWN` are
    /// treated as absent. The long description is the message body, or the
    /// `Description` header for older metadata versions.
    pub fn from_pkg_info(text: &str) -> Result<Self, MetadataError> {
        let headers = Headers::parse(text);

        let name = headers
            .get("name")
            .ok_or(MetadataError::MissingHeader("Name"))?;
        let version = headers
            .get("version")
            .ok_or(MetadataError::MissingHeader("Version"))?;

        let mut metadata = PackageMetadata::new(name, version);
        let owned = |name: &str| headers.get(name).map(str::to_string);

        metadata.summary = owned("summary");
        metadata.license = owned("license-expression").or_else(|| owned("license"));
        metadata.author = owned("author");
        metadata.author_email = owned("author-email");
        metadata.home_page = owned("home-page").or_else(|| {
            headers
                .get_all("project-url")
                .find_map(|url| url.split_once(',').map(|(_, url)| url.trim().to_string()))
        });
        metadata.requires_python = owned("requires-python");
        metadata.long_description = headers
            .body
            .clone()
            .or_else(|| headers.get("description").map(unfold_description));

        metadata.license_files = headers.get_all("license-file").map(str::to_string).collect();
        metadata.extras = headers.get_all("provides-extra").map(normalize_name).collect();
        metadata.dependencies = headers
            .get_all("requires-dist")
            .map(str::parse::<Dependency>)
            .collect::<Result<_, _>>()?;

        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PKG_INFO: &str = "\
Metadata-Version: 2.1
Name: sample-pkg
Version: 1.2.0
Summary: A sample package
Home-page: UNKNOWN
Author: Jane Doe
Author-email: jane@example.org
License: MIT
Project-URL: Source, https://example.org/sample
Requires-Python: >=3.8
License-File: LICENSE
Provides-Extra: Test
Requires-Dist: requests (>=2.0)
Requires-Dist: pytest; extra == \"test\"

Sample
======

Long description.
";

    #[test]
    fn test_parse_pkg_info() {
        let metadata = PackageMetadata::from_pkg_info(PKG_INFO).unwrap();
        assert_eq!(metadata.name, "sample-pkg");
        assert_eq!(metadata.version, "1.2.0");
        assert_eq!(metadata.summary.as_deref(), Some("A sample package"));
        assert_eq!(
            metadata.home_page.as_deref(),
            Some("https://example.org/sample")
        );
        assert_eq!(metadata.license_files, vec!["LICENSE"]);
        assert_eq!(metadata.extras, vec!["test"]);
        assert_eq!(metadata.dependencies.len(), 2);
        assert_eq!(metadata.dependencies[1].extra.as_deref(), Some("test"));
        assert_eq!(
            metadata.long_description.as_deref(),
            Some("Sample\n======\n\nLong description.")
        );
    }

    #[test]
    fn test_folded_description_header() {
        let text = "Name: old\nVersion: 0.1\nDescription: First line\n        |second line\n        \n        third\n";
        let metadata = PackageMetadata::from_pkg_info(text).unwrap();
        assert_eq!(
            metadata.long_description.as_deref(),
            Some("First line\nsecond line\n\nthird")
        );
    }

    #[test]
    fn test_missing_version() {
        let err = PackageMetadata::from_pkg_info("Name: foo\n").unwrap_err();
        assert!(matches!(err, MetadataError::MissingHeader("Version")));
    }

    #[test]
    fn test_invalid_requirement() {
        let text = "Name: foo\nVersion: 1\nRequires-Dist: -bad\n";
        assert!(matches!(
            PackageMetadata::from_pkg_info(text),
            Err(MetadataError::Requirement(_))
        ));
    }
}
