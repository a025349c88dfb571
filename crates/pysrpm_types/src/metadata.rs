//! The package metadata record that templates are rendered against.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::normalize::normalize_field;
use crate::requirement::Dependency;

/// Lookup of `{field}` placeholders.
///
/// Implementations return `None` for absent fields; whether that is an error
/// is up to the renderer. Field names are compared after
/// [`normalize_field`], so `author_email` and `author-email` are the same.
pub trait FieldLookup {
    fn field(&self, name: &str) -> Option<Cow<'_, str>>;
}

/// Metadata of a Python distribution, as read from its source archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    pub summary: Option<String>,
    pub license: Option<String>,
    pub author: Option<String>,
    pub author_email: Option<String>,
    pub home_page: Option<String>,
    pub long_description: Option<String>,
    pub requires_python: Option<String>,
    pub epoch: Option<String>,
    pub license_files: Vec<String>,
    pub doc_files: Vec<String>,
    pub entry_points: Vec<String>,
    pub disabled_entry_points: Vec<String>,
    /// Runtime dependencies, each tagged with the extra it belongs to
    pub dependencies: Vec<Dependency>,
    /// Declared extras (normalized)
    pub extras: Vec<String>,
    /// Requirements of the build backend
    pub build_requires: Vec<Dependency>,
    /// File name of the source archive
    pub source_file: Option<String>,
}

impl PackageMetadata {
    /// Metadata with only the mandatory fields set
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }
}

fn optional(value: &Option<String>) -> Option<Cow<'_, str>> {
    value.as_deref().map(Cow::Borrowed)
}

fn list(values: &[String]) -> Option<Cow<'_, str>> {
    if values.is_empty() {
        None
    } else {
        Some(Cow::Owned(values.join(" ")))
    }
}

impl FieldLookup for PackageMetadata {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match normalize_field(name).as_str() {
            "name" => Some(Cow::Borrowed(&self.name)),
            "version" => Some(Cow::Borrowed(&self.version)),
            "summary" => optional(&self.summary),
            "license" => optional(&self.license),
            "author" => optional(&self.author),
            "author-email" => optional(&self.author_email),
            "home-page" => optional(&self.home_page),
            "long-description" => optional(&self.long_description),
            "requires-python" => optional(&self.requires_python),
            "epoch" => optional(&self.epoch),
            "license-file" => list(&self.license_files),
            "doc-file" => list(&self.doc_files),
            "entry-points" => list(&self.entry_points),
            "disabled-entry-points" => list(&self.disabled_entry_points),
            "extras" => list(&self.extras),
            "source-file" => optional(&self.source_file),
            _ => None,
        }
    }
}

impl FieldLookup for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(&normalize_field(name))
            .or_else(|| self.get(name))
            .map(|v| Cow::Borrowed(v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup() {
        let metadata = PackageMetadata {
            author_email: Some("me@example.org".into()),
            license_files: vec!["LICENSE".into(), "COPYING".into()],
            ..PackageMetadata::new("foo", "1.0")
        };

        assert_eq!(metadata.field("name").as_deref(), Some("foo"));
        assert_eq!(metadata.field("author_email").as_deref(), Some("me@example.org"));
        assert_eq!(metadata.field("license-file").as_deref(), Some("LICENSE COPYING"));
        assert_eq!(metadata.field("doc-file"), None);
        assert_eq!(metadata.field("summary"), None);
        assert_eq!(metadata.field("no-such-field"), None);
    }
}
