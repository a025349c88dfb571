use std::borrow::Cow;
use std::collections::HashMap;

use pysrpm_types::{FieldLookup, PackageMetadata};

/// Package metadata extended with the fields computed while assembling.
/// Computed fields shadow metadata fields of the same name.
pub(crate) struct SpecFields<'a> {
    metadata: &'a PackageMetadata,
    computed: HashMap<String, String>,
}

impl<'a> SpecFields<'a> {
    pub(crate) fn new(metadata: &'a PackageMetadata, package_prefix: &str) -> Self {
        let source_file = metadata
            .source_file
            .clone()
            .unwrap_or_else(|| format!("{}-{}.tar.gz", metadata.name, metadata.version));
        let computed = HashMap::from([
            ("rpmname".to_string(), format!("{package_prefix}{}", metadata.name)),
            ("rpmversion".to_string(), metadata.version.replace('-', "_")),
            ("sourcefile".to_string(), source_file),
        ]);
        Self { metadata, computed }
    }

    /// Set `name` unless `lines` is empty, in which case it stays absent
    pub(crate) fn insert_lines(&mut self, name: &str, lines: &[String]) {
        if !lines.is_empty() {
            self.computed.insert(name.to_string(), lines.join("\n"));
        }
    }
}

impl FieldLookup for SpecFields<'_> {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        self.computed.field(name).or_else(|| self.metadata.field(name))
    }
}
