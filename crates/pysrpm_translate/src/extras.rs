use globset::{Glob, GlobSet, GlobSetBuilder};
use pysrpm_types::normalize_name;

use crate::error::TranslationError;

/// The set of extras whose dependencies are wanted, as glob patterns.
#[derive(Debug, Clone)]
pub struct ExtrasFilter {
    globs: GlobSet,
}

impl ExtrasFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, TranslationError> {
        let mut builder = GlobSetBuilder::new();
        let mut normalized = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = pattern.as_ref().trim().to_lowercase();
            let glob = Glob::new(&pattern).map_err(|source| TranslationError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
            normalized.push(pattern);
        }
        let globs = builder
            .build()
            .map_err(|source| TranslationError::InvalidPattern {
                pattern: normalized.join(" "),
                source,
            })?;
        Ok(Self { globs })
    }

    /// Whether dependencies of `extra` are selected
    pub fn matches(&self, extra: &str) -> bool {
        self.globs.is_match(normalize_name(extra))
    }
}
