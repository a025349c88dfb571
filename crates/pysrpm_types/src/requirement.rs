//! PEP 508 dependency specifications (`Requires-Dist` entries).

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::ParseRequirementError;
use crate::marker::MarkerTree;
use crate::normalize::normalize_name;
use crate::specifier::{Specifier, parse_specifiers};

/// A dependency of a Python package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// The distribution name as written in the metadata
    pub name: String,
    /// Extras requested from the dependency itself (`foo[bar]`)
    pub extras: Vec<String>,
    /// Version constraints, all of which must hold
    pub specifiers: Vec<Specifier>,
    /// Direct reference (`foo @ https://...`)
    pub url: Option<String>,
    /// The environment marker gating this dependency
    pub marker: Option<MarkerTree>,
    /// The extra of the declaring package this dependency belongs to
    pub extra: Option<String>,
}

impl Dependency {
    /// A bare dependency on `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extras: Vec::new(),
            specifiers: Vec::new(),
            url: None,
            marker: None,
            extra: None,
        }
    }

    /// The PEP 503 normalized distribution name
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

impl Display for Dependency {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        if let Some(url) = &self.url {
            write!(f, " @ {url}")?;
        }
        for (i, spec) in self.specifiers.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { "," })?;
            spec.fmt(f)?;
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {marker}")?;
        }
        Ok(())
    }
}

impl FromStr for Dependency {
    type Err = ParseRequirementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| ParseRequirementError::InvalidRequirement {
            requirement: s.trim().to_string(),
            message: message.to_string(),
        };

        let (requirement, marker) = match s.split_once(';') {
            Some((requirement, marker)) => (requirement.trim(), Some(marker.trim())),
            None => (s.trim(), None),
        };

        let name_len = requirement
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            .unwrap_or(requirement.len());
        let name = &requirement[..name_len];
        if name.is_empty() {
            return Err(invalid("missing distribution name"));
        }
        if !name.starts_with(|c: char| c.is_ascii_alphanumeric())
            || !name.ends_with(|c: char| c.is_ascii_alphanumeric())
        {
            return Err(invalid("distribution names must start and end with a letter or digit"));
        }

        let mut dependency = Dependency::new(name);
        let mut rest = requirement[name_len..].trim_start();

        if let Some(stripped) = rest.strip_prefix('[') {
            let close = stripped
                .find(']')
                .ok_or_else(|| invalid("unterminated extras list"))?;
            dependency.extras = stripped[..close]
                .split(',')
                .map(str::trim)
                .filter(|extra| !extra.is_empty())
                .map(normalize_name)
                .collect();
            rest = stripped[close + 1..].trim_start();
        }

        if let Some(url) = rest.strip_prefix('@') {
            let url = url.trim();
            if url.is_empty() {
                return Err(invalid("missing URL after '@'"));
            }
            dependency.url = Some(url.to_string());
        } else {
            let specifiers = match rest.strip_prefix('(') {
                Some(inner) => inner
                    .strip_suffix(')')
                    .ok_or_else(|| invalid("unbalanced parenthesis in version specifiers"))?,
                None => rest,
            };
            dependency.specifiers = parse_specifiers(specifiers)?;
        }

        if let Some(marker) = marker {
            if marker.is_empty() {
                return Err(invalid("empty environment marker"));
            }
            let marker: MarkerTree = marker.parse()?;
            dependency.extra = marker.top_level_extra();
            dependency.marker = Some(marker);
        }

        Ok(dependency)
    }
}
