//! Configuration sources: INI text, `setup.cfg`, `pyproject.toml` and
//! command-line overrides.

use std::path::Path;

use crate::error::ConfigError;
use crate::ini::parse_ini;
use crate::section::Section;
use crate::CONTROL_SECTION;

const SECTION_PREFIX: &str = "pysrpm.";

/// One layer of configuration: where it came from and its sections in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSource {
    origin: String,
    sections: Vec<Section>,
}

impl ConfigSource {
    /// A source from already parsed sections
    pub fn new(origin: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            origin: origin.into(),
            sections,
        }
    }

    /// Parse INI text. Every section is kept under its own name.
    pub fn from_ini_str(origin: impl Into<String>, text: &str) -> Result<Self, ConfigError> {
        let origin = origin.into();
        let sections = parse_ini(&origin, text)?;
        Ok(Self { origin, sections })
    }

    /// Read a user configuration file.
    ///
    /// `pyproject.toml` is read from its `[tool.pysrpm]` table, `setup.cfg`
    /// from its `[pysrpm]` and `[pysrpm.*]` sections. For any other file the
    /// `pysrpm.` prefix is stripped from section names when present.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs_err::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let origin = path.display().to_string();

        match path.file_name().and_then(|name| name.to_str()) {
            Some("pyproject.toml") => Self::from_pyproject_str(origin, &text),
            Some("setup.cfg") => Self::from_setup_cfg_str(origin, &text),
            _ if path.extension().is_some_and(|ext| ext == "toml") => {
                Self::from_pyproject_str(origin, &text)
            }
            _ => {
                let mut source = Self::from_ini_str(origin, &text)?;
                if source
                    .sections
                    .iter()
                    .any(|s| s.name().starts_with(SECTION_PREFIX))
                {
                    source.sections = strip_prefixed_sections(source.sections);
                }
                Ok(source)
            }
        }
    }

    /// Read the `[pysrpm]` and `[pysrpm.*]` sections of a `setup.cfg`
    pub fn from_setup_cfg_str(origin: impl Into<String>, text: &str) -> Result<Self, ConfigError> {
        let mut source = Self::from_ini_str(origin, text)?;
        source.sections = strip_prefixed_sections(source.sections);
        Ok(source)
    }

    /// Read the `[tool.pysrpm]` table of a `pyproject.toml`.
    ///
    /// Top-level scalar keys go to `[pysrpm]`, sub-tables become sections and
    /// arrays of strings become multi-line values.
    pub fn from_pyproject_str(origin: impl Into<String>, text: &str) -> Result<Self, ConfigError> {
        let origin = origin.into();
        let document: toml::Table = text.parse().map_err(|source| ConfigError::Toml {
            origin: origin.clone(),
            source,
        })?;

        let Some(tool) = document
            .get("tool")
            .and_then(|tool| tool.get("pysrpm"))
            .and_then(toml::Value::as_table)
        else {
            return Ok(Self::new(origin, Vec::new()));
        };

        let mut control = Section::new(CONTROL_SECTION);
        let mut sections: Vec<Section> = Vec::new();
        for (key, value) in tool {
            match value {
                toml::Value::Table(table) => {
                    let mut section = Section::new(key.as_str());
                    for (inner_key, inner_value) in table {
                        let path = format!("{key}.{inner_key}");
                        section.insert(inner_key.as_str(), toml_to_string(&origin, &path, inner_value)?);
                    }
                    sections.push(section);
                }
                other => {
                    control.insert(key.as_str(), toml_to_string(&origin, key, other)?);
                }
            }
        }

        // `[tool.pysrpm.pysrpm]` is folded into the control section
        if let Some(position) = sections.iter().position(|s| s.name() == CONTROL_SECTION) {
            let nested = sections.remove(position);
            for (key, value) in nested.iter() {
                if control.contains_key(key) {
                    return Err(ConfigError::DuplicateKey {
                        origin,
                        line: 0,
                        section: CONTROL_SECTION.to_string(),
                        key: key.to_string(),
                    });
                }
                control.insert(key, value);
            }
        }

        if !control.is_empty() {
            sections.insert(0, control);
        }
        Ok(Self::new(origin, sections))
    }

    /// Command-line overrides, given as `(section, key, value)` triples.
    /// Later triples replace earlier ones.
    pub fn overrides<'a>(
        origin: impl Into<String>,
        values: impl IntoIterator<Item = (&'a str, &'a str, String)>,
    ) -> Self {
        let mut sections: Vec<Section> = Vec::new();
        for (section, key, value) in values {
            match sections.iter_mut().find(|s| s.name() == section) {
                Some(existing) => {
                    existing.insert(key, value);
                }
                None => {
                    let mut new = Section::new(section);
                    new.insert(key, value);
                    sections.push(new);
                }
            }
        }
        Self::new(origin, sections)
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Remove and return a section
    pub(crate) fn take_section(&mut self, name: &str) -> Option<Section> {
        let position = self.sections.iter().position(|s| s.name() == name)?;
        Some(self.sections.remove(position))
    }
}

/// Keep `[pysrpm]` and `[pysrpm.*]` sections, dropping the prefix of the latter.
fn strip_prefixed_sections(sections: Vec<Section>) -> Vec<Section> {
    sections
        .into_iter()
        .filter_map(|section| {
            if section.name() == CONTROL_SECTION {
                return Some(section);
            }
            let name = section.name().strip_prefix(SECTION_PREFIX)?.to_string();
            let mut renamed = Section::new(name);
            renamed.merge(&section);
            Some(renamed)
        })
        .collect()
}

fn toml_to_string(origin: &str, key: &str, value: &toml::Value) -> Result<String, ConfigError> {
    let conflicting = |found: &'static str| ConfigError::ConflictingType {
        origin: origin.to_string(),
        key: key.to_string(),
        found,
    };

    Ok(match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(|| conflicting("an array with non-string items")))
            .collect::<Result<Vec<_>, _>>()?
            .join("\n"),
        toml::Value::Datetime(_) => return Err(conflicting("a datetime")),
        toml::Value::Table(_) => return Err(conflicting("a nested table")),
    })
}
