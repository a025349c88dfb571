use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::options::ControlOptions;
use crate::section::Section;
use crate::{CONTROL_SECTION, MACROS_SECTION, TEMPLATES_SECTION};

/// The merged configuration of a run.
///
/// Produced once by [`crate::ConfigStore::load`] and read-only afterwards.
/// The control, templates and macros sections always exist, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    sections: IndexMap<String, Section>,
    flavours: Vec<String>,
    origins: Vec<String>,
}

impl EffectiveConfig {
    pub(crate) fn new(
        mut sections: IndexMap<String, Section>,
        flavours: Vec<String>,
        origins: Vec<String>,
    ) -> Self {
        for name in [CONTROL_SECTION, TEMPLATES_SECTION, MACROS_SECTION] {
            sections
                .entry(name.to_string())
                .or_insert_with(|| Section::new(name));
        }
        Self {
            sections,
            flavours,
            origins,
        }
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section).and_then(|s| s.get(key))
    }

    /// The `[pysrpm]` section
    pub fn control(&self) -> &Section {
        &self.sections[CONTROL_SECTION]
    }

    /// The `[templates]` section
    pub fn templates(&self) -> &Section {
        &self.sections[TEMPLATES_SECTION]
    }

    /// The `[macros]` section
    pub fn macros(&self) -> &Section {
        &self.sections[MACROS_SECTION]
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    /// The flavour chain that was applied, ancestors first
    pub fn flavours(&self) -> &[String] {
        &self.flavours
    }

    /// Origins of the merged layers, lowest precedence first
    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    /// Typed view of the control section
    pub fn options(&self) -> Result<ControlOptions, ConfigError> {
        ControlOptions::from_section(self.control())
    }
}
