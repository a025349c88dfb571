//! Layered merge of presets and user configuration.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::effective::EffectiveConfig;
use crate::error::ConfigError;
use crate::presets::{BASE_PRESET, builtin_preset};
use crate::section::Section;
use crate::source::ConfigSource;
use crate::{CONTROL_SECTION, MACROS_SECTION, PRESET_SECTION, TEMPLATES_SECTION};

/// Required keys, checked after all layers are merged
const REQUIRED_KEYS: &[(&str, &str)] = &[
    (CONTROL_SECTION, "release"),
    (CONTROL_SECTION, "package_prefix"),
    (CONTROL_SECTION, "extract_dependencies"),
    (CONTROL_SECTION, "optional_keys"),
    (TEMPLATES_SECTION, "preamble"),
    (TEMPLATES_SECTION, "python_package"),
];

/// Builds the [`EffectiveConfig`] of a run from the presets and the user's
/// configuration sources.
///
/// Layers are merged in this order, later layers replacing whole values of
/// earlier ones: the base preset, the flavour presets (ancestors first), then
/// the given sources in order.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    presets: IndexMap<String, String>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a preset under `name`. Registered presets shadow the
    /// built-in ones, including the base preset.
    pub fn with_preset(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.presets.insert(name.into(), text.into());
        self
    }

    /// Merge the presets with `sources` (lowest precedence first).
    pub fn load(&self, sources: &[ConfigSource]) -> Result<EffectiveConfig, ConfigError> {
        let base = self.preset_source(BASE_PRESET, None)?.ok_or_else(|| {
            ConfigError::UnknownFlavour(BASE_PRESET.to_string())
        })?;

        // The flavour is selected by the layers that do not depend on it
        let selection = merge_layers(std::iter::once(&base).chain(sources));
        let control = selection.get(CONTROL_SECTION);
        let flavour = control
            .and_then(|c| c.get("flavour"))
            .map(str::trim)
            .unwrap_or_default();
        let preset_dir = control
            .and_then(|c| c.get("preset_dir"))
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        let chain = self.resolve_flavour(flavour, preset_dir.as_deref(), sources)?;
        let flavours: Vec<String> = chain.iter().map(|f| f.name.clone()).collect();
        if !flavours.is_empty() {
            tracing::info!("Using flavour {}", flavours.join(" -> "));
        }

        let layers: Vec<&ConfigSource> = std::iter::once(&base)
            .chain(chain.iter().map(|f| &f.source))
            .chain(sources)
            .collect();
        let origins = layers.iter().map(|l| l.origin().to_string()).collect();

        let mut sections = merge_layers(layers.iter().copied());
        sections.shift_remove(PRESET_SECTION);
        for flavour in chain.iter().filter(|f| f.inline) {
            sections.shift_remove(flavour.name.as_str());
        }

        for (section, key) in REQUIRED_KEYS {
            if !sections.get(*section).is_some_and(|s| s.contains_key(key)) {
                return Err(ConfigError::MissingKey {
                    section: section.to_string(),
                    key: key.to_string(),
                });
            }
        }

        Ok(EffectiveConfig::new(sections, flavours, origins))
    }

    /// Resolve `flavour` to its preset chain, ancestors first. The base
    /// preset is never part of the chain.
    fn resolve_flavour(
        &self,
        flavour: &str,
        preset_dir: Option<&Path>,
        sources: &[ConfigSource],
    ) -> Result<Vec<Flavour>, ConfigError> {
        let mut chain: Vec<Flavour> = Vec::new();
        let mut visited: Vec<String> = Vec::new();
        let mut next = flavour.to_string();

        while !next.is_empty() && next != BASE_PRESET {
            if visited.contains(&next) {
                visited.push(next);
                return Err(ConfigError::InheritanceCycle { chain: visited });
            }
            visited.push(next.clone());

            let (mut source, inline) = match self.preset_source(&next, preset_dir)? {
                Some(source) => (source, false),
                None => {
                    let source = inline_flavour(&next, sources)
                        .ok_or_else(|| ConfigError::UnknownFlavour(next.clone()))?;
                    (source, true)
                }
            };
            let parent = source
                .take_section(PRESET_SECTION)
                .and_then(|preset| preset.get("inherits").map(|p| p.trim().to_string()))
                .unwrap_or_default();

            tracing::debug!("Resolved flavour '{}' from {}", next, source.origin());
            chain.push(Flavour {
                name: next,
                source,
                inline,
            });
            next = parent;
        }

        chain.reverse();
        Ok(chain)
    }

    /// Find a preset by name: `<preset_dir>/<name>.conf` first, then the
    /// registered and built-in presets.
    fn preset_source(
        &self,
        name: &str,
        preset_dir: Option<&Path>,
    ) -> Result<Option<ConfigSource>, ConfigError> {
        if let Some(dir) = preset_dir {
            let path = dir.join(format!("{name}.conf"));
            if !dir.is_dir() {
                tracing::warn!(
                    "Preset directory {} does not exist, looking for '{name}' elsewhere",
                    dir.display()
                );
            } else if !path.exists() {
                tracing::debug!("No preset {} in {}", path.display(), dir.display());
            }
            if path.exists() {
                let text = fs_err::read_to_string(&path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                return ConfigSource::from_ini_str(path.display().to_string(), &text).map(Some);
            }
        }

        let text = match self.presets.get(name) {
            Some(text) => text.as_str(),
            None => match builtin_preset(name) {
                Some(text) => text,
                None => return Ok(None),
            },
        };
        ConfigSource::from_ini_str(format!("<{name} preset>"), text).map(Some)
    }
}

/// One resolved link of a flavour chain
struct Flavour {
    name: String,
    source: ConfigSource,
    /// Declared as a section of the user's configuration
    inline: bool,
}

fn is_known_section(name: &str) -> bool {
    matches!(name, CONTROL_SECTION | TEMPLATES_SECTION | MACROS_SECTION)
}

/// A flavour declared as a section of the user's configuration: its keys
/// override `[templates]`, and an `inherits` key names its parent.
fn inline_flavour(name: &str, sources: &[ConfigSource]) -> Option<ConfigSource> {
    if is_known_section(name) {
        return None;
    }
    let merged = merge_layers(sources.iter());
    let section = merged.get(name)?;

    let mut templates = Section::new(TEMPLATES_SECTION);
    let mut preset = Section::new(PRESET_SECTION);
    for (key, value) in section.iter() {
        if key == "inherits" {
            preset.insert(key, value);
        } else {
            templates.insert(key, value);
        }
    }
    Some(ConfigSource::new(
        format!("[{name}] section"),
        vec![preset, templates],
    ))
}

fn merge_layers<'a>(layers: impl IntoIterator<Item = &'a ConfigSource>) -> IndexMap<String, Section> {
    let mut merged: IndexMap<String, Section> = IndexMap::new();
    for layer in layers {
        tracing::debug!(
            "Merging configuration layer {} ({} sections)",
            layer.origin(),
            layer.sections().len()
        );
        for section in layer.sections() {
            merged
                .entry(section.name().to_string())
                .or_insert_with(|| Section::new(section.name()))
                .merge(section);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MINIMAL_BASE: &str = "\
[pysrpm]
flavour =
release = 1
package_prefix =
extract_dependencies = no
optional_keys = summary

[templates]
preamble = Name: {name}
python_package = python3dist({name})
";

    fn ini(origin: &str, text: &str) -> ConfigSource {
        ConfigSource::from_ini_str(origin, text).unwrap()
    }

    #[tracing_test::traced_test]
    #[test]
    fn test_missing_preset_dir_is_reported() {
        let store = ConfigStore::new()
            .with_preset("base", MINIMAL_BASE)
            .with_preset("distro", "[templates]\nbuild = make\n");
        let user = ini(
            "user.cfg",
            "[pysrpm]\nflavour = distro\npreset_dir = /nonexistent/pysrpm-presets\n",
        );

        let config = store.load(&[user]).unwrap();
        assert_eq!(config.get("templates", "build"), Some("make"));
        assert!(logs_contain("/nonexistent/pysrpm-presets does not exist"));
    }

    #[test]
    fn test_user_beats_preset() {
        let store = ConfigStore::new()
            .with_preset("base", MINIMAL_BASE)
            .with_preset("distro", "[templates]\nbuild = make\ncheck = make check\n");
        let user = ini("user.cfg", "[pysrpm]\nflavour = distro\nrelease = 5\n[templates]\nbuild = ninja\n");

        let config = store.load(&[user]).unwrap();
        assert_eq!(config.get("pysrpm", "release"), Some("5"));
        assert_eq!(config.get("templates", "build"), Some("ninja"));
        assert_eq!(config.get("templates", "check"), Some("make check"));
        assert_eq!(config.flavours(), ["distro"]);
        assert_eq!(config.origins(), ["<base preset>", "<distro preset>", "user.cfg"]);
    }

    #[test]
    fn test_rightmost_source_wins() {
        let store = ConfigStore::new().with_preset("base", MINIMAL_BASE);
        let first = ini("first.cfg", "[pysrpm]\nrelease = 2\n");
        let second = ini("second.cfg", "[pysrpm]\nrelease = 3\n");
        let config = store.load(&[first.clone(), second.clone()]).unwrap();
        assert_eq!(config.get("pysrpm", "release"), Some("3"));
        let config = store.load(&[second, first]).unwrap();
        assert_eq!(config.get("pysrpm", "release"), Some("2"));
    }

    #[test]
    fn test_inheritance_ancestors_first() {
        let store = ConfigStore::new()
            .with_preset("base", MINIMAL_BASE)
            .with_preset("parent", "[templates]\nbuild = parent\ncheck = parent\n")
            .with_preset("child", "[preset]\ninherits = parent\n[templates]\nbuild = child\n");
        let user = ini("user.cfg", "[pysrpm]\nflavour = child\n");

        let config = store.load(&[user]).unwrap();
        assert_eq!(config.get("templates", "build"), Some("child"));
        assert_eq!(config.get("templates", "check"), Some("parent"));
        assert_eq!(config.flavours(), ["parent", "child"]);
        assert!(config.section("preset").is_none());
    }

    #[test]
    fn test_inheritance_cycle() {
        let store = ConfigStore::new()
            .with_preset("base", MINIMAL_BASE)
            .with_preset("a", "[preset]\ninherits = b\n")
            .with_preset("b", "[preset]\ninherits = a\n");
        let user = ini("user.cfg", "[pysrpm]\nflavour = a\n");

        let err = store.load(&[user]).unwrap_err();
        match err {
            ConfigError::InheritanceCycle { chain } => assert_eq!(chain, vec!["a", "b", "a"]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_unknown_flavour() {
        let store = ConfigStore::new().with_preset("base", MINIMAL_BASE);
        let user = ini("user.cfg", "[pysrpm]\nflavour = nosuch\n");
        assert!(matches!(
            store.load(&[user]),
            Err(ConfigError::UnknownFlavour(name)) if name == "nosuch"
        ));
    }

    #[test]
    fn test_inline_flavour_section() {
        let store = ConfigStore::new().with_preset("base", MINIMAL_BASE);
        let user = ini(
            "user.cfg",
            "[pysrpm]\nflavour = test\n[test]\npython_package = python-{name}\n",
        );
        let config = store.load(&[user]).unwrap();
        assert_eq!(config.get("templates", "python_package"), Some("python-{name}"));
        assert!(config.section("test").is_none());
    }

    #[test]
    fn test_missing_required_key() {
        let store = ConfigStore::new().with_preset("base", "[pysrpm]\nrelease = 1\n");
        assert!(matches!(
            store.load(&[]),
            Err(ConfigError::MissingKey { key, .. }) if key == "package_prefix"
        ));
    }
}
