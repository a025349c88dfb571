//! Configuration for pysrpm.
//!
//! Configuration is read from INI files, `setup.cfg`, `pyproject.toml` and the
//! command line, and merged on top of built-in presets into a single
//! [`EffectiveConfig`]. The `[pysrpm]` section controls the run, `[templates]`
//! holds one template per spec file section and `[macros]` holds RPM macro
//! aliases.

mod effective;
mod error;
mod ini;
mod options;
pub mod presets;
mod section;
mod source;
mod store;

pub use effective::EffectiveConfig;
pub use error::ConfigError;
pub use options::{ControlOptions, parse_bool, parse_environment_markers};
pub use section::Section;
pub use source::ConfigSource;
pub use store::ConfigStore;

/// The control section
pub const CONTROL_SECTION: &str = "pysrpm";
/// The section holding spec file section templates
pub const TEMPLATES_SECTION: &str = "templates";
/// The section holding RPM macro aliases
pub const MACROS_SECTION: &str = "macros";
/// Preset metadata, never part of the effective configuration
pub const PRESET_SECTION: &str = "preset";
