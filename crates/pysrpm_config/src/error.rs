//! Error types for loading and merging configuration

use std::path::PathBuf;
use thiserror::Error;

#[cfg(feature = "miette")]
use miette::Diagnostic;

/// Errors that can occur while reading, merging or validating configuration
#[derive(Debug, Error)]
#[cfg_attr(feature = "miette", derive(Diagnostic))]
pub enum ConfigError {
    /// A line of an INI source could not be parsed
    #[error("{origin}:{line}: {message}")]
    Parse {
        origin: String,
        line: usize,
        message: String,
    },

    /// The same section header appears twice in one source
    #[error("{origin}:{line}: section '{section}' is already defined")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(help("merge both sections into one, keys of later files override earlier ones"))
    )]
    DuplicateSection {
        origin: String,
        line: usize,
        section: String,
    },

    /// The same key appears twice in one section of one source
    #[error("{origin}:{line}: key '{key}' is already defined in section '{section}'")]
    DuplicateKey {
        origin: String,
        line: usize,
        section: String,
        key: String,
    },

    /// A configuration or preset file could not be read
    #[error("Could not read configuration file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `pyproject.toml` is not valid TOML
    #[error("Could not parse {origin}")]
    Toml {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    /// A `[tool.pysrpm]` value has a type that cannot be expressed as a string
    #[error("{origin}: '{key}' must be a string, number, boolean or list of strings, found {found}")]
    ConflictingType {
        origin: String,
        key: String,
        found: &'static str,
    },

    /// The requested flavour is neither a file in `preset_dir` nor a built-in preset
    #[error("unknown flavour '{0}'")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(help("built-in flavours are: fedora, opensuse, rhel"))
    )]
    UnknownFlavour(String),

    /// Presets inherit from each other in a loop
    #[error("preset inheritance cycle: {}", chain.join(" -> "))]
    InheritanceCycle { chain: Vec<String> },

    /// A key required by the spec generator is missing after merging
    #[error("missing required key '{key}' in section [{section}]")]
    MissingKey { section: String, key: String },

    /// A value could not be interpreted
    #[error("invalid value '{value}' for '{key}': {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}
