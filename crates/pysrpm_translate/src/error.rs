use pysrpm_template::RenderError;
use pysrpm_types::ParseRequirementError;
use thiserror::Error;

#[cfg(feature = "miette")]
use miette::Diagnostic;

/// Errors that can occur while translating dependencies
#[derive(Debug, Error)]
#[cfg_attr(feature = "miette", derive(Diagnostic))]
pub enum TranslationError {
    /// An extras filter is not a valid glob
    #[error("invalid extras pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// A version specifier has no RPM equivalent
    #[error("cannot translate '{specifier}' of '{dependency}': {message}")]
    InvalidSpecifier {
        dependency: String,
        specifier: String,
        message: String,
    },

    /// A requirement string could not be parsed
    #[error(transparent)]
    Requirement(#[from] ParseRequirementError),

    /// The package naming template failed to render
    #[error(transparent)]
    #[cfg_attr(feature = "miette", diagnostic(transparent))]
    Template(#[from] RenderError),
}
