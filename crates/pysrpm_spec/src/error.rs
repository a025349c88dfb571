use pysrpm_config::ConfigError;
use pysrpm_template::RenderError;
use pysrpm_translate::TranslationError;
use thiserror::Error;

#[cfg(feature = "miette")]
use miette::Diagnostic;

/// Errors that can occur while assembling a spec file
#[derive(Debug, Error)]
#[cfg_attr(feature = "miette", derive(Diagnostic))]
pub enum AssembleError {
    /// The control section holds an invalid value
    #[error(transparent)]
    #[cfg_attr(feature = "miette", diagnostic(transparent))]
    Config(#[from] ConfigError),

    /// A section template could not be rendered
    #[error("failed to render the {section} section")]
    Render {
        section: String,
        #[source]
        source: RenderError,
    },

    /// The dependencies of a directive block could not be translated
    #[error("failed to generate the {block} directives")]
    Directives {
        block: &'static str,
        #[source]
        source: TranslationError,
    },
}
