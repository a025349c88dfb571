use std::fmt::{self, Display, Formatter};

use thiserror::Error;

#[cfg(feature = "miette")]
use miette::Diagnostic;

/// Where a placeholder is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// `{name}`
    Metadata,
    /// `${name}` and `${section:name}`
    Config,
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Metadata => f.write_str("metadata field"),
            Namespace::Config => f.write_str("configuration key"),
        }
    }
}

/// Errors that can occur while rendering a template
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "miette", derive(Diagnostic))]
pub enum RenderError {
    /// A placeholder that is neither present nor optional
    #[error("line {line}: unknown {namespace} '{name}' in `{text}`")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(help("add the key to `optional_keys` to drop lines where it is missing"))
    )]
    MissingField {
        namespace: Namespace,
        name: String,
        line: usize,
        text: String,
    },

    /// Configuration values that reference each other
    #[error("configuration values reference each other: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    /// Malformed placeholder syntax
    #[error("line {line}: {message} in `{text}`")]
    #[cfg_attr(
        feature = "miette",
        diagnostic(help("write `%%`, `$$`, `{{{{` or `}}}}` for literal delimiters"))
    )]
    Syntax {
        message: String,
        line: usize,
        text: String,
    },
}
