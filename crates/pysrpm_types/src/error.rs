//! Error types for parsing package metadata and requirements

use thiserror::Error;

/// Errors that can occur while parsing a PEP 508 requirement string
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseRequirementError {
    /// The requirement as a whole is malformed
    #[error("invalid requirement '{requirement}': {message}")]
    InvalidRequirement { requirement: String, message: String },

    /// A version specifier has an unknown operator or an unparsable version
    #[error("invalid version specifier '{specifier}': {message}")]
    InvalidSpecifier { specifier: String, message: String },

    /// An environment marker could not be parsed
    #[error("invalid environment marker '{marker}': {message}")]
    InvalidMarker { marker: String, message: String },
}

/// Errors that can occur while reading a `PKG-INFO` document
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A mandatory header is missing
    #[error("package metadata is missing the '{0}' header")]
    MissingHeader(&'static str),

    /// A `Requires-Dist` entry could not be parsed
    #[error(transparent)]
    Requirement(#[from] ParseRequirementError),
}
