//! Shared data model for pysrpm: the package metadata record consumed by the
//! spec generator and the PEP 508 dependency types it translates.

mod directive;
mod error;
pub mod marker;
pub mod metadata;
mod normalize;
mod pkg_info;
pub mod requirement;
pub mod specifier;

pub use directive::{DirectiveTag, UnknownDirectiveTag};
pub use error::{MetadataError, ParseRequirementError};
pub use marker::{MarkerExpression, MarkerOperator, MarkerTree, MarkerValue, MarkerVariable};
pub use metadata::{FieldLookup, PackageMetadata};
pub use normalize::{normalize_field, normalize_name};
pub use requirement::Dependency;
pub use specifier::{Operator, Specifier, parse_specifiers};
