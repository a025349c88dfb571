//! Translation of Python (PEP 508) dependencies into RPM dependency
//! directives.
//!
//! Dependencies are filtered by the extras they belong to and by their
//! environment markers, evaluated against a fixed table of marker values.
//! Markers that cannot be decided from that table keep the dependency.

mod error;
mod evaluate;
mod extras;
mod rpm_version;
mod translate;

pub use error::TranslationError;
pub use evaluate::{MarkerEnvironment, Truth};
pub use extras::ExtrasFilter;
pub use rpm_version::rpm_requirement;
pub use translate::{DEFAULT_PACKAGE_TEMPLATE, DependencyTranslator, translate};
