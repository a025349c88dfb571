//! Assembly of RPM spec files.
//!
//! [`assemble`] renders the `[templates]` of an [`EffectiveConfig`] for one
//! package. Before rendering, the package metadata is extended with the
//! fields only known at this point:
//!
//! - `rpmname`, `rpmversion` and `sourcefile`
//! - `buildrequires`, `requires`, `suggests` and `provides`, the dependency
//!   directives, absent when there are none
//!
//! [`EffectiveConfig`]: pysrpm_config::EffectiveConfig

mod assemble;
mod directives;
mod error;
mod fields;

pub use assemble::{SECTION_ORDER, assemble};
pub use directives::DirectiveBlocks;
pub use error::AssembleError;
