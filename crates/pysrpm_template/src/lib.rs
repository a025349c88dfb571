//! The placeholder language of pysrpm templates.
//!
//! Templates are rendered line by line. Three kinds of placeholders exist:
//!
//! - `{name}` is a package metadata field
//! - `${key}` and `${section:key}` are configuration values, themselves
//!   rendered as templates
//! - `%{name}` is an RPM macro, copied as-is unless `name` is one of the
//!   configured macro aliases
//!
//! `%%`, `$$`, `{{` and `}}` produce the literal delimiter.

mod error;
mod render;
pub mod token;

pub use error::{Namespace, RenderError};
pub use render::PlaceholderResolver;
