use pysrpm_config::EffectiveConfig;
use pysrpm_template::PlaceholderResolver;
use pysrpm_types::PackageMetadata;

use crate::directives::DirectiveBlocks;
use crate::error::AssembleError;
use crate::fields::SpecFields;

/// The sections of a spec file, in the order they are written
pub const SECTION_ORDER: [&str; 14] = [
    "preamble",
    "description",
    "prep",
    "generate_buildrequires",
    "build",
    "install",
    "check",
    "clean",
    "pre",
    "post",
    "preun",
    "postun",
    "files",
    "changelog",
];

/// Render the spec file of the package described by `metadata`.
///
/// Each section of [`SECTION_ORDER`] with a template in `[templates]` is
/// rendered. Sections that render to nothing are left out entirely.
pub fn assemble(config: &EffectiveConfig, metadata: &PackageMetadata) -> Result<String, AssembleError> {
    let options = config.options()?;
    let blocks = DirectiveBlocks::collect(config, &options, metadata)?;

    let mut fields = SpecFields::new(metadata, &options.package_prefix);
    for (name, lines) in blocks.fields() {
        fields.insert_lines(name, lines);
    }

    let resolver =
        PlaceholderResolver::new(&fields, config.templates(), config.control()).with_config(config);

    let mut sections = Vec::new();
    for name in SECTION_ORDER {
        let Some(template) = config.get("templates", name) else {
            continue;
        };
        let lines = resolver
            .render_lines(template)
            .map_err(|source| AssembleError::Render {
                section: name.to_string(),
                source,
            })?;
        match format_section(name, lines) {
            Some(section) => sections.push(section),
            None => tracing::debug!("Skipping empty section '{name}'"),
        }
    }

    tracing::info!("Assembled spec file for {} {}", metadata.name, metadata.version);
    let mut spec = sections.join("\n\n");
    spec.push('\n');
    Ok(spec)
}

/// Lay out one rendered section, `None` if it has no content
fn format_section(name: &str, mut lines: Vec<String>) -> Option<String> {
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        return None;
    }

    if name == "preamble" {
        let start = lines.iter().position(|line| !line.trim().is_empty())?;
        return Some(lines[start..].join("\n"));
    }

    let first = lines.remove(0);
    let start = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .unwrap_or(lines.len());

    let mut out = format!("%{name}");
    if !first.trim().is_empty() {
        out.push(' ');
        out.push_str(first.trim());
    }
    for line in &lines[start..] {
        out.push('\n');
        out.push_str(line);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn lines(text: &str) -> Vec<String> {
        text.split('\n').map(str::to_string).collect()
    }

    #[rstest]
    #[case("preamble", "\n\nName: foo\nVersion: 1.0\n\n", Some("Name: foo\nVersion: 1.0"))]
    #[case("build", "\n%py3_build", Some("%build\n%py3_build"))]
    #[case("files", "-f INSTALLED_FILES\n%doc README", Some("%files -f INSTALLED_FILES\n%doc README"))]
    #[case("description", "\n\nFirst.\n\nSecond.\n", Some("%description\nFirst.\n\nSecond."))]
    #[case("changelog", "", None)]
    #[case("check", "\n  \n", None)]
    fn test_format_section(#[case] name: &str, #[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(format_section(name, lines(text)).as_deref(), expected);
    }
}
