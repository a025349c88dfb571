use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use pysrpm_config::{Section, TEMPLATES_SECTION};
use pysrpm_template::PlaceholderResolver;
use pysrpm_types::{Dependency, DirectiveTag};

use crate::error::TranslationError;
use crate::evaluate::{MarkerEnvironment, Truth};
use crate::extras::ExtrasFilter;
use crate::rpm_version::rpm_requirement;

/// The package name template used when none is configured
pub const DEFAULT_PACKAGE_TEMPLATE: &str = "python3dist({name})";

/// Turns Python dependencies into RPM dependency directives.
#[derive(Debug, Clone)]
pub struct DependencyTranslator {
    environment_markers: IndexMap<String, String>,
    package_template: String,
}

impl DependencyTranslator {
    /// `package_template` maps a normalized distribution `{name}` to the name
    /// of the RPM capability providing it.
    pub fn new(
        environment_markers: IndexMap<String, String>,
        package_template: impl Into<String>,
    ) -> Self {
        Self {
            environment_markers,
            package_template: package_template.into(),
        }
    }

    /// The RPM capability for the Python distribution `name`
    pub fn package_name(&self, name: &str) -> Result<String, TranslationError> {
        let fields = HashMap::from([("name".to_string(), name.to_string())]);
        let empty = Section::new(TEMPLATES_SECTION);
        Ok(PlaceholderResolver::new(&fields, &empty, &empty).render(&self.package_template)?)
    }

    /// The RPM requirements of the dependencies that apply to this
    /// environment, without a directive tag. Duplicates are removed.
    pub fn requirements<S: AsRef<str>>(
        &self,
        dependencies: &[Dependency],
        extras_filter: &[S],
    ) -> Result<Vec<String>, TranslationError> {
        let extras = ExtrasFilter::new(extras_filter)?;
        let environment = MarkerEnvironment::new(&self.environment_markers, &extras);

        let mut requirements = IndexSet::new();
        for dependency in dependencies {
            if let Some(extra) = &dependency.extra
                && !extras.matches(extra)
            {
                tracing::debug!("Skipping '{dependency}', extra '{extra}' is not selected");
                continue;
            }

            if let Some(marker) = &dependency.marker {
                match environment.evaluate(marker) {
                    Truth::False => {
                        tracing::debug!("Skipping '{dependency}', marker does not apply");
                        continue;
                    }
                    Truth::Unknown => {
                        tracing::warn!(
                            "Cannot evaluate the marker of '{dependency}', keeping the dependency"
                        );
                    }
                    Truth::True => {}
                }
            }

            let package = self.package_name(&dependency.normalized_name())?;
            let requirement =
                rpm_requirement(&package, &dependency.to_string(), &dependency.specifiers)?;
            requirements.insert(requirement);
        }

        Ok(requirements.into_iter().collect())
    }

    /// One `<Tag>: <requirement>` line per dependency that applies.
    pub fn translate<S: AsRef<str>>(
        &self,
        dependencies: &[Dependency],
        extras_filter: &[S],
        tag: DirectiveTag,
    ) -> Result<Vec<String>, TranslationError> {
        Ok(self
            .requirements(dependencies, extras_filter)?
            .iter()
            .map(|requirement| tag.line(requirement))
            .collect())
    }
}

/// Translate `dependencies` with the default package template.
pub fn translate<S: AsRef<str>>(
    dependencies: &[Dependency],
    extras_filter: &[S],
    environment_markers: &IndexMap<String, String>,
    tag: DirectiveTag,
) -> Result<Vec<String>, TranslationError> {
    DependencyTranslator::new(environment_markers.clone(), DEFAULT_PACKAGE_TEMPLATE)
        .translate(dependencies, extras_filter, tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn dependencies(requirements: &[&str]) -> Vec<Dependency> {
        requirements.iter().map(|r| r.parse().unwrap()).collect()
    }

    fn posix() -> IndexMap<String, String> {
        IndexMap::from([("os_name".to_string(), "posix".to_string())])
    }

    #[rstest]
    #[case(&["*"], true)]
    #[case(&["test"], true)]
    #[case(&["docs"], false)]
    fn test_extras_filter(#[case] filter: &[&str], #[case] kept: bool) {
        let deps = dependencies(&["pytest>=7; extra == 'test'"]);
        let lines = translate(&deps, filter, &posix(), DirectiveTag::Requires).unwrap();
        let expected: Vec<String> = if kept {
            vec!["Requires: python3dist(pytest) >= 7".to_string()]
        } else {
            vec![]
        };
        assert_eq!(lines, expected);
    }

    #[rstest]
    #[case("colorama; os_name == 'nt'", false)]
    #[case("colorama; os_name == 'posix'", true)]
    #[case("colorama; sys_platform == 'win32'", true)]
    fn test_environment_markers(#[case] requirement: &str, #[case] kept: bool) {
        let deps = dependencies(&[requirement]);
        let lines = translate(&deps, &[] as &[&str], &posix(), DirectiveTag::Requires).unwrap();
        assert_eq!(lines.len(), usize::from(kept), "{requirement}");
    }

    #[test]
    fn test_order_and_duplicates() {
        let deps = dependencies(&[
            "zope.interface",
            "Attrs>=19.2",
            "zope-interface",
            "requests[socks] @ https://example.com/requests.tar.gz",
        ]);
        let lines = translate(&deps, &[] as &[&str], &posix(), DirectiveTag::Suggests).unwrap();
        assert_eq!(
            lines,
            vec![
                "Suggests: python3dist(zope-interface)",
                "Suggests: python3dist(attrs) >= 19.2",
                "Suggests: python3dist(requests)",
            ]
        );
    }

    #[test]
    fn test_package_template() {
        let translator = DependencyTranslator::new(posix(), "%{python_flavor}-{name}");
        let deps = dependencies(&["six>=1.4,<2"]);
        assert_eq!(
            translator.requirements(&deps, &[] as &[&str]).unwrap(),
            vec!["(%{python_flavor}-six >= 1.4 with %{python_flavor}-six < 2)"]
        );
    }

    #[test]
    fn test_invalid_specifier() {
        let deps = dependencies(&["foo~=5"]);
        let err = translate(&deps, &[] as &[&str], &posix(), DirectiveTag::Requires).unwrap_err();
        assert!(matches!(err, TranslationError::InvalidSpecifier { .. }));
    }
}
