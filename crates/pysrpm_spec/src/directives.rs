//! The dependency directive blocks of the preamble.

use indexmap::IndexSet;
use pysrpm_config::{ControlOptions, EffectiveConfig};
use pysrpm_translate::{DependencyTranslator, TranslationError, rpm_requirement};
use pysrpm_types::{
    DirectiveTag, Operator, PackageMetadata, Specifier, normalize_name, parse_specifiers,
};

use crate::error::AssembleError;

/// The rendered `BuildRequires`, `Requires`, optional dependency and
/// `Provides` lines. An empty block is absent from the spec.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectiveBlocks {
    pub buildrequires: Vec<String>,
    pub requires: Vec<String>,
    pub suggests: Vec<String>,
    pub provides: Vec<String>,
}

impl DirectiveBlocks {
    pub fn collect(
        config: &EffectiveConfig,
        options: &ControlOptions,
        metadata: &PackageMetadata,
    ) -> Result<Self, AssembleError> {
        let translator = DependencyTranslator::new(
            options.environment_markers.clone(),
            template(config, "python_package"),
        );
        let no_extras: &[&str] = &[];

        let buildrequires = translator
            .translate(&metadata.build_requires, no_extras, DirectiveTag::BuildRequires)
            .map_err(in_block("BuildRequires"))?;

        let mut required = IndexSet::new();
        required.extend(options.requires.iter().cloned());
        if options.extract_dependencies {
            required.extend(
                translator
                    .requirements(&metadata.dependencies, &options.requires_extras)
                    .map_err(in_block("Requires"))?,
            );
        }
        if let Some(abi) = python_abi(template(config, "python_abi"), options, metadata)
            .map_err(in_block("Requires"))?
        {
            required.insert(abi);
        }

        let suggests = match options.optional_dependency_tag {
            Some(tag) => {
                let mut optional = IndexSet::new();
                optional.extend(options.suggests.iter().cloned());
                if options.extract_dependencies {
                    optional.extend(
                        translator
                            .requirements(&metadata.dependencies, &options.suggests_extras)
                            .map_err(in_block(tag.as_str()))?,
                    );
                }
                optional
                    .iter()
                    .filter(|requirement| !required.contains(*requirement))
                    .map(|requirement| tag.line(requirement))
                    .collect()
            }
            None => Vec::new(),
        };

        let python_dist = template(config, "python_dist");
        let provides = if python_dist.is_empty() {
            Vec::new()
        } else {
            let capability = DependencyTranslator::new(Default::default(), python_dist)
                .package_name(&normalize_name(&metadata.name))
                .map_err(in_block("Provides"))?;
            let version = metadata.version.replace('-', "_");
            vec![DirectiveTag::Provides.line(&format!("{capability} = {version}"))]
        };

        Ok(Self {
            buildrequires,
            requires: required
                .iter()
                .map(|requirement| DirectiveTag::Requires.line(requirement))
                .collect(),
            suggests,
            provides,
        })
    }

    /// The blocks by the name of the field they are exposed as
    pub fn fields(&self) -> [(&'static str, &[String]); 4] {
        [
            ("buildrequires", &self.buildrequires),
            ("requires", &self.requires),
            ("suggests", &self.suggests),
            ("provides", &self.provides),
        ]
    }
}

fn template<'c>(config: &'c EffectiveConfig, key: &str) -> &'c str {
    config.get("templates", key).unwrap_or_default().trim()
}

fn in_block(block: &'static str) -> impl FnOnce(TranslationError) -> AssembleError {
    move |source| AssembleError::Directives { block, source }
}

/// The requirement on the Python ABI, from the configured `python_version`
/// or else the package's `Requires-Python`
fn python_abi(
    template: &str,
    options: &ControlOptions,
    metadata: &PackageMetadata,
) -> Result<Option<String>, TranslationError> {
    if template.is_empty() {
        return Ok(None);
    }
    let specifiers = match (&options.python_version, &metadata.requires_python) {
        (Some(version), _) if version.starts_with(|c: char| c.is_ascii_digit()) => {
            vec![Specifier::new(Operator::Equal, version.as_str())]
        }
        (Some(version), _) => parse_specifiers(version)?,
        (None, Some(requires_python)) => parse_specifiers(requires_python)?,
        (None, None) => return Ok(None),
    };
    if specifiers.is_empty() {
        return Ok(None);
    }
    let abi = DependencyTranslator::new(Default::default(), template).package_name("python")?;
    Ok(Some(rpm_requirement(&abi, "python", &specifiers)?))
}
