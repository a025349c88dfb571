//! Convert Python source distributions into RPM spec files and packages.
//!
//! The package metadata is read from the `PKG-INFO` file of a source
//! distribution, the configuration is merged from the built-in flavour
//! presets, the user configuration file and the command line, and the spec
//! file is assembled from the `[templates]` section. Unless only the spec
//! file is requested, `rpmbuild` then builds the packages.

pub mod console_utils;
pub mod discovery;
pub mod metadata;
pub mod opt;
pub mod rpmbuild;

use std::path::Path;

use indicatif::MultiProgress;
use miette::{IntoDiagnostic, WrapErr};
use pysrpm_config::{ConfigStore, ControlOptions, EffectiveConfig};

use crate::{
    discovery::discover_config,
    metadata::{apply_configuration, load_source_metadata},
    opt::App,
    rpmbuild::RpmBuilder,
};

/// Load the configuration for `app` with the configuration file discovered
/// in `dir`
pub fn load_configuration(app: &App, dir: &Path) -> miette::Result<EffectiveConfig> {
    let mut sources = Vec::new();
    if let Some(source) = discover_config(app.config.as_deref(), dir)? {
        sources.push(source);
    }
    sources.push(app.overrides());
    Ok(ConfigStore::new().load(&sources)?)
}

/// Generate the spec file of `source` and build it as configured
pub fn convert_source(
    config: &EffectiveConfig,
    options: &ControlOptions,
    source: &Path,
    builder: Option<&RpmBuilder<'_>>,
) -> miette::Result<()> {
    let mut metadata = load_source_metadata(source)?;
    apply_configuration(&mut metadata, options)?;
    let spec = pysrpm_spec::assemble(config, &metadata)
        .wrap_err_with(|| format!("failed to generate the spec file of {}", source.display()))?;

    match builder {
        Some(builder) => {
            builder.build(&spec, &metadata, source)?;
        }
        None if options.dry_run => print!("{spec}"),
        None => {
            let rpmname = format!("{}{}", options.package_prefix, metadata.name);
            fs_err::create_dir_all(&options.dest_dir).into_diagnostic()?;
            let path = options.dest_dir.join(format!("{rpmname}.spec"));
            fs_err::write(&path, spec).into_diagnostic()?;
            tracing::info!("Wrote {}", path.display());
        }
    }
    Ok(())
}

/// Run pysrpm for every source of `app`
pub fn run(app: App, multi_progress: MultiProgress) -> miette::Result<()> {
    let cwd = std::env::current_dir().into_diagnostic()?;
    let config = load_configuration(&app, &cwd)?;
    let options = config.options()?;

    let builder = if options.spec_only {
        None
    } else {
        Some(RpmBuilder::new(&options, multi_progress)?)
    };

    for source in &app.sources {
        convert_source(&config, &options, source, builder.as_ref())?;
    }
    Ok(())
}
