//! Command-line options.

use std::{error::Error, path::PathBuf};

use clap::{Parser, crate_version};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use pysrpm_config::{CONTROL_SECTION, ConfigSource};

/// Convert Python source distributions into RPM spec files and packages.
///
/// Every option below overrides the `[pysrpm]` key of the same name (with
/// `-` replaced by `_`) from the presets and configuration files.
#[derive(Parser, Debug)]
#[clap(version = crate_version!())]
pub struct App {
    /// Source distributions (`.tar.gz`) or unpacked source trees
    #[arg(required = true, value_name = "SOURCES")]
    pub sources: Vec<PathBuf>,

    /// Target a specific linux flavour (fedora, rhel, opensuse, or a preset
    /// of the preset directory)
    #[arg(long)]
    pub flavour: Option<String>,

    /// Configuration file, instead of `pyproject.toml` or `setup.cfg` in the
    /// current directory
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Release of the RPM package
    #[arg(long, help_heading = "Package")]
    pub release: Option<String>,

    /// Prefix to the package name, e.g. `python3-`
    #[arg(long, help_heading = "Package")]
    pub package_prefix: Option<String>,

    /// Python executable used by the RPM build
    #[arg(long, help_heading = "Package")]
    pub python: Option<String>,

    /// An icon to copy next to the sources
    #[arg(long, help_heading = "Package")]
    pub icon: Option<PathBuf>,

    /// Tag of optional dependencies (Suggests, Recommends, ...), empty to
    /// disable them
    #[arg(long, help_heading = "Dependencies")]
    pub optional_dependency_tag: Option<String>,

    /// RPM packages to depend on
    #[arg(long, help_heading = "Dependencies")]
    pub requires: Option<String>,

    /// RPM packages to suggest
    #[arg(long, help_heading = "Dependencies")]
    pub suggests: Option<String>,

    /// Convert the Python dependencies into RPM dependencies
    #[arg(long, overrides_with = "no_extract_dependencies", help_heading = "Dependencies")]
    extract_dependencies: bool,

    #[arg(long, overrides_with = "extract_dependencies", hide = true)]
    no_extract_dependencies: bool,

    /// Extras whose dependencies are required (glob patterns)
    #[arg(long, help_heading = "Dependencies")]
    pub requires_extras: Option<String>,

    /// Extras whose dependencies are suggested (glob patterns)
    #[arg(long, help_heading = "Dependencies")]
    pub suggests_extras: Option<String>,

    /// Directory in which the rpmbuild tree is created
    #[arg(long, help_heading = "Output")]
    pub rpm_base: Option<PathBuf>,

    /// Directory for the final RPM or spec files
    #[arg(long, help_heading = "Output")]
    pub dest_dir: Option<PathBuf>,

    /// Only write the spec file
    #[arg(long, overrides_with = "no_spec_only", help_heading = "Output")]
    spec_only: bool,

    #[arg(long, overrides_with = "spec_only", hide = true)]
    no_spec_only: bool,

    /// Only build the source RPM
    #[arg(long, overrides_with = "no_source_only", help_heading = "Output")]
    source_only: bool,

    #[arg(long, overrides_with = "source_only", hide = true)]
    no_source_only: bool,

    /// Only build the binary RPMs
    #[arg(long, overrides_with = "no_binary_only", help_heading = "Output")]
    binary_only: bool,

    #[arg(long, overrides_with = "binary_only", hide = true)]
    no_binary_only: bool,

    /// Keep the rpmbuild tree after building
    #[arg(long, overrides_with = "no_keep_temp", help_heading = "Output")]
    keep_temp: bool,

    #[arg(long, overrides_with = "keep_temp", hide = true)]
    no_keep_temp: bool,

    /// Build everything but do not replace the target files. With
    /// `--spec-only` the spec file is printed instead.
    #[arg(long, overrides_with = "no_dry_run", help_heading = "Output")]
    dry_run: bool,

    #[arg(long, overrides_with = "dry_run", hide = true)]
    no_dry_run: bool,

    /// Set any configuration value, e.g. `--set templates.check=%pytest`
    #[arg(long = "set", value_name = "SECTION.KEY=VALUE", value_parser = parse_setting)]
    pub settings: Vec<(String, String, String)>,

    /// Enable verbose logging.
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

/// `Some(true)` for `--flag`, `Some(false)` for `--no-flag`
fn switch(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

impl App {
    /// The command line as the highest-priority configuration source
    pub fn overrides(&self) -> ConfigSource {
        let path = |p: &Option<PathBuf>| p.as_ref().map(|p| p.to_string_lossy().into_owned());
        let values = [
            ("flavour", self.flavour.clone()),
            ("release", self.release.clone()),
            ("package_prefix", self.package_prefix.clone()),
            ("python", self.python.clone()),
            ("icon", path(&self.icon)),
            ("optional_dependency_tag", self.optional_dependency_tag.clone()),
            ("requires", self.requires.clone()),
            ("suggests", self.suggests.clone()),
            (
                "extract_dependencies",
                switch(self.extract_dependencies, self.no_extract_dependencies).map(yes_no),
            ),
            ("requires_extras", self.requires_extras.clone()),
            ("suggests_extras", self.suggests_extras.clone()),
            ("rpm_base", path(&self.rpm_base)),
            ("dest_dir", path(&self.dest_dir)),
            ("spec_only", switch(self.spec_only, self.no_spec_only).map(yes_no)),
            ("source_only", switch(self.source_only, self.no_source_only).map(yes_no)),
            ("binary_only", switch(self.binary_only, self.no_binary_only).map(yes_no)),
            ("keep_temp", switch(self.keep_temp, self.no_keep_temp).map(yes_no)),
            ("dry_run", switch(self.dry_run, self.no_dry_run).map(yes_no)),
        ];

        let control = values
            .into_iter()
            .filter_map(|(key, value)| Some((CONTROL_SECTION, key, value?)));
        let settings = self
            .settings
            .iter()
            .map(|(section, key, value)| (section.as_str(), key.as_str(), value.clone()));

        ConfigSource::overrides("command line", control.chain(settings))
    }
}

/// Parse a `SECTION.KEY=VALUE` setting. `\n` in the value starts a new line.
fn parse_setting(
    s: &str,
) -> Result<(String, String, String), Box<dyn Error + Send + Sync + 'static>> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid SECTION.KEY=VALUE: no `=` found in `{s}`"))?;
    let (section, key) = name
        .split_once('.')
        .ok_or_else(|| format!("invalid SECTION.KEY=VALUE: no section in `{name}`"))?;
    if section.trim().is_empty() || key.trim().is_empty() {
        return Err(format!("invalid SECTION.KEY=VALUE: empty section or key in `{name}`").into());
    }
    Ok((
        section.trim().to_string(),
        key.trim().to_lowercase(),
        value.replace("\\n", "\n"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> App {
        App::try_parse_from(std::iter::once("pysrpm").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_map_to_control_keys() {
        let app = parse(&[
            "--flavour",
            "rhel",
            "--release",
            "3",
            "--no-extract-dependencies",
            "--spec-only",
            "--dest-dir",
            "out",
            "foo-1.0.tar.gz",
        ]);
        let source = app.overrides();
        let control = source.section("pysrpm").unwrap();

        assert_eq!(app.sources, vec![PathBuf::from("foo-1.0.tar.gz")]);
        assert_eq!(control.get("flavour"), Some("rhel"));
        assert_eq!(control.get("release"), Some("3"));
        assert_eq!(control.get("extract_dependencies"), Some("no"));
        assert_eq!(control.get("spec_only"), Some("yes"));
        assert_eq!(control.get("dest_dir"), Some("out"));
        assert_eq!(control.get("dry_run"), None);
        assert_eq!(control.len(), 5);
    }

    #[test]
    fn test_last_switch_wins() {
        let app = parse(&["--dry-run", "--no-dry-run", "foo"]);
        assert_eq!(app.overrides().section("pysrpm").unwrap().get("dry_run"), Some("no"));
    }

    #[test]
    fn test_settings() {
        let app = parse(&[
            "--set",
            "templates.check=%pytest\\n%pyproject_check_import",
            "--set",
            "pysrpm.Release=9",
            "--release",
            "2",
            "foo",
        ]);
        let source = app.overrides();

        assert_eq!(
            source.section("templates").unwrap().get("check"),
            Some("%pytest\n%pyproject_check_import")
        );
        assert_eq!(source.section("pysrpm").unwrap().get("release"), Some("9"));
    }

    #[test]
    fn test_invalid_setting() {
        assert!(App::try_parse_from(["pysrpm", "--set", "release=3", "foo"]).is_err());
        assert!(App::try_parse_from(["pysrpm"]).is_err());
    }
}
