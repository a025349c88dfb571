//! Building source and binary RPMs with `rpmbuild`.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
    time::Duration,
};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use itertools::Itertools;
use miette::Diagnostic;
use pysrpm_config::ControlOptions;
use pysrpm_types::PackageMetadata;
use tempfile::TempDir;
use thiserror::Error;

/// The directories `rpmbuild` expects below `_topdir`
const TREE_DIRS: [&str; 6] = ["BUILD", "BUILDROOT", "RPMS", "SOURCES", "SPECS", "SRPMS"];

/// Query format giving the path of every binary RPM below `RPMS/`
const QUERY_FORMAT: &str = "%{arch}/%{name}-%{version}-%{release}.%{arch}.rpm\\n";

/// Errors that can occur while building RPMs
#[derive(Debug, Error, Diagnostic)]
pub enum RpmBuildError {
    #[error("could not find `{tool}`")]
    #[diagnostic(help("install the `rpm-build` package of your distribution, or use --spec-only"))]
    ToolNotFound {
        tool: &'static str,
        #[source]
        source: which::Error,
    },

    #[error("failed to run `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed ({status}):\n{stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("expected {} was not built", .0.display())]
    MissingOutput(PathBuf),

    #[error("`rpm -q --specfile` did not name the source RPM of {}", .0.display())]
    #[diagnostic(help("check the Name, Version and Release lines of the spec file"))]
    UnknownSourceRpm(PathBuf),

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> RpmBuildError + '_ {
    move |source| RpmBuildError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Which packages `rpmbuild` produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Only the source RPM (`-bs`)
    Source,
    /// Only the binary RPMs (`-bb`)
    Binary,
    /// Both (`-ba`)
    All,
}

impl BuildMode {
    pub fn from_options(options: &ControlOptions) -> Self {
        if options.source_only {
            BuildMode::Source
        } else if options.binary_only {
            BuildMode::Binary
        } else {
            BuildMode::All
        }
    }

    fn flag(self) -> &'static str {
        match self {
            BuildMode::Source => "-bs",
            BuildMode::Binary => "-bb",
            BuildMode::All => "-ba",
        }
    }

    fn source(self) -> bool {
        self != BuildMode::Binary
    }

    fn binary(self) -> bool {
        self != BuildMode::Source
    }
}

/// A temporary `_topdir` for `rpmbuild`. It is removed on drop unless it
/// was created to be kept.
pub struct RpmTree {
    root: PathBuf,
    _temp_dir: Option<TempDir>,
}

impl RpmTree {
    /// Create the tree in `base`, or in the system temp directory
    pub fn create(base: Option<&Path>, keep: bool) -> Result<Self, RpmBuildError> {
        let builder = {
            let mut builder = tempfile::Builder::new();
            builder.prefix("pysrpm-");
            builder
        };
        let temp_dir = match base {
            Some(base) => {
                fs_err::create_dir_all(base).map_err(io_error(base))?;
                builder.tempdir_in(base).map_err(io_error(base))?
            }
            None => {
                let temp = std::env::temp_dir();
                builder.tempdir_in(&temp).map_err(io_error(&temp))?
            }
        };

        let root = temp_dir.path().to_path_buf();
        for dir in TREE_DIRS {
            let path = root.join(dir);
            fs_err::create_dir_all(&path).map_err(io_error(&path))?;
        }

        if keep {
            let root = temp_dir.keep();
            tracing::info!("Keeping the rpmbuild tree in {}", root.display());
            Ok(Self {
                root,
                _temp_dir: None,
            })
        } else {
            Ok(Self {
                root,
                _temp_dir: Some(temp_dir),
            })
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

/// Runs `rpm` and `rpmbuild` for one configuration
pub struct RpmBuilder<'a> {
    options: &'a ControlOptions,
    multi_progress: MultiProgress,
    rpm: PathBuf,
    rpmbuild: PathBuf,
}

impl<'a> RpmBuilder<'a> {
    pub fn new(
        options: &'a ControlOptions,
        multi_progress: MultiProgress,
    ) -> Result<Self, RpmBuildError> {
        let find = |tool: &'static str| {
            which::which(tool).map_err(|source| RpmBuildError::ToolNotFound { tool, source })
        };
        Ok(Self {
            options,
            multi_progress,
            rpm: find("rpm")?,
            rpmbuild: find("rpmbuild")?,
        })
    }

    /// Build the RPMs of `spec` from `source`, a source distribution or a
    /// source tree, and return the built files. They are moved to the
    /// destination directory unless this is a dry run.
    pub fn build(
        &self,
        spec: &str,
        metadata: &PackageMetadata,
        source: &Path,
    ) -> Result<Vec<PathBuf>, RpmBuildError> {
        let mode = BuildMode::from_options(self.options);
        let rpmname = format!("{}{}", self.options.package_prefix, metadata.name);
        let tree = RpmTree::create(self.options.rpm_base.as_deref(), self.options.keep_temp)?;

        let spec_file = tree.dir("SPECS").join(format!("{rpmname}.spec"));
        fs_err::write(&spec_file, spec).map_err(io_error(&spec_file))?;

        let query = self.run(
            &self.rpm,
            [
                OsStr::new("-q"),
                OsStr::new("--qf"),
                OsStr::new(QUERY_FORMAT),
                OsStr::new("--specfile"),
                spec_file.as_os_str(),
            ],
        )?;
        let (binaries, source_rpm) = expected_outputs(&query);
        let source_rpm = required_source_rpm(mode, source_rpm, &spec_file)?;

        self.stage_sources(&tree, metadata, source)?;

        let spinner = self.multi_progress.add(
            ProgressBar::new_spinner()
                .with_style(
                    ProgressStyle::with_template("{spinner:.green} {prefix:.bold} {wide_msg:.dim}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                )
                .with_prefix("rpmbuild")
                .with_message(format!("building {rpmname}")),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        let topdir = format!("_topdir {}", tree.root().display());
        let python = format!("__python {}", self.options.python);
        let mut args = vec![
            OsStr::new(mode.flag()),
            OsStr::new("--define"),
            OsStr::new(&topdir),
            OsStr::new("--define"),
            OsStr::new(&python),
        ];
        if !self.options.keep_temp {
            args.push(OsStr::new("--clean"));
        }
        args.push(spec_file.as_os_str());
        let result = self.run(&self.rpmbuild, args);
        spinner.finish_and_clear();
        result?;

        let mut outputs = Vec::new();
        if mode.source()
            && let Some(srpm) = source_rpm
        {
            let path = tree.dir("SRPMS").join(srpm);
            if !path.exists() {
                return Err(RpmBuildError::MissingOutput(path));
            }
            outputs.push(path);
        }
        if mode.binary() {
            let built: Vec<PathBuf> = binaries
                .iter()
                .map(|rpm| tree.dir("RPMS").join(rpm))
                .filter(|path| path.exists())
                .collect();
            if built.is_empty() {
                let expected = binaries.first().map(|rpm| tree.dir("RPMS").join(rpm));
                return Err(RpmBuildError::MissingOutput(
                    expected.unwrap_or_else(|| tree.dir("RPMS")),
                ));
            }
            outputs.extend(built);
        }

        if self.options.dry_run {
            tracing::info!("Dry run, not copying {} built package(s)", outputs.len());
            return Ok(outputs);
        }

        let dest_dir = &self.options.dest_dir;
        fs_err::create_dir_all(dest_dir).map_err(io_error(dest_dir))?;
        outputs
            .into_iter()
            .map(|path| {
                let file_name = path.file_name().unwrap_or_default();
                let target = dest_dir.join(file_name);
                move_file(&path, &target)?;
                tracing::info!("Wrote {}", target.display());
                Ok(target)
            })
            .collect()
    }

    /// Put the source archive (and icon) into `SOURCES`
    fn stage_sources(
        &self,
        tree: &RpmTree,
        metadata: &PackageMetadata,
        source: &Path,
    ) -> Result<(), RpmBuildError> {
        let sources = tree.dir("SOURCES");
        if source.is_dir() {
            let prefix = format!("{}-{}", metadata.name, metadata.version);
            let archive = sources.join(
                metadata
                    .source_file
                    .clone()
                    .unwrap_or_else(|| format!("{prefix}.tar.gz")),
            );
            create_sdist(source, &prefix, &archive).map_err(io_error(&archive))?;
        } else {
            let target = sources.join(source.file_name().unwrap_or_default());
            fs_err::copy(source, &target).map_err(io_error(&target))?;
        }

        if let Some(icon) = &self.options.icon {
            let target = sources.join(icon.file_name().unwrap_or_default());
            fs_err::copy(icon, &target).map_err(io_error(icon))?;
        }
        Ok(())
    }

    /// Run `program` and return its standard output
    fn run<'s>(
        &self,
        program: &Path,
        args: impl IntoIterator<Item = &'s OsStr>,
    ) -> Result<String, RpmBuildError> {
        let args: Vec<&OsStr> = args.into_iter().collect();
        let command = std::iter::once(program.as_os_str())
            .chain(args.iter().copied())
            .map(|arg| quote(&arg.to_string_lossy()))
            .join(" ");
        tracing::debug!("Running {command}");

        let output = Command::new(program)
            .args(&args)
            .output()
            .map_err(|source| RpmBuildError::Spawn {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(RpmBuildError::Failed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Quote `arg` for display in a shell command line
fn quote(arg: &str) -> String {
    if !arg.contains(char::is_whitespace) {
        arg.to_string()
    } else if !arg.contains('\'') {
        format!("'{arg}'")
    } else {
        format!("\"{arg}\"")
    }
}

/// The binary RPMs (relative to `RPMS/`) listed by `rpm -q --specfile`, and
/// the source RPM named after the first of them
fn expected_outputs(query: &str) -> (Vec<PathBuf>, Option<String>) {
    let binaries: Vec<PathBuf> = query
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect();

    let source_rpm = binaries
        .first()
        .and_then(|rpm| rpm.file_name()?.to_str()?.strip_suffix(".rpm"))
        .and_then(|stem| stem.rsplit_once('.'))
        .map(|(nevr, _arch)| format!("{nevr}.src.rpm"));

    (binaries, source_rpm)
}

/// The source RPM name, which must be known when building one
fn required_source_rpm(
    mode: BuildMode,
    source_rpm: Option<String>,
    spec_file: &Path,
) -> Result<Option<String>, RpmBuildError> {
    match source_rpm {
        None if mode.source() => Err(RpmBuildError::UnknownSourceRpm(spec_file.to_path_buf())),
        source_rpm => Ok(source_rpm),
    }
}

/// Pack the source tree `dir` into a gzipped tarball below `prefix/`
fn create_sdist(dir: &Path, prefix: &str, archive: &Path) -> std::io::Result<()> {
    let file = fs_err::File::create(archive)?;
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(prefix, dir)?;
    builder.into_inner()?.finish()?;
    Ok(())
}

/// Rename `from` to `to`, copying when they are on different file systems
fn move_file(from: &Path, to: &Path) -> Result<(), RpmBuildError> {
    if fs_err::rename(from, to).is_ok() {
        return Ok(());
    }
    fs_err::copy(from, to).map_err(io_error(to))?;
    fs_err::remove_file(from).map_err(io_error(from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expected_outputs() {
        let query = "noarch/python3-foo-1.0-1.fc40.noarch.rpm\nnoarch/python3-foo-doc-1.0-1.fc40.noarch.rpm\n";
        let (binaries, source) = expected_outputs(query);

        assert_eq!(
            binaries,
            vec![
                PathBuf::from("noarch/python3-foo-1.0-1.fc40.noarch.rpm"),
                PathBuf::from("noarch/python3-foo-doc-1.0-1.fc40.noarch.rpm"),
            ]
        );
        assert_eq!(source.as_deref(), Some("python3-foo-1.0-1.fc40.src.rpm"));
        assert_eq!(expected_outputs(""), (vec![], None));
    }

    #[test]
    fn test_source_rpm_is_required_unless_binary_only() {
        let spec = Path::new("SPECS/python3-foo.spec");

        assert!(matches!(
            required_source_rpm(BuildMode::All, None, spec),
            Err(RpmBuildError::UnknownSourceRpm(_))
        ));
        assert!(matches!(
            required_source_rpm(BuildMode::Source, None, spec),
            Err(RpmBuildError::UnknownSourceRpm(_))
        ));
        assert_eq!(required_source_rpm(BuildMode::Binary, None, spec).unwrap(), None);
        assert_eq!(
            required_source_rpm(BuildMode::Source, Some("foo-1.0-1.src.rpm".into()), spec)
                .unwrap()
                .as_deref(),
            Some("foo-1.0-1.src.rpm")
        );
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("-ba"), "-ba");
        assert_eq!(quote("_topdir /tmp/x"), "'_topdir /tmp/x'");
        assert_eq!(quote("it's here"), "\"it's here\"");
    }

    #[test]
    fn test_tree_is_removed_unless_kept() {
        let base = tempfile::tempdir().unwrap();

        let tree = RpmTree::create(Some(base.path()), false).unwrap();
        let root = tree.root().to_path_buf();
        assert!(root.join("SPECS").is_dir());
        assert!(root.join("SRPMS").is_dir());
        drop(tree);
        assert!(!root.exists());

        let kept = RpmTree::create(Some(base.path()), true).unwrap();
        let root = kept.root().to_path_buf();
        drop(kept);
        assert!(root.join("SOURCES").is_dir());
    }

    #[test]
    fn test_create_sdist() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("tree");
        fs_err::create_dir_all(tree.join("foo")).unwrap();
        fs_err::write(tree.join("PKG-INFO"), "Name: foo\nVersion: 1.0\n").unwrap();
        fs_err::write(tree.join("foo/__init__.py"), "").unwrap();

        let archive = dir.path().join("foo-1.0.tar.gz");
        create_sdist(&tree, "foo-1.0", &archive).unwrap();

        let file = fs_err::File::open(&archive).unwrap();
        let mut names: Vec<String> = tar::Archive::new(flate2::read::GzDecoder::new(file))
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .filter(|name| !name.ends_with('/'))
            .collect();
        names.sort();
        assert!(names.contains(&"foo-1.0/PKG-INFO".to_string()));
        assert!(names.contains(&"foo-1.0/foo/__init__.py".to_string()));
    }
}
