//! Reading package metadata from source distributions and source trees.

use std::{
    io::Read,
    path::{Component, Path, PathBuf},
};

use globset::{Glob, GlobSetBuilder};
use miette::Diagnostic;
use pysrpm_config::ControlOptions;
use pysrpm_types::{Dependency, MetadataError, PackageMetadata, ParseRequirementError};
use thiserror::Error;

/// Build requirements of packages without a `[build-system]` table
const DEFAULT_BUILD_REQUIRES: [&str; 2] = ["setuptools>=40.8.0", "wheel"];

/// Errors that can occur while reading the metadata of a source
#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    #[error("could not read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is neither a source tarball nor a directory", .0.display())]
    #[diagnostic(help("pass a `.tar.gz` source distribution, e.g. one built with `python -m build --sdist`"))]
    Unsupported(PathBuf),

    #[error("no PKG-INFO found in {}", .0.display())]
    #[diagnostic(help("source trees need to be prepared with `python setup.py egg_info` or be a source distribution"))]
    MissingPkgInfo(PathBuf),

    #[error("invalid PKG-INFO in {}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: MetadataError,
    },

    #[error("invalid pyproject.toml in {}", path.display())]
    Pyproject {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid build requirement")]
    BuildRequirement(#[source] ParseRequirementError),

    #[error("invalid disabled entry point pattern '{pattern}'")]
    EntryPointPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// The files of a source that carry metadata, relative to its top directory
#[derive(Debug, Default)]
struct SourceFiles {
    /// Names of the regular files in the top directory
    top_level: Vec<String>,
    pkg_info: Option<String>,
    /// `PKG-INFO` of a `*.egg-info` directory, for source trees
    egg_pkg_info: Option<String>,
    pyproject: Option<String>,
    entry_points: Option<String>,
}

impl SourceFiles {
    /// Record `relative` (path below the top directory) and read its
    /// contents if it is one of the interesting files
    fn visit(
        &mut self,
        relative: &Path,
        read: impl FnOnce() -> std::io::Result<String>,
    ) -> std::io::Result<()> {
        let components: Vec<&str> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => name.to_str(),
                _ => None,
            })
            .collect();

        match components.as_slice() {
            ["PKG-INFO"] => self.pkg_info = Some(read()?),
            ["pyproject.toml"] => self.pyproject = Some(read()?),
            [name] => self.top_level.push(name.to_string()),
            [.., egg_info, file] if egg_info.ends_with(".egg-info") && components.len() <= 3 => {
                match *file {
                    "entry_points.txt" if self.entry_points.is_none() => {
                        self.entry_points = Some(read()?)
                    }
                    "PKG-INFO" if self.egg_pkg_info.is_none() => self.egg_pkg_info = Some(read()?),
                    _ => {}
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn from_tarball(path: &Path) -> Result<Self, SourceError> {
        let io_error = |source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = fs_err::File::open(path).map_err(io_error)?;
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let reader: Box<dyn Read> = if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Box::new(flate2::read::GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        let mut files = SourceFiles::default();
        let mut archive = tar::Archive::new(reader);
        for entry in archive.entries().map_err(io_error)? {
            let mut entry = entry.map_err(io_error)?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let entry_path = entry.path().map_err(io_error)?.into_owned();
            // strip the `<name>-<version>/` directory
            let relative: PathBuf = entry_path
                .components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .skip(1)
                .collect();
            files
                .visit(&relative, || {
                    let mut contents = String::new();
                    entry.read_to_string(&mut contents)?;
                    Ok(contents)
                })
                .map_err(io_error)?;
        }
        Ok(files)
    }

    fn from_directory(path: &Path) -> Result<Self, SourceError> {
        let io_error = |source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut files = SourceFiles::default();
        let mut pending = vec![(PathBuf::new(), 0)];
        while let Some((relative, depth)) = pending.pop() {
            for entry in fs_err::read_dir(path.join(&relative)).map_err(io_error)? {
                let entry = entry.map_err(io_error)?;
                let file_type = entry.file_type().map_err(io_error)?;
                let child = relative.join(entry.file_name());
                if file_type.is_dir() && depth < 2 {
                    pending.push((child, depth + 1));
                } else if file_type.is_file() {
                    let full = path.join(&child);
                    files
                        .visit(&child, || fs_err::read_to_string(&full))
                        .map_err(io_error)?;
                }
            }
        }
        files.top_level.sort();
        Ok(files)
    }
}

fn is_tarball(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    [".tar.gz", ".tgz", ".tar"]
        .iter()
        .any(|suffix| name.ends_with(suffix))
}

/// Read the metadata of a source distribution (`.tar.gz`) or of an unpacked
/// source tree containing a `PKG-INFO` file.
pub fn load_source_metadata(path: &Path) -> Result<PackageMetadata, SourceError> {
    let (files, source_file) = if path.is_dir() {
        (SourceFiles::from_directory(path)?, None)
    } else if is_tarball(path) {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        (SourceFiles::from_tarball(path)?, name)
    } else if !path.exists() {
        return Err(SourceError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    } else {
        return Err(SourceError::Unsupported(path.to_path_buf()));
    };

    let pkg_info = files
        .pkg_info
        .as_deref()
        .or(files.egg_pkg_info.as_deref())
        .ok_or_else(|| SourceError::MissingPkgInfo(path.to_path_buf()))?;
    let mut metadata =
        PackageMetadata::from_pkg_info(pkg_info).map_err(|source| SourceError::Metadata {
            path: path.to_path_buf(),
            source,
        })?;
    metadata.source_file = source_file;

    metadata.build_requires = build_requires(path, files.pyproject.as_deref())?;
    if let Some(entry_points) = &files.entry_points {
        metadata.entry_points = script_names(entry_points);
    }

    let matching = |prefixes: &[&str]| -> Vec<String> {
        files
            .top_level
            .iter()
            .filter(|name| {
                let upper = name.to_ascii_uppercase();
                prefixes.iter().any(|prefix| upper.starts_with(prefix))
            })
            .cloned()
            .collect()
    };
    metadata.doc_files = matching(&["README"]);
    if metadata.license_files.is_empty() {
        metadata.license_files = matching(&["LICENSE", "LICENCE", "COPYING"]);
    }

    tracing::info!(
        "Read metadata of {} {} from {}",
        metadata.name,
        metadata.version,
        path.display()
    );
    Ok(metadata)
}

/// The `[build-system] requires` of `pyproject.toml`, or the setuptools
/// defaults
fn build_requires(path: &Path, pyproject: Option<&str>) -> Result<Vec<Dependency>, SourceError> {
    let table = pyproject
        .map(|contents| contents.parse::<toml::Table>())
        .transpose()
        .map_err(|source| SourceError::Pyproject {
            path: path.to_path_buf(),
            source,
        })?;

    let requires: Option<Vec<&str>> = table
        .as_ref()
        .and_then(|t| t.get("build-system"))
        .and_then(|b| b.get("requires"))
        .and_then(|r| r.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect());

    requires
        .unwrap_or_else(|| DEFAULT_BUILD_REQUIRES.to_vec())
        .into_iter()
        .map(|r| r.parse::<Dependency>().map_err(SourceError::BuildRequirement))
        .collect()
}

/// The script names of the `console_scripts` and `gui_scripts` sections of
/// an `entry_points.txt` file
fn script_names(contents: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut in_scripts = false;
    for line in contents.lines().map(str::trim) {
        if line.is_empty() || line.starts_with(['#', ';']) {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_scripts = matches!(section.trim(), "console_scripts" | "gui_scripts");
            continue;
        }
        if in_scripts && let Some((name, _)) = line.split_once('=') {
            names.push(name.trim().to_string());
        }
    }
    names
}

/// Apply the metadata-related configuration: the epoch and the entry
/// points that must not be installed
pub fn apply_configuration(
    metadata: &mut PackageMetadata,
    options: &ControlOptions,
) -> Result<(), SourceError> {
    if options.epoch.is_some() {
        metadata.epoch = options.epoch.clone();
    }

    if options.disabled_entry_points.is_empty() {
        return Ok(());
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in &options.disabled_entry_points {
        let glob = Glob::new(pattern).map_err(|source| SourceError::EntryPointPattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    let disabled = builder
        .build()
        .map_err(|source| SourceError::EntryPointPattern {
            pattern: options.disabled_entry_points.join(" "),
            source,
        })?;

    let (off, on): (Vec<String>, Vec<String>) = std::mem::take(&mut metadata.entry_points)
        .into_iter()
        .partition(|name| disabled.is_match(name));
    metadata.entry_points = on;
    metadata.disabled_entry_points = off;
    Ok(())
}
