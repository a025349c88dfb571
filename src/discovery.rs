//! Locating the user configuration file.

use std::path::Path;

use pysrpm_config::{ConfigError, ConfigSource};

/// The user configuration: `explicit` if given, else the `[tool.pysrpm]`
/// table of `pyproject.toml` in `dir`, else `setup.cfg` in `dir`.
pub fn discover_config(
    explicit: Option<&Path>,
    dir: &Path,
) -> Result<Option<ConfigSource>, ConfigError> {
    if let Some(path) = explicit {
        tracing::debug!("Using configuration file {}", path.display());
        return ConfigSource::from_path(path).map(Some);
    }

    let pyproject = dir.join("pyproject.toml");
    if pyproject.is_file() {
        let source = ConfigSource::from_path(&pyproject)?;
        if !source.is_empty() {
            tracing::debug!("Using configuration from {}", pyproject.display());
            return Ok(Some(source));
        }
    }

    let setup_cfg = dir.join("setup.cfg");
    if setup_cfg.is_file() {
        tracing::debug!("Using configuration from {}", setup_cfg.display());
        return ConfigSource::from_path(&setup_cfg).map(Some);
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pyproject_without_table_falls_back_to_setup_cfg() {
        let dir = tempfile::tempdir().unwrap();
        fs_err::write(dir.path().join("pyproject.toml"), "[project]\nname = \"foo\"\n").unwrap();
        fs_err::write(dir.path().join("setup.cfg"), "[pysrpm]\nrelease = 4\n").unwrap();

        let source = discover_config(None, dir.path()).unwrap().unwrap();
        assert_eq!(source.section("pysrpm").unwrap().get("release"), Some("4"));
    }

    #[test]
    fn test_pyproject_table_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs_err::write(dir.path().join("pyproject.toml"), "[tool.pysrpm]\nrelease = \"2\"\n").unwrap();
        fs_err::write(dir.path().join("setup.cfg"), "[pysrpm]\nrelease = 4\n").unwrap();

        let source = discover_config(None, dir.path()).unwrap().unwrap();
        assert_eq!(source.section("pysrpm").unwrap().get("release"), Some("2"));
    }

    #[test]
    fn test_explicit_file_and_no_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_config(None, dir.path()).unwrap().is_none());

        let missing = dir.path().join("missing.cfg");
        assert!(matches!(
            discover_config(Some(&missing), dir.path()),
            Err(ConfigError::Io { .. })
        ));
    }
}
