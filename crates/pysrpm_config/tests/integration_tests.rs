use std::path::PathBuf;

use pretty_assertions::assert_eq;
use pysrpm_config::{ConfigError, ConfigSource, ConfigStore};
use pysrpm_types::DirectiveTag;
use rstest::rstest;

fn test_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test-data")
}

fn overrides(values: &[(&'static str, &'static str, &str)]) -> ConfigSource {
    ConfigSource::overrides(
        "command line",
        values.iter().map(|(s, k, v)| (*s, *k, v.to_string())),
    )
}

#[test]
fn test_base_preset_is_complete() {
    let config = ConfigStore::new().load(&[]).unwrap();
    let options = config.options().unwrap();

    assert!(config.flavours().is_empty());
    assert_eq!(options.package_prefix, "");
    assert_eq!(options.release, "1");
    assert!(options.extract_dependencies);
    assert_eq!(options.optional_dependency_tag, Some(DirectiveTag::Suggests));
    assert_eq!(options.environment_markers["os_name"], "posix");
    assert!(options.optional_keys.contains(&"license-file".to_string()));
    assert!(config.templates().contains_key("preamble"));
    assert_eq!(config.macros().get("python_sitelib"), Some("%{python3_sitelib}"));
}

#[test]
fn test_merge_is_deterministic() {
    let sources = [
        ConfigSource::from_path(&test_data_dir().join("setup.cfg")).unwrap(),
        overrides(&[("pysrpm", "release", "7")]),
    ];
    let store = ConfigStore::new();
    let first = store.load(&sources).unwrap();
    let second = store.load(&sources).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_multiline_override_replaces_whole_value() {
    let user = ConfigSource::from_path(&test_data_dir().join("multiline_override.cfg")).unwrap();
    let config = ConfigStore::new().load(&[user]).unwrap();

    assert_eq!(
        config.get("templates", "install"),
        Some(
            "\n%pyproject_install\ninstall -Dm644 extra/completion.bash \
             %{buildroot}%{_datadir}/bash-completion/completions/{name}"
        )
    );
    // keys the user did not touch still come from the flavour
    assert_eq!(config.get("templates", "build"), Some("\n%pyproject_wheel"));
}

#[rstest]
#[case("fedora", &["fedora"])]
#[case("rhel", &["fedora", "rhel"])]
#[case("opensuse", &["opensuse"])]
fn test_builtin_flavour_chain(#[case] flavour: &str, #[case] chain: &[&str]) {
    let config = ConfigStore::new()
        .load(&[overrides(&[("pysrpm", "flavour", flavour)])])
        .unwrap();
    assert_eq!(config.flavours(), chain);
}

#[test]
fn test_rhel_overrides_fedora() {
    let config = ConfigStore::new()
        .load(&[overrides(&[("pysrpm", "flavour", "rhel")])])
        .unwrap();
    assert_eq!(config.get("templates", "build"), Some("\n%py3_build"));
    assert_eq!(config.get("templates", "generate_buildrequires"), Some(""));
    // inherited from fedora
    assert_eq!(
        config.get("templates", "prep"),
        Some("\n%autosetup -n {name}-{version}")
    );
}

#[test]
fn test_cli_beats_user_file() {
    let user = ConfigSource::from_path(&test_data_dir().join("setup.cfg")).unwrap();
    let config = ConfigStore::new()
        .load(&[user, overrides(&[("pysrpm", "release", "9")])])
        .unwrap();
    let options = config.options().unwrap();
    assert_eq!(options.release, "9");
    assert_eq!(options.requires_extras, vec!["cli"]);
    assert_eq!(config.flavours(), ["fedora", "rhel"]);
    assert_eq!(config.get("templates", "check"), Some("\n%{python3} -m pytest"));
}

#[test]
fn test_pyproject_source() {
    let user = ConfigSource::from_path(&test_data_dir().join("pyproject.toml")).unwrap();
    let config = ConfigStore::new().load(&[user]).unwrap();
    let options = config.options().unwrap();

    assert_eq!(config.flavours(), ["opensuse"]);
    assert!(options.keep_temp);
    assert_eq!(options.suggests, vec!["python3-docutils", "python3-sphinx"]);
    assert_eq!(config.get("templates", "python_package"), Some("python3-{name}"));
}

#[test]
fn test_preset_dir_shadows_builtin() {
    let preset_dir = test_data_dir().join("presets");
    let config = ConfigStore::new()
        .load(&[overrides(&[
            ("pysrpm", "flavour", "custom"),
            ("pysrpm", "preset_dir", preset_dir.to_str().unwrap()),
        ])])
        .unwrap();

    assert_eq!(config.flavours(), ["fedora", "custom"]);
    assert_eq!(config.options().unwrap().package_prefix, "python3-");
    assert!(config.get("templates", "changelog").unwrap().contains("Initial package"));
}

#[test]
fn test_invalid_preset_file() {
    let preset_dir = test_data_dir().join("presets");
    let err = ConfigStore::new()
        .load(&[overrides(&[
            ("pysrpm", "flavour", "broken"),
            ("pysrpm", "preset_dir", preset_dir.to_str().unwrap()),
        ])])
        .unwrap_err();
    assert!(matches!(err, ConfigError::Parse { line: 3, .. }));
}

#[test]
fn test_unreadable_preset_file() {
    let dir = tempfile::tempdir().unwrap();
    fs_err::create_dir(dir.path().join("weird.conf")).unwrap();

    let err = ConfigStore::new()
        .load(&[overrides(&[
            ("pysrpm", "flavour", "weird"),
            ("pysrpm", "preset_dir", dir.path().to_str().unwrap()),
        ])])
        .unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_missing_config_file() {
    let err = ConfigSource::from_path(&test_data_dir().join("does-not-exist.cfg")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
