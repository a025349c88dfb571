use std::path::PathBuf;

use pretty_assertions::assert_eq;
use pysrpm_config::{ConfigSource, ConfigStore, EffectiveConfig};
use pysrpm_spec::{AssembleError, assemble};
use pysrpm_types::PackageMetadata;
use rstest::rstest;

fn test_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test-data")
}

fn load(flavour: Option<&str>, values: &[(&'static str, &'static str, &str)]) -> EffectiveConfig {
    let mut overrides: Vec<(&str, &str, String)> = values
        .iter()
        .map(|(s, k, v)| (*s, *k, v.to_string()))
        .collect();
    if let Some(flavour) = flavour {
        overrides.push(("pysrpm", "flavour", flavour.to_string()));
    }
    ConfigStore::new()
        .load(&[ConfigSource::overrides("command line", overrides)])
        .unwrap()
}

fn sample_metadata() -> PackageMetadata {
    let text = fs_err::read_to_string(test_data_dir().join("PKG-INFO")).unwrap();
    let mut metadata = PackageMetadata::from_pkg_info(&text).unwrap();
    metadata.doc_files = vec!["README.md".to_string()];
    metadata
}

#[test]
fn test_minimal_package_with_base_preset() {
    let config = load(None, &[("pysrpm", "extract_dependencies", "no")]);
    let spec = assemble(&config, &PackageMetadata::new("foo", "1.0")).unwrap();

    assert_eq!(
        spec,
        "\
Name: foo
Version: 1.0
Release: 1%{?dist}
Source0: foo-1.0.tar.gz
BuildArch: noarch
Provides: python3dist(foo) = 1.0

%prep
%setup -q -n foo-1.0

%build
python3 setup.py build

%install
python3 setup.py install --skip-build --root %{buildroot} --record=INSTALLED_FILES

%clean
rm -rf %{buildroot}

%files -f INSTALLED_FILES
"
    );
}

#[test]
fn test_minimal_package_with_fedora_preset() {
    let config = load(Some("fedora"), &[("pysrpm", "extract_dependencies", "no")]);
    let spec = assemble(&config, &PackageMetadata::new("foo", "1.0")).unwrap();

    assert_eq!(
        spec,
        "\
Name: foo
Version: 1.0
Release: 1%{?dist}
Source0: foo-1.0.tar.gz
BuildArch: noarch
BuildRequires: python3-devel

%prep
%autosetup -n foo-1.0

%generate_buildrequires
%pyproject_buildrequires

%build
%pyproject_wheel

%install
%pyproject_install
%pyproject_save_files '*'

%check
%pyproject_check_import

%files -f %{pyproject_files}
"
    );
}

#[rstest]
#[case(None)]
#[case(Some("fedora"))]
#[case(Some("rhel"))]
#[case(Some("opensuse"))]
fn test_minimal_package_with_every_flavour(#[case] flavour: Option<&str>) {
    let config = load(flavour, &[("pysrpm", "extract_dependencies", "no")]);
    let spec = assemble(&config, &PackageMetadata::new("foo", "1.0")).unwrap();

    assert!(spec.contains("Name: foo\n"));
    assert!(spec.contains("Version: 1.0\n"));
    assert!(!spec.contains("%license"));
    assert!(!spec.contains("%changelog"));
    assert!(!spec.contains("Summary:"));
    assert!(spec.ends_with('\n') && !spec.ends_with("\n\n"));
    assert!(!spec.contains("\n\n\n"));

    // every section header comes from a template of the merged flavour
    for header in spec.lines().filter(|line| line.starts_with('%')) {
        let name = header[1..].split_whitespace().next().unwrap();
        if config.templates().contains_key(name) {
            assert!(!config.get("templates", name).unwrap().trim().is_empty());
        }
    }
}

#[test]
fn test_rhel_files_section() {
    let config = load(Some("rhel"), &[]);
    let spec = assemble(&config, &sample_metadata()).unwrap();

    assert!(spec.contains(
        "\n%files\n%license LICENSE\n%doc README.md\n%{python3_sitelib}/*\n"
    ));
    assert!(!spec.contains("%generate_buildrequires"));
    assert!(!spec.contains("%check"));
}

#[test]
fn test_user_configuration() {
    let user = ConfigSource::from_path(&test_data_dir().join("setup.cfg")).unwrap();
    let config = ConfigStore::new().load(&[user]).unwrap();
    let spec = assemble(&config, &sample_metadata()).unwrap();

    assert_eq!(
        spec,
        "\
Name: python3-sample-tool
Version: 0.3.0
Release: 2%{?dist}
Summary: A sample command line tool
License: MIT
URL: https://example.org/sample-tool
Source0: sample-tool-0.3.0.tar.gz
BuildArch: noarch
BuildRequires: python3-devel
Requires: python3dist(click) >= 8.0
Requires: python(abi) >= 3.9
Suggests: python3dist(rich) >= 13

%description
Sample tool
===========

Does sample things.

%prep
%autosetup -n sample-tool-0.3.0

%generate_buildrequires
%pyproject_buildrequires

%build
%pyproject_wheel

%install
%pyproject_install
%pyproject_save_files '*'

%check
%pyproject_check_import

%files -f %{pyproject_files}
%license LICENSE
%doc README.md

%changelog
* Mon Jan 01 2024 Jane Doe <jane@example.org> - 0.3.0-2
- Initial package
"
    );
}

#[test]
fn test_required_field_missing() {
    let config = load(None, &[("pysrpm", "optional_keys", "epoch")]);
    let err = assemble(&config, &PackageMetadata::new("foo", "1.0")).unwrap_err();

    match err {
        AssembleError::Render { section, .. } => assert_eq!(section, "preamble"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_invalid_control_value() {
    let config = load(None, &[("pysrpm", "extract_dependencies", "maybe")]);
    assert!(matches!(
        assemble(&config, &PackageMetadata::new("foo", "1.0")),
        Err(AssembleError::Config(_))
    ));
}
