//! Presets shipped with pysrpm.

/// Name of the preset every configuration starts from
pub const BASE_PRESET: &str = "base";

const BUILTIN_PRESETS: &[(&str, &str)] = &[
    (BASE_PRESET, include_str!("presets/base.conf")),
    ("fedora", include_str!("presets/fedora.conf")),
    ("opensuse", include_str!("presets/opensuse.conf")),
    ("rhel", include_str!("presets/rhel.conf")),
];

/// The text of a built-in preset
pub fn builtin_preset(name: &str) -> Option<&'static str> {
    BUILTIN_PRESETS
        .iter()
        .find(|(preset, _)| *preset == name)
        .map(|(_, text)| *text)
}

/// Names of the built-in flavours, i.e. every preset except the base
pub fn builtin_flavours() -> impl Iterator<Item = &'static str> {
    BUILTIN_PRESETS
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| *name != BASE_PRESET)
}
