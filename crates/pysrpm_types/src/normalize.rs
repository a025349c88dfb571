use itertools::Itertools;

/// Normalize a distribution or extra name following PEP 503: lower-case, with
/// every run of `-`, `_` and `.` collapsed into a single `-`.
pub fn normalize_name(name: &str) -> String {
    name.split(['-', '_', '.'])
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .join("-")
}

/// Normalize a metadata field name so that `author_email`, `Author-Email` and
/// `author-email` all refer to the same field.
pub fn normalize_field(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '_' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}
