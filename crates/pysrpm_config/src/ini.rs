//! A small INI reader following the rules of Python's `configparser` that
//! matter for pysrpm configuration files.
//!
//! - `[section]` headers, `key = value` or `key: value` (first delimiter wins)
//! - keys are trimmed and lower-cased
//! - full-line comments start with `#` or `;`
//! - a line indented deeper than its key line continues the value. Blank
//!   lines inside a value are kept, trailing ones are dropped, and the
//!   continuation lines are dedented by their common indentation.
//! - an empty value on the key line followed by continuation lines yields a
//!   value that starts with an empty line

use crate::error::ConfigError;
use crate::section::Section;

struct PendingValue<'a> {
    key: String,
    indent: usize,
    first: String,
    continuation: Vec<&'a str>,
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

impl PendingValue<'_> {
    fn finish(mut self) -> (String, String) {
        while self.continuation.last().is_some_and(|line| line.is_empty()) {
            self.continuation.pop();
        }
        if self.continuation.is_empty() {
            return (self.key, self.first);
        }

        let common = self
            .continuation
            .iter()
            .filter(|line| !line.is_empty())
            .map(|line| indentation(line))
            .min()
            .unwrap_or(0);

        let mut value = self.first;
        for line in self.continuation {
            value.push('\n');
            if !line.is_empty() {
                value.push_str(&line[common..]);
            }
        }
        (self.key, value)
    }
}

/// Parse `text` into its sections, in file order.
pub(crate) fn parse_ini(origin: &str, text: &str) -> Result<Vec<Section>, ConfigError> {
    let parse_error = |line: usize, message: &str| ConfigError::Parse {
        origin: origin.to_string(),
        line,
        message: message.to_string(),
    };

    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<Section> = None;
    let mut pending: Option<PendingValue<'_>> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_end();
        let indent = indentation(line);
        let content = &line[indent..];

        if content.is_empty() {
            if let Some(pending) = pending.as_mut() {
                pending.continuation.push("");
            }
            continue;
        }
        if content.starts_with(['#', ';']) {
            continue;
        }
        if let Some(value) = pending.as_mut()
            && indent > value.indent
        {
            value.continuation.push(line);
            continue;
        }

        if let Some(value) = pending.take()
            && let Some(section) = current.as_mut()
        {
            let (key, value) = value.finish();
            section.insert(key, value);
        }

        if let Some(header) = content.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .ok_or_else(|| parse_error(line_no, "unterminated section header"))?
                .trim();
            if name.is_empty() {
                return Err(parse_error(line_no, "empty section name"));
            }
            let duplicate = sections.iter().chain(current.iter()).any(|s| s.name() == name);
            if duplicate {
                return Err(ConfigError::DuplicateSection {
                    origin: origin.to_string(),
                    line: line_no,
                    section: name.to_string(),
                });
            }
            sections.extend(current.replace(Section::new(name)));
            continue;
        }

        let Some(section) = current.as_ref() else {
            return Err(parse_error(line_no, "key found before the first section header"));
        };
        let Some(delimiter) = content.find(['=', ':']) else {
            return Err(parse_error(line_no, "expected 'key = value'"));
        };
        let key = content[..delimiter].trim().to_lowercase();
        if key.is_empty() {
            return Err(parse_error(line_no, "empty key"));
        }
        if section.contains_key(&key) {
            return Err(ConfigError::DuplicateKey {
                origin: origin.to_string(),
                line: line_no,
                section: section.name().to_string(),
                key,
            });
        }
        pending = Some(PendingValue {
            key,
            indent,
            first: content[delimiter + 1..].trim().to_string(),
            continuation: Vec::new(),
        });
    }

    if let Some(value) = pending
        && let Some(section) = current.as_mut()
    {
        let (key, value) = value.finish();
        section.insert(key, value);
    }
    sections.extend(current);

    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_basic_sections() {
        let sections = parse_ini(
            "test.cfg",
            "# leading comment\n[pysrpm]\nRelease = 2\nflavour: fedora\n; another\n[templates]\ncheck =\n",
        )
        .unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].get("release"), Some("2"));
        assert_eq!(sections[0].get("flavour"), Some("fedora"));
        assert_eq!(sections[1].get("check"), Some(""));
    }

    #[test]
    fn test_first_delimiter_wins() {
        let sections = parse_ini("test.cfg", "[a]\nurl: https://x.org/?a=b\n").unwrap();
        assert_eq!(sections[0].get("url"), Some("https://x.org/?a=b"));
    }

    #[test]
    fn test_multiline_values() {
        let text = "\
[templates]
install =
    mkdir -p %{buildroot}

    if true; then
        echo indented
    fi


files = -f INSTALLED_FILES
  %doc README
next = 1
";
        let sections = parse_ini("test.cfg", text).unwrap();
        let section = &sections[0];
        assert_eq!(
            section.get("install"),
            Some("\nmkdir -p %{buildroot}\n\nif true; then\n    echo indented\nfi")
        );
        assert_eq!(section.get("files"), Some("-f INSTALLED_FILES\n%doc README"));
        assert_eq!(section.get("next"), Some("1"));
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let err = parse_ini("a.cfg", "key = value\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 1, .. }));

        let err = parse_ini("a.cfg", "[a]\nx = 1\n[b]\n[a]\n").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSection { line: 4, .. }));

        let err = parse_ini("a.cfg", "[a]\nx = 1\nX = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateKey { line: 3, .. }));

        let err = parse_ini("a.cfg", "[a]\njust some words\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 2, .. }));

        let err = parse_ini("a.cfg", "[a\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 1, .. }));
    }
}
