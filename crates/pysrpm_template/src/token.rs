//! Tokenizer for a single template line.

/// A piece of a template line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'t> {
    /// Literal text, escapes already resolved
    Text(&'t str),
    /// `{name}`: a package metadata field
    Field(&'t str),
    /// `${key}` or `${section:key}`: a configuration value
    Config {
        section: Option<&'t str>,
        key: &'t str,
    },
    /// `%{body}`: an RPM macro, or a macro alias when `body` is one
    Macro(&'t str),
}

fn is_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Split `line` into tokens.
///
/// `%%`, `$$`, `{{` and `}}` are escapes for the delimiter itself. A `%` or
/// `$` not followed by `{` is plain text, and so is a `${...}` whose body
/// contains `$$`. The body of `%{...}` may contain
/// nested braces and is never tokenized further.
pub fn tokenize(line: &str) -> Result<Vec<Token<'_>>, String> {
    let bytes = line.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    macro_rules! flush {
        () => {
            if text_start < i {
                tokens.push(Token::Text(&line[text_start..i]));
            }
        };
    }

    while i < bytes.len() {
        let next = bytes.get(i + 1).copied();
        match (bytes[i], next) {
            (b'%', Some(b'%')) | (b'$', Some(b'$')) | (b'{', Some(b'{')) | (b'}', Some(b'}')) => {
                flush!();
                tokens.push(Token::Text(&line[i..i + 1]));
                i += 2;
                text_start = i;
            }
            (b'%', Some(b'{')) => {
                flush!();
                let mut depth = 0usize;
                let close = line[i + 1..].char_indices().find_map(|(offset, c)| {
                    match c {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                return Some(i + 1 + offset);
                            }
                        }
                        _ => {}
                    }
                    None
                });
                let close = close.ok_or_else(|| "unterminated macro '%{'".to_string())?;
                tokens.push(Token::Macro(&line[i + 2..close]));
                i = close + 1;
                text_start = i;
            }
            (b'$', Some(b'{')) => {
                flush!();
                let close = line[i + 2..]
                    .find('}')
                    .map(|offset| i + 2 + offset)
                    .ok_or_else(|| "unterminated configuration reference '${'".to_string())?;
                let body = &line[i + 2..close];
                // `$$` inside the braces makes the whole reference literal text
                if body.contains("$$") {
                    tokens.push(Token::Text(&line[i..i + 2]));
                    for (n, part) in body.split("$$").enumerate() {
                        if n > 0 {
                            tokens.push(Token::Text("$"));
                        }
                        if !part.is_empty() {
                            tokens.push(Token::Text(part));
                        }
                    }
                    tokens.push(Token::Text("}"));
                    i = close + 1;
                    text_start = i;
                    continue;
                }
                let (section, key) = match body.split_once(':') {
                    Some((section, key)) => (Some(section), key),
                    None => (None, body),
                };
                if !is_name(key) || section.is_some_and(|s| !is_name(s)) {
                    return Err(format!("invalid configuration reference '${{{body}}}'"));
                }
                tokens.push(Token::Config { section, key });
                i = close + 1;
                text_start = i;
            }
            (b'{', _) => {
                flush!();
                let close = line[i + 1..]
                    .find('}')
                    .map(|offset| i + 1 + offset)
                    .ok_or_else(|| "unterminated field '{'".to_string())?;
                let name = &line[i + 1..close];
                if !is_name(name) {
                    return Err(format!("invalid field name '{{{name}}}'"));
                }
                tokens.push(Token::Field(name));
                i = close + 1;
                text_start = i;
            }
            (b'}', _) => return Err("single '}' encountered".to_string()),
            _ => i += 1,
        }
    }
    flush!();

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escapes() {
        assert_eq!(
            tokenize("100%% done $$HOME {{x}}").unwrap(),
            vec![
                Token::Text("100"),
                Token::Text("%"),
                Token::Text(" done "),
                Token::Text("$"),
                Token::Text("HOME "),
                Token::Text("{"),
                Token::Text("x"),
                Token::Text("}"),
            ]
        );
    }

    #[test]
    fn test_escaped_dollar_inside_reference() {
        assert_eq!(
            tokenize("${$$HOME}/bin").unwrap(),
            vec![
                Token::Text("${"),
                Token::Text("$"),
                Token::Text("HOME"),
                Token::Text("}"),
                Token::Text("/bin"),
            ]
        );
    }

    #[test]
    fn test_lone_percent_and_dollar_are_text() {
        assert_eq!(
            tokenize("%build 50% $PATH").unwrap(),
            vec![Token::Text("%build 50% $PATH")]
        );
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            tokenize("Name: {rpmname} ${release}%{?dist} ${pysrpm:arch}").unwrap(),
            vec![
                Token::Text("Name: "),
                Token::Field("rpmname"),
                Token::Text(" "),
                Token::Config {
                    section: None,
                    key: "release"
                },
                Token::Macro("?dist"),
                Token::Text(" "),
                Token::Config {
                    section: Some("pysrpm"),
                    key: "arch"
                },
            ]
        );
    }

    #[test]
    fn test_nested_macro_body() {
        assert_eq!(
            tokenize("%{!?python3_sitelib: %{global x %{y}}} {name}").unwrap(),
            vec![
                Token::Macro("!?python3_sitelib: %{global x %{y}}"),
                Token::Text(" "),
                Token::Field("name"),
            ]
        );
    }

    #[test]
    fn test_syntax_errors() {
        assert!(tokenize("a } b").is_err());
        assert!(tokenize("{name").is_err());
        assert!(tokenize("${release").is_err());
        assert!(tokenize("%{dist").is_err());
        assert!(tokenize("{}").is_err());
        assert!(tokenize("{not a name}").is_err());
        assert!(tokenize("${a:b:c}").is_err());
    }
}
