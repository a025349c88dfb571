//! PEP 440 version specifiers as they appear in `Requires-Dist` entries.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseRequirementError;

/// Public PEP 440 versions, optionally followed by a `.*` wildcard suffix.
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^
        v?
        (?:[0-9]+!)?                                    # epoch
        [0-9]+(?:\.[0-9]+)*                             # release
        (?:[-_.]?(?:a|b|c|rc|alpha|beta|pre|preview)[-_.]?[0-9]*)?
        (?:-[0-9]+|[-_.]?(?:post|rev|r)[-_.]?[0-9]*)?
        (?:[-_.]?dev[-_.]?[0-9]*)?
        (?:\+[a-z0-9]+(?:[-_.][a-z0-9]+)*)?             # local version
        (?:\.\*)?                                       # wildcard
        $",
    )
    .expect("version regex is valid")
});

/// A comparison operator of a version specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `==`
    Equal,
    /// `===`
    ExactEqual,
    /// `!=`
    NotEqual,
    /// `~=`
    Compatible,
}

impl Operator {
    /// Operators ordered so that the longest token is tried first.
    const TOKENS: [(&'static str, Operator); 8] = [
        ("===", Operator::ExactEqual),
        ("==", Operator::Equal),
        ("!=", Operator::NotEqual),
        ("~=", Operator::Compatible),
        ("<=", Operator::LessEqual),
        (">=", Operator::GreaterEqual),
        ("<", Operator::Less),
        (">", Operator::Greater),
    ];

    /// The textual form of the operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Equal => "==",
            Operator::ExactEqual => "===",
            Operator::NotEqual => "!=",
            Operator::Compatible => "~=",
        }
    }

    /// Split a leading operator token off `input`.
    pub(crate) fn split_prefix(input: &str) -> Option<(Operator, &str)> {
        Self::TOKENS
            .iter()
            .find_map(|(token, op)| input.strip_prefix(token).map(|rest| (*op, rest)))
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single version specifier such as `>= 1.2` or `== 3.*`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Specifier {
    /// The comparison operator
    pub operator: Operator,
    /// The version, including a trailing `.*` for wildcard specifiers
    pub version: String,
}

impl Specifier {
    /// Create a specifier without validating the version
    pub fn new(operator: Operator, version: impl Into<String>) -> Self {
        Self {
            operator,
            version: version.into(),
        }
    }

    /// Whether the version ends with a `.*` wildcard
    pub fn is_wildcard(&self) -> bool {
        self.version.ends_with(".*")
    }

    /// The version without its wildcard suffix
    pub fn base_version(&self) -> &str {
        self.version.strip_suffix(".*").unwrap_or(&self.version)
    }
}

impl Display for Specifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.version)
    }
}

impl FromStr for Specifier {
    type Err = ParseRequirementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = |message: &str| ParseRequirementError::InvalidSpecifier {
            specifier: trimmed.to_string(),
            message: message.to_string(),
        };

        let (operator, version) =
            Operator::split_prefix(trimmed).ok_or_else(|| invalid("unknown comparison operator"))?;
        let version = version.trim();

        if version.is_empty() {
            return Err(invalid("missing version"));
        }

        // `===` compares arbitrary strings, everything else must be a PEP 440 version
        if operator == Operator::ExactEqual {
            if version.contains(char::is_whitespace) {
                return Err(invalid("arbitrary equality version contains whitespace"));
            }
        } else if !VERSION_RE.is_match(version) {
            return Err(invalid("not a valid version"));
        }

        Ok(Specifier::new(operator, version))
    }
}

/// Parse a comma separated list of specifiers. An empty string yields no specifiers.
pub fn parse_specifiers(input: &str) -> Result<Vec<Specifier>, ParseRequirementError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    input.split(',').map(Specifier::from_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(">=1.0", Operator::GreaterEqual, "1.0")]
    #[case("== 1.5.*", Operator::Equal, "1.5.*")]
    #[case("~=1.5.3b7", Operator::Compatible, "1.5.3b7")]
    #[case("!=2.0.4", Operator::NotEqual, "2.0.4")]
    #[case("===foobar", Operator::ExactEqual, "foobar")]
    #[case("<1!2.0.post1", Operator::Less, "1!2.0.post1")]
    fn test_parse_specifier(#[case] input: &str, #[case] op: Operator, #[case] version: &str) {
        let spec: Specifier = input.parse().unwrap();
        assert_eq!(spec.operator, op);
        assert_eq!(spec.version, version);
    }

    #[rstest]
    #[case("=>1.0")]
    #[case(">=")]
    #[case("1.0")]
    #[case(">=one")]
    #[case("==1.*.2")]
    fn test_invalid_specifier(#[case] input: &str) {
        assert!(input.parse::<Specifier>().is_err(), "{input} should not parse");
    }

    #[test]
    fn test_parse_specifier_list() {
        let specs = parse_specifiers("!=2.0.4, !=2.1.2,>=2.0.1").unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[2], Specifier::new(Operator::GreaterEqual, "2.0.1"));
        assert!(parse_specifiers("  ").unwrap().is_empty());
    }

    #[test]
    fn test_wildcard() {
        let spec: Specifier = "!=1.5.*".parse().unwrap();
        assert!(spec.is_wildcard());
        assert_eq!(spec.base_version(), "1.5");
    }
}
