//! PEP 508 environment markers.
//!
//! Markers are parsed into a small expression tree. Evaluation is left to the
//! consumer, since pysrpm evaluates markers against a partial environment
//! where the answer may be unknown.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::ParseRequirementError;
use crate::normalize::normalize_name;

/// The environment variables a marker may refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerVariable {
    OsName,
    SysPlatform,
    PlatformMachine,
    PlatformPythonImplementation,
    PlatformRelease,
    PlatformSystem,
    PlatformVersion,
    PythonVersion,
    PythonFullVersion,
    ImplementationName,
    ImplementationVersion,
    Extra,
}

impl MarkerVariable {
    /// The canonical PEP 508 name of the variable
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerVariable::OsName => "os_name",
            MarkerVariable::SysPlatform => "sys_platform",
            MarkerVariable::PlatformMachine => "platform_machine",
            MarkerVariable::PlatformPythonImplementation => "platform_python_implementation",
            MarkerVariable::PlatformRelease => "platform_release",
            MarkerVariable::PlatformSystem => "platform_system",
            MarkerVariable::PlatformVersion => "platform_version",
            MarkerVariable::PythonVersion => "python_version",
            MarkerVariable::PythonFullVersion => "python_full_version",
            MarkerVariable::ImplementationName => "implementation_name",
            MarkerVariable::ImplementationVersion => "implementation_version",
            MarkerVariable::Extra => "extra",
        }
    }

    /// Variables whose values are PEP 440 versions rather than plain strings
    pub fn is_version(&self) -> bool {
        matches!(
            self,
            MarkerVariable::PythonVersion
                | MarkerVariable::PythonFullVersion
                | MarkerVariable::ImplementationVersion
        )
    }
}

impl FromStr for MarkerVariable {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "os_name" | "os.name" => MarkerVariable::OsName,
            "sys_platform" | "sys.platform" => MarkerVariable::SysPlatform,
            "platform_machine" | "platform.machine" => MarkerVariable::PlatformMachine,
            "platform_python_implementation"
            | "platform.python_implementation"
            | "python_implementation" => MarkerVariable::PlatformPythonImplementation,
            "platform_release" => MarkerVariable::PlatformRelease,
            "platform_system" => MarkerVariable::PlatformSystem,
            "platform_version" | "platform.version" => MarkerVariable::PlatformVersion,
            "python_version" => MarkerVariable::PythonVersion,
            "python_full_version" => MarkerVariable::PythonFullVersion,
            "implementation_name" => MarkerVariable::ImplementationName,
            "implementation_version" => MarkerVariable::ImplementationVersion,
            "extra" => MarkerVariable::Extra,
            _ => return Err(()),
        })
    }
}

impl Display for MarkerVariable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a marker comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerValue {
    Variable(MarkerVariable),
    Literal(String),
}

impl Display for MarkerValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MarkerValue::Variable(var) => var.fmt(f),
            MarkerValue::Literal(value) if value.contains('"') => write!(f, "'{value}'"),
            MarkerValue::Literal(value) => write!(f, "\"{value}\""),
        }
    }
}

/// Comparison operators allowed in markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerOperator {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Compatible,
    ExactEqual,
    In,
    NotIn,
}

impl MarkerOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerOperator::Equal => "==",
            MarkerOperator::NotEqual => "!=",
            MarkerOperator::Less => "<",
            MarkerOperator::LessEqual => "<=",
            MarkerOperator::Greater => ">",
            MarkerOperator::GreaterEqual => ">=",
            MarkerOperator::Compatible => "~=",
            MarkerOperator::ExactEqual => "===",
            MarkerOperator::In => "in",
            MarkerOperator::NotIn => "not in",
        }
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "==" => MarkerOperator::Equal,
            "!=" => MarkerOperator::NotEqual,
            "<" => MarkerOperator::Less,
            "<=" => MarkerOperator::LessEqual,
            ">" => MarkerOperator::Greater,
            ">=" => MarkerOperator::GreaterEqual,
            "~=" => MarkerOperator::Compatible,
            "===" => MarkerOperator::ExactEqual,
            _ => return None,
        })
    }
}

impl Display for MarkerOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `lhs op rhs` comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerExpression {
    pub lhs: MarkerValue,
    pub operator: MarkerOperator,
    pub rhs: MarkerValue,
}

impl MarkerExpression {
    /// If this is `extra == "name"` (in either order), the normalized extra name
    pub fn extra_name(&self) -> Option<String> {
        if self.operator != MarkerOperator::Equal {
            return None;
        }
        match (&self.lhs, &self.rhs) {
            (MarkerValue::Variable(MarkerVariable::Extra), MarkerValue::Literal(name))
            | (MarkerValue::Literal(name), MarkerValue::Variable(MarkerVariable::Extra)) => {
                Some(normalize_name(name))
            }
            _ => None,
        }
    }
}

impl Display for MarkerExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.operator, self.rhs)
    }
}

/// A parsed environment marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerTree {
    Expression(MarkerExpression),
    And(Vec<MarkerTree>),
    Or(Vec<MarkerTree>),
}

impl MarkerTree {
    /// The extra a dependency belongs to: an `extra == "..."` comparison that
    /// is either the whole marker or one of its top-level `and` operands.
    pub fn top_level_extra(&self) -> Option<String> {
        match self {
            MarkerTree::Expression(expr) => expr.extra_name(),
            MarkerTree::And(items) => items.iter().find_map(|item| match item {
                MarkerTree::Expression(expr) => expr.extra_name(),
                _ => None,
            }),
            MarkerTree::Or(_) => None,
        }
    }
}

impl Display for MarkerTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MarkerTree::Expression(expr) => expr.fmt(f),
            MarkerTree::And(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" and ")?;
                    }
                    match item {
                        MarkerTree::Or(_) => write!(f, "({item})")?,
                        _ => item.fmt(f)?,
                    }
                }
                Ok(())
            }
            MarkerTree::Or(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" or ")?;
                    }
                    item.fmt(f)?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for MarkerTree {
    type Err = ParseRequirementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens = tokenize(s)?;
        let mut parser = Parser {
            source: s,
            tokens,
            pos: 0,
        };
        let tree = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(tree)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Variable(MarkerVariable),
    Literal(String),
    Operator(MarkerOperator),
    And,
    Or,
    LParen,
    RParen,
}

fn tokenize(source: &str) -> Result<Vec<Token>, ParseRequirementError> {
    let error = |message: String| ParseRequirementError::InvalidMarker {
        marker: source.trim().to_string(),
        message,
    };

    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '\'' | '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == c)
                    .ok_or_else(|| error("unterminated string".to_string()))?;
                tokens.push(Token::Literal(chars[i + 1..i + 1 + end].iter().collect()));
                i += end + 2;
            }
            '<' | '>' | '=' | '!' | '~' => {
                let len = chars[i..]
                    .iter()
                    .take_while(|ch| matches!(ch, '<' | '>' | '=' | '!' | '~'))
                    .count();
                let symbol: String = chars[i..i + len].iter().collect();
                let op = MarkerOperator::from_symbol(&symbol)
                    .ok_or_else(|| error(format!("unknown operator '{symbol}'")))?;
                tokens.push(Token::Operator(op));
                i += len;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let len = chars[i..]
                    .iter()
                    .take_while(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.'))
                    .count();
                let word: String = chars[i..i + len].iter().collect();
                i += len;
                let token = match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "in" => Token::Operator(MarkerOperator::In),
                    "not" => match next_word(&chars, &mut i) {
                        Some(next) if next == "in" => Token::Operator(MarkerOperator::NotIn),
                        _ => return Err(error("expected 'in' after 'not'".to_string())),
                    },
                    other => Token::Variable(
                        other
                            .parse()
                            .map_err(|_| error(format!("unknown marker variable '{other}'")))?,
                    ),
                };
                tokens.push(token);
            }
            other => return Err(error(format!("unexpected character '{other}'"))),
        }
    }

    Ok(tokens)
}

/// Read the next alphabetic word after optional whitespace, advancing `i` past it.
fn next_word(chars: &[char], i: &mut usize) -> Option<String> {
    while *i < chars.len() && chars[*i].is_whitespace() {
        *i += 1;
    }
    let len = chars[*i..]
        .iter()
        .take_while(|ch| ch.is_ascii_alphabetic())
        .count();
    if len == 0 {
        return None;
    }
    let word = chars[*i..*i + len].iter().collect();
    *i += len;
    Some(word)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: &str) -> ParseRequirementError {
        ParseRequirementError::InvalidMarker {
            marker: self.source.trim().to_string(),
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_or(&mut self) -> Result<MarkerTree, ParseRequirementError> {
        let mut items = vec![self.parse_and()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            items.push(self.parse_and()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            MarkerTree::Or(items)
        })
    }

    fn parse_and(&mut self) -> Result<MarkerTree, ParseRequirementError> {
        let mut items = vec![self.parse_atom()?];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            items.push(self.parse_atom()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            MarkerTree::And(items)
        })
    }

    fn parse_atom(&mut self) -> Result<MarkerTree, ParseRequirementError> {
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let inner = self.parse_or()?;
            return match self.next() {
                Some(Token::RParen) => Ok(inner),
                _ => Err(self.error("expected ')'")),
            };
        }

        let lhs = self.parse_value()?;
        let operator = match self.next() {
            Some(Token::Operator(op)) => op,
            _ => return Err(self.error("expected a comparison operator")),
        };
        let rhs = self.parse_value()?;
        Ok(MarkerTree::Expression(MarkerExpression { lhs, operator, rhs }))
    }

    fn parse_value(&mut self) -> Result<MarkerValue, ParseRequirementError> {
        match self.next() {
            Some(Token::Variable(var)) => Ok(MarkerValue::Variable(var)),
            Some(Token::Literal(value)) => Ok(MarkerValue::Literal(value)),
            _ => Err(self.error("expected a marker variable or a quoted string")),
        }
    }
}
