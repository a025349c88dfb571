//! Evaluation of environment markers against a partial, fixed environment.
//!
//! The environment only knows the variables configured in
//! `environment_markers`. Comparisons involving anything else are
//! [`Truth::Unknown`], and `and`/`or` follow Kleene's three-valued logic.

use std::cmp::Ordering;

use indexmap::IndexMap;
use pysrpm_types::{MarkerExpression, MarkerOperator, MarkerTree, MarkerValue, MarkerVariable};

use crate::extras::ExtrasFilter;

/// The value of a marker in a partially known environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truth {
    True,
    False,
    Unknown,
}

impl Truth {
    fn from_bool(value: bool) -> Self {
        if value { Truth::True } else { Truth::False }
    }

    fn and(self, other: Self) -> Self {
        match (self, other) {
            (Truth::False, _) | (_, Truth::False) => Truth::False,
            (Truth::True, Truth::True) => Truth::True,
            _ => Truth::Unknown,
        }
    }

    fn or(self, other: Self) -> Self {
        match (self, other) {
            (Truth::True, _) | (_, Truth::True) => Truth::True,
            (Truth::False, Truth::False) => Truth::False,
            _ => Truth::Unknown,
        }
    }
}

/// The fixed environment markers are evaluated against
pub struct MarkerEnvironment<'a> {
    values: &'a IndexMap<String, String>,
    extras: &'a ExtrasFilter,
}

impl<'a> MarkerEnvironment<'a> {
    /// `extra == "x"` holds when `x` is selected by `extras`
    pub fn new(values: &'a IndexMap<String, String>, extras: &'a ExtrasFilter) -> Self {
        Self { values, extras }
    }

    pub fn evaluate(&self, marker: &MarkerTree) -> Truth {
        match marker {
            MarkerTree::Expression(expression) => self.evaluate_expression(expression),
            MarkerTree::And(items) => items
                .iter()
                .fold(Truth::True, |acc, item| acc.and(self.evaluate(item))),
            MarkerTree::Or(items) => items
                .iter()
                .fold(Truth::False, |acc, item| acc.or(self.evaluate(item))),
        }
    }

    fn evaluate_expression(&self, expression: &MarkerExpression) -> Truth {
        use MarkerValue::{Literal, Variable};

        let extra = match (&expression.lhs, &expression.rhs) {
            (Variable(MarkerVariable::Extra), Literal(name))
            | (Literal(name), Variable(MarkerVariable::Extra)) => Some(name),
            _ => None,
        };
        if let Some(name) = extra {
            return match expression.operator {
                MarkerOperator::Equal => Truth::from_bool(self.extras.matches(name)),
                MarkerOperator::NotEqual => Truth::from_bool(!self.extras.matches(name)),
                _ => Truth::Unknown,
            };
        }

        let (Some(lhs), Some(rhs)) = (self.resolve(&expression.lhs), self.resolve(&expression.rhs))
        else {
            return Truth::Unknown;
        };
        let version_like = [&expression.lhs, &expression.rhs]
            .into_iter()
            .any(|value| matches!(value, Variable(variable) if variable.is_version()));

        compare(lhs, expression.operator, rhs, version_like)
    }

    fn resolve<'v>(&'v self, value: &'v MarkerValue) -> Option<&'v str> {
        match value {
            MarkerValue::Literal(literal) => Some(literal),
            MarkerValue::Variable(MarkerVariable::Extra) => None,
            MarkerValue::Variable(variable) => self.values.get(variable.as_str()).map(String::as_str),
        }
    }
}

/// Numeric release segments, if `version` consists of nothing else
fn release(version: &str) -> Option<Vec<u64>> {
    version
        .split('.')
        .map(|segment| segment.parse::<u64>().ok())
        .collect()
}

fn compare_release(lhs: &[u64], rhs: &[u64]) -> Ordering {
    let len = lhs.len().max(rhs.len());
    let pad = |v: &[u64]| -> Vec<u64> {
        let mut padded = v.to_vec();
        padded.resize(len, 0);
        padded
    };
    pad(lhs).cmp(&pad(rhs))
}

fn compare(lhs: &str, operator: MarkerOperator, rhs: &str, version_like: bool) -> Truth {
    match operator {
        MarkerOperator::In => return Truth::from_bool(rhs.contains(lhs)),
        MarkerOperator::NotIn => return Truth::from_bool(!rhs.contains(lhs)),
        MarkerOperator::ExactEqual => return Truth::from_bool(lhs == rhs),
        _ => {}
    }

    // `python_version == "3.*"`
    if let Some(prefix) = rhs.strip_suffix(".*")
        && version_like
        && let (Some(value), Some(prefix)) = (release(lhs), release(prefix))
    {
        let matched = value.len() >= prefix.len() && value[..prefix.len()] == prefix[..];
        return match operator {
            MarkerOperator::Equal => Truth::from_bool(matched),
            MarkerOperator::NotEqual => Truth::from_bool(!matched),
            _ => Truth::Unknown,
        };
    }

    let (Some(left), Some(right)) = (release(lhs), release(rhs)) else {
        return match operator {
            MarkerOperator::Equal => Truth::from_bool(lhs == rhs),
            MarkerOperator::NotEqual => Truth::from_bool(lhs != rhs),
            _ => Truth::Unknown,
        };
    };

    let ordering = compare_release(&left, &right);
    let result = match operator {
        MarkerOperator::Equal => ordering == Ordering::Equal,
        MarkerOperator::NotEqual => ordering != Ordering::Equal,
        MarkerOperator::Less => ordering == Ordering::Less,
        MarkerOperator::LessEqual => ordering != Ordering::Greater,
        MarkerOperator::Greater => ordering == Ordering::Greater,
        MarkerOperator::GreaterEqual => ordering != Ordering::Less,
        MarkerOperator::Compatible => {
            if right.len() < 2 {
                return Truth::Unknown;
            }
            let prefix = &right[..right.len() - 1];
            ordering != Ordering::Less && left.len() >= prefix.len() && left[..prefix.len()] == *prefix
        }
        MarkerOperator::ExactEqual | MarkerOperator::In | MarkerOperator::NotIn => {
            return Truth::Unknown;
        }
    };
    Truth::from_bool(result)
}
