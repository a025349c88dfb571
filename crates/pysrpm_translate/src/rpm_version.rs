//! Conversion of PEP 440 version specifiers into RPM (rich) dependencies.

use pysrpm_types::{Operator, Specifier};

use crate::error::TranslationError;

/// A PEP 440 version split into the parts RPM cares about
struct Version<'v> {
    epoch: Option<&'v str>,
    release: Vec<u64>,
    rest: &'v str,
}

impl<'v> Version<'v> {
    fn parse(version: &'v str) -> Self {
        let (epoch, remainder) = match version.split_once('!') {
            Some((epoch, remainder)) => (Some(epoch), remainder),
            None => (None, version),
        };
        let remainder = remainder.strip_prefix(['v', 'V']).unwrap_or(remainder);

        let mut release = Vec::new();
        let mut consumed = 0;
        for segment in remainder.split('.') {
            let digits = segment.len() - segment.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            match segment[..digits].parse::<u64>() {
                Ok(value) => release.push(value),
                Err(_) => break,
            }
            consumed += digits;
            if digits != segment.len() {
                break;
            }
            consumed += 1;
        }
        let rest = remainder.get(consumed.min(remainder.len())..).unwrap_or_default();

        Self {
            epoch,
            release,
            rest,
        }
    }

    /// The version in RPM syntax, `N!` epochs become `N:`
    fn rpm(version: &str) -> String {
        match version.split_once('!') {
            Some((epoch, remainder)) => format!("{epoch}:{remainder}"),
            None => version.to_string(),
        }
    }

    /// Whether the version is a release only, like `1.2.3`
    fn is_release(&self) -> bool {
        !self.release.is_empty() && self.rest.is_empty()
    }

    /// The smallest release greater than every version starting with `prefix`
    fn bump(&self, prefix: usize) -> String {
        let mut release = self.release[..prefix].to_vec();
        if let Some(last) = release.last_mut() {
            *last += 1;
        }
        let release = release
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        match self.epoch {
            Some(epoch) => format!("{epoch}:{release}"),
            None => release,
        }
    }
}

/// Express `specifiers` on `package` as a single RPM dependency.
///
/// `dependency` is only used for error reporting.
pub fn rpm_requirement(
    package: &str,
    dependency: &str,
    specifiers: &[Specifier],
) -> Result<String, TranslationError> {
    let mut constraints = Vec::new();
    for specifier in specifiers {
        constraints.extend(convert(package, dependency, specifier)?);
    }

    Ok(match constraints.len() {
        0 => package.to_string(),
        1 => constraints.remove(0),
        _ => format!("({})", constraints.join(" with ")),
    })
}

fn convert(
    package: &str,
    dependency: &str,
    specifier: &Specifier,
) -> Result<Vec<String>, TranslationError> {
    let invalid = |message: &str| TranslationError::InvalidSpecifier {
        dependency: dependency.to_string(),
        specifier: specifier.to_string(),
        message: message.to_string(),
    };
    let compare = |operator: &str, version: &str| format!("{package} {operator} {version}");

    if specifier.is_wildcard() {
        let base = specifier.base_version();
        let version = Version::parse(base);
        if !version.is_release() {
            return Err(invalid("wildcards are only supported on release versions"));
        }
        let lower = Version::rpm(base);
        let upper = version.bump(version.release.len());
        return match specifier.operator {
            Operator::Equal => Ok(vec![compare(">=", &lower), compare("<", &upper)]),
            Operator::NotEqual => Ok(vec![format!(
                "({} or {})",
                compare("<", &lower),
                compare(">=", &upper)
            )]),
            _ => Err(invalid("wildcards are only allowed with == and !=")),
        };
    }

    let rpm_version = Version::rpm(&specifier.version);
    Ok(match specifier.operator {
        Operator::Less => vec![compare("<", &rpm_version)],
        Operator::LessEqual => vec![compare("<=", &rpm_version)],
        Operator::Greater => vec![compare(">", &rpm_version)],
        Operator::GreaterEqual => vec![compare(">=", &rpm_version)],
        Operator::Equal | Operator::ExactEqual => vec![compare("==", &rpm_version)],
        Operator::NotEqual => vec![format!(
            "({} or {})",
            compare("<", &rpm_version),
            compare(">", &rpm_version)
        )],
        Operator::Compatible => {
            let version = Version::parse(&specifier.version);
            if version.release.len() < 2 {
                return Err(invalid("~= needs at least two release segments"));
            }
            vec![
                compare(">=", &rpm_version),
                compare("<", &version.bump(version.release.len() - 1)),
            ]
        }
    })
}
