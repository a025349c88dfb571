use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// The RPM dependency tag a directive line is emitted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveTag {
    BuildRequires,
    Requires,
    Recommends,
    Suggests,
    Supplements,
    Enhances,
    Provides,
}

impl DirectiveTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectiveTag::BuildRequires => "BuildRequires",
            DirectiveTag::Requires => "Requires",
            DirectiveTag::Recommends => "Recommends",
            DirectiveTag::Suggests => "Suggests",
            DirectiveTag::Supplements => "Supplements",
            DirectiveTag::Enhances => "Enhances",
            DirectiveTag::Provides => "Provides",
        }
    }

    /// Format one directive line, e.g. `Requires: python3dist(foo)`
    pub fn line(&self, requirement: &str) -> String {
        format!("{}: {requirement}", self.as_str())
    }
}

impl Display for DirectiveTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for tags RPM does not know
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dependency tag '{0}'")]
pub struct UnknownDirectiveTag(pub String);

impl FromStr for DirectiveTag {
    type Err = UnknownDirectiveTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = match s.trim().to_ascii_lowercase().as_str() {
            "buildrequires" => DirectiveTag::BuildRequires,
            "requires" => DirectiveTag::Requires,
            "recommends" => DirectiveTag::Recommends,
            "suggests" => DirectiveTag::Suggests,
            "supplements" => DirectiveTag::Supplements,
            "enhances" => DirectiveTag::Enhances,
            "provides" => DirectiveTag::Provides,
            _ => return Err(UnknownDirectiveTag(s.trim().to_string())),
        };
        Ok(tag)
    }
}
