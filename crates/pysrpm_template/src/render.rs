use std::collections::HashSet;

use pysrpm_config::{EffectiveConfig, Section};
use pysrpm_types::{FieldLookup, normalize_field};

use crate::error::{Namespace, RenderError};
use crate::token::{Token, tokenize};

/// Expands the placeholders of a template, line by line.
///
/// `{field}` reads package metadata, `${key}` reads the configuration (the
/// template's own section first, then the base section) and `%{alias}`
/// expands a macro alias. Every other `%{...}` is RPM's business and copied
/// verbatim.
///
/// A line referencing a missing metadata field is dropped when that field
/// is listed in the optional keys, and is an error otherwise.
pub struct PlaceholderResolver<'a> {
    metadata: &'a dyn FieldLookup,
    section: &'a Section,
    base: &'a Section,
    macros: Option<&'a Section>,
    config: Option<&'a EffectiveConfig>,
    optional_keys: HashSet<String>,
}

/// The rendered lines of one template line, or `None` when it is dropped
type Rendered = Option<Vec<String>>;

impl<'a> PlaceholderResolver<'a> {
    /// The optional keys are read from the `optional_keys` value of `section`,
    /// falling back to `base`.
    pub fn new(metadata: &'a dyn FieldLookup, section: &'a Section, base: &'a Section) -> Self {
        let optional_keys = section
            .get("optional_keys")
            .or_else(|| base.get("optional_keys"))
            .unwrap_or_default()
            .split_whitespace()
            .map(normalize_field)
            .collect();
        Self {
            metadata,
            section,
            base,
            macros: None,
            config: None,
            optional_keys,
        }
    }

    /// Resolve `%{name}` through the given macro aliases
    pub fn with_macros(mut self, macros: &'a Section) -> Self {
        self.macros = Some(macros);
        self
    }

    /// Allow `${section:key}` to address any section of `config`. Also
    /// enables the macro aliases of `config`.
    pub fn with_config(mut self, config: &'a EffectiveConfig) -> Self {
        self.config = Some(config);
        if self.macros.is_none() {
            self.macros = Some(config.macros());
        }
        self
    }

    /// Replace the optional keys
    pub fn with_optional_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.optional_keys = keys.into_iter().map(|k| normalize_field(k.as_ref())).collect();
        self
    }

    /// Render `template` and join the surviving lines with newlines.
    pub fn render(&self, template: &str) -> Result<String, RenderError> {
        Ok(self.render_lines(template)?.join("\n"))
    }

    /// Render `template` into its surviving lines. Every line of the
    /// template may be dropped, in which case the result is empty.
    pub fn render_lines(&self, template: &str) -> Result<Vec<String>, RenderError> {
        self.render_in(self.section, template, &mut Vec::new())
    }

    fn render_in(
        &self,
        section: &Section,
        template: &str,
        stack: &mut Vec<String>,
    ) -> Result<Vec<String>, RenderError> {
        let mut lines = Vec::new();
        for (index, line) in template.split('\n').enumerate() {
            if let Some(rendered) = self.render_line(section, line, index + 1, stack)? {
                lines.extend(rendered);
            }
        }
        Ok(lines)
    }

    fn render_line(
        &self,
        section: &Section,
        line: &str,
        line_no: usize,
        stack: &mut Vec<String>,
    ) -> Result<Rendered, RenderError> {
        let tokens = tokenize(line).map_err(|message| RenderError::Syntax {
            message,
            line: line_no,
            text: line.to_string(),
        })?;
        let indent = &line[..line.len() - line.trim_start().len()];
        let missing = |namespace: Namespace, name: &str| RenderError::MissingField {
            namespace,
            name: name.to_string(),
            line: line_no,
            text: line.to_string(),
        };

        let mut out = vec![String::new()];
        for token in tokens {
            match token {
                Token::Text(text) => push_text(&mut out, text),
                Token::Field(name) => match self.metadata.field(name) {
                    Some(value) => splice(&mut out, value.split('\n'), indent),
                    None if self.optional_keys.contains(&normalize_field(name)) => {
                        tracing::trace!("Dropping line `{line}`: '{name}' is not set");
                        return Ok(None);
                    }
                    None => return Err(missing(Namespace::Metadata, name)),
                },
                Token::Config {
                    section: target,
                    key,
                } => {
                    let (owner, value) = self
                        .lookup(section, target, key)
                        .ok_or_else(|| missing(Namespace::Config, &qualified(target, key)))?;
                    let value = self.expand(owner, key, value, stack)?;
                    if value.is_empty() {
                        return Ok(None);
                    }
                    splice(&mut out, value.iter().map(String::as_str), indent);
                }
                Token::Macro(body) => match self.macros.and_then(|m| m.get(body).map(|v| (m, v))) {
                    Some((macros, value)) => {
                        let value = self.expand(macros, body, value, stack)?;
                        if value.is_empty() {
                            return Ok(None);
                        }
                        splice(&mut out, value.iter().map(String::as_str), indent);
                    }
                    None => {
                        push_text(&mut out, "%{");
                        push_text(&mut out, body);
                        push_text(&mut out, "}");
                    }
                },
            }
        }
        Ok(Some(out))
    }

    /// Find a configuration value and the section that holds it
    fn lookup<'s>(
        &'s self,
        current: &'s Section,
        target: Option<&str>,
        key: &str,
    ) -> Option<(&'s Section, &'s str)> {
        let Some(name) = target else {
            return [current, self.base]
                .into_iter()
                .find_map(|s| s.get(key).map(|value| (s, value)));
        };

        let candidates = [Some(current), Some(self.section), Some(self.base), self.macros];
        let section = self
            .config
            .and_then(|config| config.section(name))
            .or_else(|| candidates.into_iter().flatten().find(|s| s.name() == name))?;
        section.get(key).map(|value| (section, value))
    }

    /// Render a configuration value in the context of its own section
    fn expand(
        &self,
        owner: &Section,
        key: &str,
        value: &str,
        stack: &mut Vec<String>,
    ) -> Result<Vec<String>, RenderError> {
        let id = format!("{}:{key}", owner.name());
        if stack.contains(&id) {
            let mut chain = stack.clone();
            chain.push(id);
            return Err(RenderError::Cycle { chain });
        }
        stack.push(id);
        let lines = self.render_in(owner, value, stack)?;
        stack.pop();
        Ok(lines)
    }
}

fn qualified(section: Option<&str>, key: &str) -> String {
    match section {
        Some(section) => format!("{section}:{key}"),
        None => key.to_string(),
    }
}

fn push_text(out: &mut [String], text: &str) {
    if let Some(last) = out.last_mut() {
        last.push_str(text);
    }
}

/// Append a multi-line value: its first line continues the current line,
/// the others start new lines with the template line's indentation.
fn splice<'v>(out: &mut Vec<String>, mut value: impl Iterator<Item = &'v str>, indent: &str) {
    if let Some(first) = value.next() {
        push_text(out, first);
    }
    for line in value {
        if line.trim().is_empty() {
            out.push(String::new());
        } else {
            out.push(format!("{indent}{line}"));
        }
    }
}
