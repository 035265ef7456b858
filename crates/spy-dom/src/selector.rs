//! CSS selector subset
//!
//! Supports comma separated lists of compound selectors made of an optional
//! tag name, `.class`, `#id` and attribute matchers (`[a]`, `[a="v"]`,
//! `[a^="v"]`, `[a$="v"]`, `[a*="v"]`). Combinators are not supported; queries
//! are always scoped to a root element instead.

use std::fmt;
use std::str::FromStr;

use crate::{DomError, Result};

/// Attribute comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    /// `[name]`
    Exists,
    /// `[name="value"]`
    Equals,
    /// `[name^="value"]`
    Prefix,
    /// `[name$="value"]`
    Suffix,
    /// `[name*="value"]`
    Contains,
}

/// A single attribute matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMatch {
    /// Attribute name
    pub name: String,
    /// Comparison operator
    pub op: AttributeOp,
    /// Value to compare against (empty for [`AttributeOp::Exists`])
    pub value: String,
}

impl AttributeMatch {
    /// Match elements carrying the attribute at all
    pub fn exists(name: impl Into<String>) -> Self {
        Self { name: name.into(), op: AttributeOp::Exists, value: String::new() }
    }

    /// Match elements whose attribute ends with `value`
    pub fn suffix(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), op: AttributeOp::Suffix, value: value.into() }
    }

    /// Test an attribute value against this matcher
    pub fn test(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        match self.op {
            AttributeOp::Exists => true,
            AttributeOp::Equals => actual == self.value,
            AttributeOp::Prefix => !self.value.is_empty() && actual.starts_with(&self.value),
            AttributeOp::Suffix => !self.value.is_empty() && actual.ends_with(&self.value),
            AttributeOp::Contains => !self.value.is_empty() && actual.contains(&self.value),
        }
    }
}

/// One alternative of a selector list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    /// Tag name, compared case-insensitively
    pub tag: Option<String>,
    /// Element id
    pub id: Option<String>,
    /// Required classes
    pub classes: Vec<String>,
    /// Required attributes
    pub attributes: Vec<AttributeMatch>,
}

/// Parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

impl Selector {
    /// Parse a selector list
    pub fn parse(source: &str) -> Result<Self> {
        let mut alternatives = Vec::new();
        for part in source.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(invalid(source, "empty selector in list"));
            }
            alternatives.push(parse_compound(source, part)?);
        }
        Ok(Self { alternatives })
    }

    /// Selector matching any of the given classes
    pub fn any_class(classes: &[&str]) -> Self {
        let alternatives = classes
            .iter()
            .map(|class| Compound { classes: vec![(*class).to_string()], ..Compound::default() })
            .collect();
        Self { alternatives }
    }

    /// Selector matching a single id
    pub fn id(id: impl Into<String>) -> Self {
        Self { alternatives: vec![Compound { id: Some(id.into()), ..Compound::default() }] }
    }

    /// Add an attribute matcher to every alternative
    pub fn with_attribute(mut self, matcher: AttributeMatch) -> Self {
        for alternative in &mut self.alternatives {
            alternative.attributes.push(matcher.clone());
        }
        self
    }

    /// Union of two selector lists
    pub fn or(mut self, other: Selector) -> Self {
        self.alternatives.extend(other.alternatives);
        self
    }

    /// The alternatives of this list
    pub fn alternatives(&self) -> &[Compound] {
        &self.alternatives
    }
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, compound) in self.alternatives.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if let Some(tag) = &compound.tag {
                write!(f, "{}", tag)?;
            }
            if let Some(id) = &compound.id {
                write!(f, "#{}", id)?;
            }
            for class in &compound.classes {
                write!(f, ".{}", class)?;
            }
            for attr in &compound.attributes {
                let op = match attr.op {
                    AttributeOp::Exists => {
                        write!(f, "[{}]", attr.name)?;
                        continue;
                    }
                    AttributeOp::Equals => "=",
                    AttributeOp::Prefix => "^=",
                    AttributeOp::Suffix => "$=",
                    AttributeOp::Contains => "*=",
                };
                write!(f, "[{}{}\"{}\"]", attr.name, op, attr.value)?;
            }
        }
        Ok(())
    }
}

fn invalid(source: &str, reason: impl Into<String>) -> DomError {
    DomError::InvalidSelector { selector: source.to_string(), reason: reason.into() }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn parse_compound(source: &str, part: &str) -> Result<Compound> {
    let chars: Vec<char> = part.chars().collect();
    let mut compound = Compound::default();
    let mut pos = 0;

    let read_ident = |pos: &mut usize| -> String {
        let start = *pos;
        while *pos < chars.len() && is_ident_char(chars[*pos]) {
            *pos += 1;
        }
        chars[start..*pos].iter().collect()
    };

    if pos < chars.len() && (chars[pos].is_alphabetic() || chars[pos] == '*') {
        if chars[pos] == '*' {
            pos += 1;
        } else {
            compound.tag = Some(read_ident(&mut pos).to_ascii_uppercase());
        }
    }

    while pos < chars.len() {
        match chars[pos] {
            '.' => {
                pos += 1;
                let class = read_ident(&mut pos);
                if class.is_empty() {
                    return Err(invalid(source, "expected class name after '.'"));
                }
                compound.classes.push(class);
            }
            '#' => {
                pos += 1;
                let id = read_ident(&mut pos);
                if id.is_empty() {
                    return Err(invalid(source, "expected id after '#'"));
                }
                compound.id = Some(id);
            }
            '[' => {
                pos += 1;
                let name = read_ident(&mut pos);
                if name.is_empty() {
                    return Err(invalid(source, "expected attribute name"));
                }
                let op = match (chars.get(pos), chars.get(pos + 1)) {
                    (Some(']'), _) => {
                        pos += 1;
                        compound.attributes.push(AttributeMatch::exists(name));
                        continue;
                    }
                    (Some('='), _) => {
                        pos += 1;
                        AttributeOp::Equals
                    }
                    (Some('^'), Some('=')) => {
                        pos += 2;
                        AttributeOp::Prefix
                    }
                    (Some('$'), Some('=')) => {
                        pos += 2;
                        AttributeOp::Suffix
                    }
                    (Some('*'), Some('=')) => {
                        pos += 2;
                        AttributeOp::Contains
                    }
                    _ => return Err(invalid(source, "unsupported attribute operator")),
                };
                let value = match chars.get(pos) {
                    Some(&quote) if quote == '"' || quote == '\'' => {
                        pos += 1;
                        let start = pos;
                        while pos < chars.len() && chars[pos] != quote {
                            pos += 1;
                        }
                        if pos >= chars.len() {
                            return Err(invalid(source, "unterminated attribute value"));
                        }
                        let value: String = chars[start..pos].iter().collect();
                        pos += 1;
                        value
                    }
                    _ => read_ident(&mut pos),
                };
                if chars.get(pos) != Some(&']') {
                    return Err(invalid(source, "expected ']'"));
                }
                pos += 1;
                compound.attributes.push(AttributeMatch { name, op, value });
            }
            c if c.is_whitespace() || c == '>' || c == '+' || c == '~' => {
                return Err(invalid(source, "combinators are not supported"));
            }
            c => return Err(invalid(source, format!("unexpected character {:?}", c))),
        }
    }

    Ok(compound)
}
