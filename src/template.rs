//! Per-metric label templates.
//!
//! A template overrides the default dot-joined label path for one metric
//! name. It is an ordinary format string: `{placeholder}` substitutes the
//! sanitized value of the label with that (sanitized) key, and the reserved
//! placeholder `{name}` substitutes the sanitized metric name. `{{` and `}}`
//! are literal braces.
//!
//! Templates are parsed once, at bridge construction, so malformed syntax is
//! rejected up front instead of on the first push.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{EncodeError, TemplateError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed wire-path template for a single metric name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl LabelTemplate {
    /// Parse a format string into a template.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    if chars.peek() == Some(&'{') {
                        chars.next();
                        literal.push('{');
                        continue;
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    let mut placeholder = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            // A '{' here means the placeholder was never closed.
                            Some('{') | None => {
                                return Err(TemplateError::UnclosedPlaceholder {
                                    template: template.to_string(),
                                });
                            }
                            Some(c) => placeholder.push(c),
                        }
                    }
                    if placeholder.is_empty() {
                        return Err(TemplateError::EmptyPlaceholder {
                            template: template.to_string(),
                        });
                    }
                    segments.push(Segment::Placeholder(placeholder));
                }
                '}' => {
                    if chars.peek() == Some(&'}') {
                        chars.next();
                        literal.push('}');
                    } else {
                        return Err(TemplateError::UnmatchedBrace {
                            template: template.to_string(),
                        });
                    }
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// Render the template against the sanitized label values of one sample.
    ///
    /// `values` must already contain the reserved `name` binding. A
    /// placeholder with no binding fails the whole sample.
    pub(crate) fn render(
        &self,
        metric: &str,
        values: &BTreeMap<String, String>,
    ) -> Result<String, EncodeError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(key) => match values.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        return Err(EncodeError::MissingPlaceholder {
                            metric: metric.to_string(),
                            placeholder: key.clone(),
                        });
                    }
                },
            }
        }
        Ok(out)
    }

    /// The original format string this template was parsed from.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for LabelTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LabelTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
