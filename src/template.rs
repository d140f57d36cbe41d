//! Message templates.
//!
//! A template is a parameterized message string such as `Hello {0}`. It is
//! compiled once into a [`CompiledFormat`] bound to a locale and rendered
//! many times with positional arguments.
//!
//! Syntax:
//! - `{n}` inserts argument `n` (0-based); `{n,type}` and `{n,type,style}` are
//!   accepted and the type/style text is kept on the placeholder
//! - `''` is a literal apostrophe
//! - `'` directly followed by `{` or `}` opens a quoted run that ends at the
//!   next lone `'`; braces inside it are literal
//! - any other `'` is a literal apostrophe
//!
//! An argument missing at render time is rendered as its placeholder `{n}`.

use std::fmt;
use std::fmt::Write;

use crate::Locale;
use crate::TemplateError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Argument { index: usize, format: Option<String> },
}

/// Parsed, locale-bound, renderable form of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFormat {
    locale: Locale,
    source: String,
    segments: Vec<Segment>,
}

impl CompiledFormat {
    pub fn compile(
        template: &str,
        locale: &Locale,
    ) -> std::result::Result<Self, TemplateError> {
        Ok(Self {
            locale: locale.clone(),
            source: template.to_string(),
            segments: parse(template)?,
        })
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// The raw template this format was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of positional arguments the template references
    pub fn argument_count(&self) -> usize {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Argument { index, .. } => Some(index + 1),
                Segment::Literal(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Format type (and style) of the first placeholder for `index`
    pub fn argument_format(
        &self,
        index: usize,
    ) -> Option<&str> {
        self.segments.iter().find_map(|s| match s {
            Segment::Argument { index: i, format } if *i == index => format.as_deref(),
            _ => None,
        })
    }

    pub fn render<A: fmt::Display>(
        &self,
        args: &[A],
    ) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Argument { index, .. } => match args.get(*index) {
                    Some(arg) => {
                        let _ = write!(out, "{arg}");
                    }
                    None => {
                        let _ = write!(out, "{{{index}}}");
                    }
                },
            }
        }
        out
    }
}

/// Compiles and renders `template` in one step.
pub fn format_message<A: fmt::Display>(
    template: &str,
    locale: &Locale,
    args: &[A],
) -> std::result::Result<String, TemplateError> {
    Ok(CompiledFormat::compile(template, locale)?.render(args))
}

fn parse(template: &str) -> std::result::Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '\'' => match chars.peek().map(|&(_, c)| c) {
                Some('\'') => {
                    chars.next();
                    literal.push('\'');
                }
                Some('{') | Some('}') => {
                    let mut closed = false;
                    while let Some((_, c)) = chars.next() {
                        if c != '\'' {
                            literal.push(c);
                        } else if chars.peek().map(|&(_, n)| n) == Some('\'') {
                            chars.next();
                            literal.push('\'');
                        } else {
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(TemplateError::UnterminatedQuote);
                    }
                }
                _ => literal.push('\''),
            },
            '{' => {
                let mut body = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    match c {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => return Err(TemplateError::UnmatchedBrace { position: pos }),
                        c => body.push(c),
                    }
                }
                if !closed {
                    return Err(TemplateError::UnmatchedBrace { position: pos });
                }

                let (index_text, format) = match body.split_once(',') {
                    Some((i, f)) => (i.trim(), Some(f.trim().to_string())),
                    None => (body.trim(), None),
                };
                let index = index_text
                    .parse::<usize>()
                    .map_err(|_| TemplateError::InvalidArgumentIndex {
                        position: pos,
                        text: index_text.to_string(),
                    })?;

                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Argument { index, format });
            }
            '}' => return Err(TemplateError::UnmatchedBrace { position: pos }),
            c => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}
