//! Route template compilation.
//!
//! A template such as `/api/users/:id/*` is compiled once, at registration time, into an
//! ordered list of [`Segment`]s:
//! - literal text, including the slashes between literal parts, collapses into one
//!   [`Segment::Literal`]
//! - `:name` becomes [`Segment::Param`] holding `name`
//! - `*` becomes [`Segment::Wildcard`]
//!
//! The slash directly in front of a param or a wildcard belongs to that segment and is
//! not part of the preceding literal, so `/api/:id` compiles to `[Literal("/api"), Param("id")]`.

use crate::error::PatternError;
use crate::utils::ensure;
use std::fmt;
use std::str::FromStr;

/// One token of a compiled pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

/// A compiled, immutable route template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    template: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compiles a template into its segments
    ///
    /// # Errors
    ///
    /// - [`PatternError::MissingLeadingSlash`] if the template does not start with `/`
    /// - [`PatternError::InvalidParamLocation`] if a `:` does not directly follow `/`
    /// - [`PatternError::InvalidWildcardLocation`] if a `*` does not directly follow `/`
    /// - [`PatternError::InvalidWildcardRoute`] if anything follows a `*`
    /// - [`PatternError::MissingParamName`] if a `:` has no name after it
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        ensure!(template.starts_with('/'), PatternError::MissingLeadingSlash);

        let bytes = template.as_bytes();
        let mut segments = Vec::with_capacity(4);
        let mut literal_start = 0;

        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b':' => {
                    ensure!(bytes[i - 1] == b'/', PatternError::InvalidParamLocation { position: i });

                    push_literal(&mut segments, &template[literal_start..i - 1]);

                    let name_end = template[i + 1..].find('/').map_or(bytes.len(), |n| i + 1 + n);
                    let name = &template[i + 1..name_end];
                    ensure!(!name.is_empty(), PatternError::MissingParamName { position: i });

                    segments.push(Segment::Param(name.to_owned()));
                    literal_start = name_end;
                }
                b'*' => {
                    ensure!(bytes[i - 1] == b'/', PatternError::InvalidWildcardLocation { position: i });
                    ensure!(i == bytes.len() - 1, PatternError::InvalidWildcardRoute);

                    push_literal(&mut segments, &template[literal_start..i - 1]);

                    segments.push(Segment::Wildcard);
                    literal_start = bytes.len();
                }
                _ => {}
            }
        }

        if literal_start < bytes.len() {
            push_literal(&mut segments, &template[literal_start..]);
        }

        Ok(Self { template: template.to_owned(), segments })
    }

    /// The template this pattern was compiled from
    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of [`Segment::Param`] in this pattern
    pub fn num_params(&self) -> usize {
        self.segments.iter().filter(|segment| matches!(segment, Segment::Param(_))).count()
    }
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::Literal(text.to_owned()));
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
