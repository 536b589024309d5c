//! A registered route and its matching algorithm.
//!
//! Matching walks the compiled segments against the unconsumed rest of the path:
//! - a literal must be a prefix of the rest and must end on a `/` boundary or at the end
//!   of the path, so `/user` never matches `/users`
//! - a param consumes the separating `/` and captures everything up to the next `/`
//! - a wildcard accepts whatever is left, including nothing, and ends the walk
//!
//! When the segments run out the whole path must have been consumed.

use crate::handler::HandlerChain;
use crate::params::Params;
use crate::pattern::{Pattern, Segment};
use http::Method;
use std::fmt;

/// A compiled pattern bound to a method and a handler chain
pub struct Route {
    pattern: Pattern,
    method: Method,
    chain: HandlerChain,
}

impl Route {
    pub fn new(method: Method, pattern: Pattern, chain: HandlerChain) -> Self {
        Self { pattern, method, chain }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn chain(&self) -> &HandlerChain {
        &self.chain
    }

    pub fn num_params(&self) -> usize {
        self.pattern.num_params()
    }

    /// Matches `path` against this route, returning the captured params on success
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let mut params = Params::with_capacity(self.num_params());
        self.match_into(path, &mut params).then_some(params)
    }

    /// Matches `path`, appending captured params into `params`
    ///
    /// On failure `params` may hold a partial capture, the caller clears it before reuse.
    pub(crate) fn match_into(&self, path: &str, params: &mut Params) -> bool {
        match_segments(self.pattern.segments(), path, params)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("handlers", &self.chain.len())
            .finish()
    }
}

fn match_segments(segments: &[Segment], path: &str, params: &mut Params) -> bool {
    let mut rest = path;

    for segment in segments {
        match segment {
            Segment::Literal(text) => {
                let Some(tail) = rest.strip_prefix(text.as_str()) else {
                    return false;
                };

                if !at_boundary(tail) {
                    return false;
                }

                rest = tail;
            }

            Segment::Param(name) => {
                let Some(tail) = rest.strip_prefix('/') else {
                    return false;
                };

                let end = tail.find('/').unwrap_or(tail.len());
                if end == 0 {
                    // empty value, the path ran out before this param
                    return false;
                }

                params.push(name.as_str(), &tail[..end]);
                rest = &tail[end..];
            }

            Segment::Wildcard => return true,
        }
    }

    rest.is_empty()
}

#[inline]
fn at_boundary(tail: &str) -> bool {
    tail.is_empty() || tail.starts_with('/')
}
