//! Path pattern compiler.
//!
//! Turns a route-relative file path into a URL pattern:
//!
//! - `blog/[slug].rs`    -> `/blog/:slug`
//! - `docs/[...rest].rs` -> `/docs/:rest*` (later segments truncated)
//! - `@[user].rs`        -> `/@:user`
//! - `blog/index.rs`     -> `/blog` (trailing `index` dropped)
//! - `index.rs`          -> `/`
//!
//! Bracket syntax errors are build-time fatal and reported per
//! category so callers can attach the offending file path.

use thiserror::Error;

/// Malformed bracket syntax in a route file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("Path must not contain multiple parameters without a separator")]
    AdjacentParams,
    #[error("No ending bracket found")]
    UnclosedBracket,
    #[error("Opening bracket found before closing bracket")]
    NestedBracket,
    #[error("Closing bracket found without an opening bracket")]
    UnexpectedClosingBracket,
}

/// One piece of a mixed segment such as `@[user]` or `[foo]-[bar]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentPart {
    Literal(String),
    Param(String),
}

/// A compiled pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Plain text, matched verbatim.
    Static(String),
    /// `[name]` spanning the whole segment, matched as `:name`.
    Param(String),
    /// `[...name]` spanning the whole segment, matched as `:name*`.
    /// Always the last segment of its pattern.
    CatchAll(String),
    /// Literals and params interleaved within one segment.
    Mixed(Vec<SegmentPart>),
}

impl Segment {
    fn render(&self, out: &mut String) {
        match self {
            Segment::Static(text) => out.push_str(text),
            Segment::Param(name) => {
                out.push(':');
                out.push_str(name);
            }
            Segment::CatchAll(name) => {
                out.push(':');
                out.push_str(name);
                out.push('*');
            }
            Segment::Mixed(parts) => {
                for part in parts {
                    match part {
                        SegmentPart::Literal(text) => out.push_str(text),
                        SegmentPart::Param(name) => {
                            out.push(':');
                            out.push_str(name);
                        }
                    }
                }
            }
        }
    }
}

/// A compiled route pattern.
///
/// `deep` is the number of URL segments the pattern spans; the route
/// table sorts on it so deeper routes are tried first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    pub pattern: String,
    pub deep: usize,
    pub segments: Vec<Segment>,
}

/// Compile a route-relative file path into a [`RoutePattern`].
pub fn compile_route_pattern(relative_path: &str) -> Result<RoutePattern, PatternError> {
    let trimmed = relative_path.trim_start_matches("./").trim_start_matches('/');

    let mut raw_segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

    // The file extension lives on the last segment only.
    if let Some(last) = raw_segments.last_mut() {
        *last = strip_extension(last);
    }
    if raw_segments.last() == Some(&"index") {
        raw_segments.pop();
    }

    let mut segments = Vec::with_capacity(raw_segments.len());
    for raw in &raw_segments {
        let segment = compile_segment(raw)?;
        let is_catch_all = matches!(segment, Segment::CatchAll(_));
        segments.push(segment);
        if is_catch_all {
            // A catch-all swallows the rest of the URL, so any deeper
            // file path segments are unreachable and get truncated.
            break;
        }
    }

    let mut pattern = String::new();
    for segment in &segments {
        pattern.push('/');
        segment.render(&mut pattern);
    }
    if pattern.is_empty() {
        pattern.push('/');
    }

    Ok(RoutePattern {
        pattern,
        deep: segments.len(),
        segments,
    })
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

fn compile_segment(raw: &str) -> Result<Segment, PatternError> {
    if let Some(name) = raw
        .strip_prefix("[...")
        .and_then(|rest| rest.strip_suffix(']'))
    {
        if !name.contains('[') && !name.contains(']') {
            return Ok(Segment::CatchAll(name.to_string()));
        }
    }

    let mut parts: Vec<SegmentPart> = Vec::new();
    let mut literal = String::new();
    let mut param: Option<String> = None;

    for ch in raw.chars() {
        match ch {
            '[' => {
                if param.is_some() {
                    return Err(PatternError::NestedBracket);
                }
                if literal.is_empty() && matches!(parts.last(), Some(SegmentPart::Param(_))) {
                    return Err(PatternError::AdjacentParams);
                }
                if !literal.is_empty() {
                    parts.push(SegmentPart::Literal(std::mem::take(&mut literal)));
                }
                param = Some(String::new());
            }
            ']' => match param.take() {
                Some(name) => parts.push(SegmentPart::Param(name)),
                None => return Err(PatternError::UnexpectedClosingBracket),
            },
            _ => match param.as_mut() {
                Some(name) => name.push(ch),
                None => literal.push(ch),
            },
        }
    }

    if param.is_some() {
        return Err(PatternError::UnclosedBracket);
    }
    if !literal.is_empty() {
        parts.push(SegmentPart::Literal(literal));
    }

    Ok(match parts.as_slice() {
        [SegmentPart::Param(name)] => Segment::Param(name.clone()),
        [SegmentPart::Literal(text)] => Segment::Static(text.clone()),
        _ => Segment::Mixed(parts),
    })
}
