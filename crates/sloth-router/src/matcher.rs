//! URL matching against compiled patterns.

use std::collections::HashMap;

use crate::pattern::{RoutePattern, Segment, SegmentPart};

/// Parameter captures for one matched URL.
pub type RouteParams = HashMap<String, String>;

impl RoutePattern {
    /// Match a request path, returning percent-decoded captures.
    ///
    /// A catch-all captures the remaining segments joined by `/`
    /// (possibly the empty string). Mixed segments capture the
    /// shortest non-empty text for each param.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let url_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = RouteParams::new();
        let mut cursor = 0;

        for segment in &self.segments {
            match segment {
                Segment::CatchAll(name) => {
                    let rest: Vec<String> =
                        url_segments[cursor..].iter().map(|s| decode(s)).collect();
                    params.insert(name.clone(), rest.join("/"));
                    return Some(params);
                }
                Segment::Static(text) => {
                    if url_segments.get(cursor).copied() != Some(text.as_str()) {
                        return None;
                    }
                    cursor += 1;
                }
                Segment::Param(name) => {
                    let value = url_segments.get(cursor)?;
                    params.insert(name.clone(), decode(value));
                    cursor += 1;
                }
                Segment::Mixed(parts) => {
                    let value = url_segments.get(cursor)?;
                    if !match_mixed(parts, value, &mut params) {
                        return None;
                    }
                    cursor += 1;
                }
            }
        }

        if cursor == url_segments.len() {
            Some(params)
        } else {
            None
        }
    }
}

fn decode(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Match interleaved literals and params within one segment.
///
/// Params try the shortest candidate first and back off until the
/// remaining parts fit, so `[foo]-[bar]` against `a-b-c` captures
/// `foo=a`, `bar=b-c`.
fn match_mixed(parts: &[SegmentPart], text: &str, params: &mut RouteParams) -> bool {
    let Some((first, rest)) = parts.split_first() else {
        return text.is_empty();
    };

    match first {
        SegmentPart::Literal(literal) => match text.strip_prefix(literal.as_str()) {
            Some(tail) => match_mixed(rest, tail, params),
            None => false,
        },
        SegmentPart::Param(name) => {
            if rest.is_empty() {
                if text.is_empty() {
                    return false;
                }
                params.insert(name.clone(), decode(text));
                return true;
            }
            for end in (1..=text.len()).filter(|&i| text.is_char_boundary(i)) {
                params.insert(name.clone(), decode(&text[..end]));
                if match_mixed(rest, &text[end..], params) {
                    return true;
                }
            }
            false
        }
    }
}
