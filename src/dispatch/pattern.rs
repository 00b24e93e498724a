//! HTTP path templates.
//!
//! Supports the binding template syntax:
//! - literal segments: `/v1/users`
//! - `*`: exactly one segment
//! - `**`: any number of trailing segments (last position only)
//! - `{var}` (same as `{var=*}`) and `{var=projects/*/users/*}`
//! - a trailing `:verb` suffix on the last segment

use std::fmt;

/// Errors raised while parsing a path template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("path template {0:?} must start with '/'")]
    MissingLeadingSlash(String),

    #[error("path template {0:?} has an unterminated variable")]
    UnterminatedVariable(String),

    #[error("path template {0:?} has an empty variable name")]
    EmptyVariable(String),

    #[error("path template {0:?} uses '**' before the last segment")]
    DeepWildcardNotLast(String),

    #[error("path template {0:?} has an empty segment")]
    EmptySegment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Any,
    Rest,
}

/// A parsed path template.
#[derive(Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
    verb: Option<String>,
}

impl PathTemplate {
    pub fn parse(template: &str) -> Result<Self, PatternError> {
        let err_source = || template.to_string();
        let body = template
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash(err_source()))?;

        // The verb follows the last ':' that is outside any variable braces.
        let (path, verb) = split_verb(body);

        let mut segments = Vec::new();
        let mut rest = path;
        while !rest.is_empty() {
            if let Some(inner) = rest.strip_prefix('{') {
                let end = inner
                    .find('}')
                    .ok_or_else(|| PatternError::UnterminatedVariable(err_source()))?;
                let (name, sub) = match inner[..end].split_once('=') {
                    Some((name, sub)) => (name, sub),
                    None => (&inner[..end], "*"),
                };
                if name.is_empty() {
                    return Err(PatternError::EmptyVariable(err_source()));
                }
                for part in sub.split('/') {
                    segments.push(parse_segment(part, template)?);
                }
                rest = &inner[end + 1..];
            } else {
                let end = rest.find('/').unwrap_or(rest.len());
                segments.push(parse_segment(&rest[..end], template)?);
                rest = &rest[end..];
            }
            rest = rest.strip_prefix('/').unwrap_or(rest);
        }

        if let Some(pos) = segments.iter().position(|s| *s == Segment::Rest)
            && pos != segments.len() - 1
        {
            return Err(PatternError::DeepWildcardNotLast(err_source()));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
            verb: verb.map(str::to_string),
        })
    }

    /// Whether a request path matches the template.
    ///
    /// The verb is split off the last path component at its last `:` and
    /// must equal the template's verb; a template without a verb only
    /// matches paths without one.
    pub fn matches(&self, path: &str) -> bool {
        let Some(path) = path.strip_prefix('/') else {
            return false;
        };

        let mut components: Vec<&str> = if path.is_empty() {
            Vec::new()
        } else {
            path.split('/').collect()
        };

        let mut verb = None;
        if let Some(last) = components.last_mut() {
            let component: &str = *last;
            match component.rfind(':') {
                Some(0) => return false,
                Some(idx) => {
                    verb = Some(&component[idx + 1..]);
                    *last = &component[..idx];
                }
                None => {}
            }
        }
        if verb != self.verb.as_deref() {
            return false;
        }

        let mut i = 0;
        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::Any => {
                    if i >= components.len() {
                        return false;
                    }
                }
                Segment::Literal(lit) => {
                    if components.get(i) != Some(&lit.as_str()) {
                        return false;
                    }
                }
            }
            i += 1;
        }
        i == components.len()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathTemplate({:?})", self.source)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_segment(part: &str, template: &str) -> Result<Segment, PatternError> {
    match part {
        "" => Err(PatternError::EmptySegment(template.to_string())),
        "*" => Ok(Segment::Any),
        "**" => Ok(Segment::Rest),
        lit => Ok(Segment::Literal(lit.to_string())),
    }
}

fn split_verb(body: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    let mut split = None;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => split = Some(i),
            _ => {}
        }
    }
    match split {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    }
}
