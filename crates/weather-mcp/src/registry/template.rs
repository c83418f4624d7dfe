//! URI templates with `{name}` placeholders, e.g. `weather://{city}`.

use super::capability::Arguments;
use super::registry::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed resource URI template.
///
/// A placeholder binds a non-empty run of characters without `/`. Bound
/// values are percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let invalid = |reason: &str| RegistryError::InvalidTemplate {
            template: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("template is empty"));
        }

        let mut segments: Vec<Segment> = Vec::new();
        let mut rest = raw;
        while !rest.is_empty() {
            if let Some(after_open) = rest.strip_prefix('{') {
                let close = after_open
                    .find('}')
                    .ok_or_else(|| invalid("unterminated placeholder"))?;
                let name = &after_open[..close];
                if name.is_empty() {
                    return Err(invalid("placeholder name is empty"));
                }
                if name.contains('{') {
                    return Err(invalid("nested placeholder"));
                }
                if matches!(segments.last(), Some(Segment::Placeholder(_))) {
                    return Err(invalid("adjacent placeholders need a literal between them"));
                }
                let duplicate = segments
                    .iter()
                    .any(|s| matches!(s, Segment::Placeholder(p) if p == name));
                if duplicate {
                    return Err(invalid(&format!("placeholder {{{name}}} repeats")));
                }
                segments.push(Segment::Placeholder(name.to_string()));
                rest = &after_open[close + 1..];
            } else {
                let end = rest.find(['{', '}']).unwrap_or(rest.len());
                if rest[end..].starts_with('}') {
                    return Err(invalid("unmatched '}'"));
                }
                segments.push(Segment::Literal(rest[..end].to_string()));
                rest = &rest[end..];
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// True when the template has no placeholders and names one URI.
    pub fn is_concrete(&self) -> bool {
        self.placeholders().next().is_none()
    }

    /// Number of literal characters; the more, the more specific.
    pub fn specificity(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(lit) => lit.chars().count(),
                Segment::Placeholder(_) => 0,
            })
            .sum()
    }

    /// The template with placeholder names erased. Two templates with the
    /// same shape match exactly the same URIs.
    pub fn shape(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(lit) => lit.as_str(),
                Segment::Placeholder(_) => "{}",
            })
            .collect()
    }

    /// Match `uri`, returning the placeholder bindings on success.
    pub fn matches(&self, uri: &str) -> Option<Arguments> {
        let mut raw = Vec::new();
        if !match_segments(&self.segments, uri, &mut raw) {
            return None;
        }

        let mut bindings = Arguments::new();
        for (name, value) in raw {
            let decoded = urlencoding::decode(value).ok()?;
            bindings.insert(name.to_string(), decoded.into_owned().into());
        }
        Some(bindings)
    }
}

impl std::fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn valid_binding(value: &str) -> bool {
    !value.is_empty() && !value.contains('/')
}

/// Backtracking matcher. Placeholders never touch each other, so each one
/// is either terminal or followed by a literal.
fn match_segments<'a>(
    segments: &'a [Segment],
    uri: &'a str,
    out: &mut Vec<(&'a str, &'a str)>,
) -> bool {
    match segments.split_first() {
        None => uri.is_empty(),
        Some((Segment::Literal(lit), rest)) => match uri.strip_prefix(lit.as_str()) {
            Some(remaining) => match_segments(rest, remaining, out),
            None => false,
        },
        Some((Segment::Placeholder(name), rest)) => {
            let next_literal = match rest.first() {
                None => {
                    if valid_binding(uri) {
                        out.push((name.as_str(), uri));
                        return true;
                    }
                    return false;
                }
                Some(Segment::Literal(lit)) => lit,
                Some(Segment::Placeholder(_)) => return false,
            };

            for (idx, _) in uri.match_indices(next_literal.as_str()) {
                let value = &uri[..idx];
                if value.contains('/') {
                    break;
                }
                if value.is_empty() {
                    continue;
                }
                out.push((name.as_str(), value));
                if match_segments(rest, &uri[idx..], out) {
                    return true;
                }
                out.pop();
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound(template: &str, uri: &str) -> Option<Arguments> {
        UriTemplate::parse(template).unwrap().matches(uri)
    }

    #[test]
    fn binds_single_placeholder() {
        let b = bound("weather://{city}", "weather://Paris").unwrap();
        assert_eq!(b["city"], "Paris");
    }

    #[test]
    fn decodes_percent_escapes() {
        let b = bound("weather://{city}", "weather://New%20York").unwrap();
        assert_eq!(b["city"], "New York");
    }

    #[test]
    fn rejects_wrong_scheme_empty_and_nested_paths() {
        assert!(bound("weather://{city}", "forecast://Paris").is_none());
        assert!(bound("weather://{city}", "weather://").is_none());
        assert!(bound("weather://{city}", "weather://Paris/extra").is_none());
    }

    #[test]
    fn backtracks_over_repeated_literals() {
        let b = bound("file://{name}.{ext}", "file://archive.tar.gz").unwrap();
        assert_eq!(b["name"], "archive");
        assert_eq!(b["ext"], "tar.gz");

        let b = bound("x://{a}-{b}/end", "x://p-q-r/end").unwrap();
        assert_eq!(b["a"], "p");
        assert_eq!(b["b"], "q-r");
    }

    #[test]
    fn concrete_template_matches_only_itself() {
        let t = UriTemplate::parse("weather://cities").unwrap();
        assert!(t.is_concrete());
        assert!(t.matches("weather://cities").unwrap().is_empty());
        assert!(t.matches("weather://cities2").is_none());
    }

    #[test]
    fn shape_and_specificity() {
        let t = UriTemplate::parse("weather://{city}/daily/{day}").unwrap();
        assert_eq!(t.shape(), "weather://{}/daily/{}");
        assert_eq!(t.specificity(), "weather://".len() + "/daily/".len());
        assert_eq!(t.placeholders().collect::<Vec<_>>(), vec!["city", "day"]);
    }

    #[test]
    fn malformed_templates_are_rejected() {
        for raw in [
            "",
            "weather://{city",
            "weather://{}",
            "weather://city}",
            "weather://{a}{b}",
            "weather://{a}/{a}",
        ] {
            assert!(
                matches!(UriTemplate::parse(raw), Err(RegistryError::InvalidTemplate { .. })),
                "{raw} should be rejected"
            );
        }
    }
}
