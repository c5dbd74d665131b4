//! Path patterns for the allowlist and route authorization tables.
//!
//! Supported syntax (segment based, `/` separated):
//! - `literal`  : exact segment match
//! - `{name}`   : any single non-empty segment
//! - `*`        : any single non-empty segment
//! - `**`       : zero or more trailing segments (last segment only)
//!
//! Trailing slashes are significant: `/v1/posts/` does not match `/v1/posts`.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Single,
    Rest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: &'static str,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Patterns are compiled from static tables, so `**` anywhere but the end
    /// is treated as a single-segment wildcard rather than rejected.
    pub fn parse(raw: &'static str) -> Self {
        let parts: Vec<&str> = raw.trim_start_matches('/').split('/').collect();
        let last = parts.len().saturating_sub(1);

        let segments = parts
            .iter()
            .enumerate()
            .map(|(i, part)| match *part {
                "**" if i == last => Segment::Rest,
                "*" | "**" => Segment::Single,
                p if p.starts_with('{') && p.ends_with('}') && p.len() > 2 => Segment::Single,
                p => Segment::Literal(p.to_string()),
            })
            .collect();

        Self { raw, segments }
    }

    pub fn as_str(&self) -> &'static str {
        self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        if !path.starts_with('/') {
            return false;
        }
        let parts: Vec<&str> = match &path[1..] {
            "" => Vec::new(),
            rest => rest.split('/').collect(),
        };

        let mut idx = 0;
        for segment in &self.segments {
            match segment {
                Segment::Rest => {
                    // `/a/**` matches `/a` and anything below it, but not `/a/`
                    return parts[idx..].iter().all(|p| !p.is_empty());
                }
                Segment::Single => match parts.get(idx) {
                    Some(p) if !p.is_empty() => idx += 1,
                    _ => return false,
                },
                Segment::Literal(lit) => match parts.get(idx) {
                    Some(p) if p == lit => idx += 1,
                    _ => return false,
                },
            }
        }

        idx == parts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::PathPattern;

    #[test]
    fn literal_patterns_match_exactly() {
        let p = PathPattern::parse("/v1/auth/login");
        assert!(p.matches("/v1/auth/login"));
        assert!(!p.matches("/v1/auth/login/"));
        assert!(!p.matches("/v1/auth"));
        assert!(!p.matches("/v1/auth/login/extra"));
    }

    #[test]
    fn variables_bind_exactly_one_segment() {
        let p = PathPattern::parse("/v1/admin/users/{id}/reset-password");
        assert!(p.matches("/v1/admin/users/42/reset-password"));
        assert!(!p.matches("/v1/admin/users//reset-password"));
        assert!(!p.matches("/v1/admin/users/4/2/reset-password"));
    }

    #[test]
    fn single_star_is_one_segment() {
        let p = PathPattern::parse("/v2/*/v3/api-docs");
        assert!(p.matches("/v2/post/v3/api-docs"));
        assert!(!p.matches("/v2/v3/api-docs"));
    }

    #[test]
    fn trailing_double_star_matches_zero_or_more_segments() {
        let p = PathPattern::parse("/api/ping/**");
        assert!(p.matches("/api/ping"));
        assert!(p.matches("/api/ping/a"));
        assert!(p.matches("/api/ping/a/b/c"));
        assert!(!p.matches("/api/pingx"));
        assert!(!p.matches("/api"));
    }

    #[test]
    fn root_pattern() {
        let p = PathPattern::parse("/**");
        assert!(p.matches("/"));
        assert!(p.matches("/anything/at/all"));
    }
}
