use std::fmt::{Debug, Formatter};

use globset::{GlobBuilder, GlobMatcher};

/// A compiled shell glob pattern.
///
/// `*` and `?` never match `/`, `**` matches across directories. Matching is case-sensitive.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    /// `None` for inert patterns.
    matcher: Option<GlobMatcher>,
}

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, globset::Error> {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .backslash_escape(true)
            .build()?
            .compile_matcher();
        Ok(Self {
            source: pattern.to_string(),
            matcher: Some(matcher),
        })
    }

    /// A pattern that is kept only for its text and never matches anything.
    pub fn inert(pattern: &str) -> Self {
        Self {
            source: pattern.to_string(),
            matcher: None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.matcher
            .as_ref()
            .is_some_and(|matcher| matcher.is_match(candidate))
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl Debug for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.source, f)
    }
}

/// Checks a single candidate against a pattern that has not been compiled yet.
pub fn matches(pattern: &str, candidate: &str) -> Result<bool, globset::Error> {
    Ok(Pattern::new(pattern)?.is_match(candidate))
}

/// Returns `true` if any of the `patterns` matches any of the `candidates`.
pub fn any_match<S: AsRef<str>>(candidates: &[S], patterns: &[Pattern]) -> bool {
    for pattern in patterns {
        if let Some(candidate) = candidates
            .iter()
            .map(|c| c.as_ref())
            .find(|candidate| pattern.is_match(candidate))
        {
            tracing::trace!("Pattern {:?} matched {candidate:?}", pattern.as_str());
            return true;
        }
    }
    false
}
