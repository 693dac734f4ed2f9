//! Wildcard pattern matching for request names.
//!
//! A wildcard pattern matches a whole request name: `*` stands for any run
//! of characters (including none), `?` for exactly one character, and every
//! other character matches itself. A precompiled [`Regex`] is used as given,
//! without anchoring.

use cmnds_core::CmndsError;
use regex::Regex;
use std::fmt;

/// A compiled request-name pattern.
#[derive(Clone)]
pub enum Pattern {
    /// Built from a wildcard string.
    Wildcard {
        /// The wildcard text the pattern was built from.
        source: String,
        /// The anchored translation of `source`.
        regex: Regex,
    },
    /// A caller-supplied regex.
    Compiled(Regex),
}

impl Pattern {
    /// Compiles a wildcard pattern.
    ///
    /// # Errors
    ///
    /// [`CmndsError::PatternInvalid`] if `source` is empty or its translation
    /// does not compile.
    pub fn wildcard(source: &str) -> Result<Self, CmndsError> {
        if source.is_empty() {
            return Err(CmndsError::PatternInvalid("pattern is required".into()));
        }
        let regex = Regex::new(&wildcard_to_regex(source))
            .map_err(|err| CmndsError::PatternInvalid(err.to_string()))?;
        Ok(Pattern::Wildcard {
            source: source.to_owned(),
            regex,
        })
    }

    /// Uses a precompiled regex as is.
    pub fn compiled(regex: Regex) -> Self {
        Pattern::Compiled(regex)
    }

    /// The text the pattern was created from.
    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Wildcard { source, .. } => source,
            Pattern::Compiled(regex) => regex.as_str(),
        }
    }

    /// Returns `true` if `name` matches.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Pattern::Wildcard { regex, .. } | Pattern::Compiled(regex) => regex.is_match(name),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Wildcard { source, .. } => f.debug_tuple("Wildcard").field(source).finish(),
            Pattern::Compiled(regex) => f.debug_tuple("Compiled").field(&regex.as_str()).finish(),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `true` if `name` matches `pattern`.
pub fn matches(pattern: &Pattern, name: &str) -> bool {
    pattern.matches(name)
}

/// Translates a wildcard pattern into an anchored regex source.
pub fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("(?s)^");
    let mut buf = [0u8; 4];
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c => out.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    out.push('$');
    out
}

/// Conversion into a [`Pattern`], used by [`Channel::on`](crate::Channel::on).
pub trait IntoPattern {
    /// Performs the conversion.
    fn into_pattern(self) -> Result<Pattern, CmndsError>;
}

impl IntoPattern for Pattern {
    fn into_pattern(self) -> Result<Pattern, CmndsError> {
        Ok(self)
    }
}

impl IntoPattern for Regex {
    fn into_pattern(self) -> Result<Pattern, CmndsError> {
        Ok(Pattern::Compiled(self))
    }
}

impl IntoPattern for &str {
    fn into_pattern(self) -> Result<Pattern, CmndsError> {
        Pattern::wildcard(self)
    }
}

impl IntoPattern for String {
    fn into_pattern(self) -> Result<Pattern, CmndsError> {
        Pattern::wildcard(&self)
    }
}

impl IntoPattern for &String {
    fn into_pattern(self) -> Result<Pattern, CmndsError> {
        Pattern::wildcard(self)
    }
}

impl<T: IntoPattern> IntoPattern for Option<T> {
    fn into_pattern(self) -> Result<Pattern, CmndsError> {
        self.ok_or_else(|| CmndsError::PatternInvalid("pattern is required".into()))?
            .into_pattern()
    }
}
