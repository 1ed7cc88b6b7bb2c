//! Origin system whitelist.

use regex::Regex;

/// Compiled `Origin-System-Id` filter.
///
/// An invalid pattern does not fail startup. It leaves the whitelist in an
/// error state: nothing is admitted and the health report surfaces the error.
#[derive(Debug, Clone)]
pub struct Whitelist {
    pattern: Option<Regex>,
    error: Option<String>,
}

impl Whitelist {
    /// Compile a pattern, capturing the compile error instead of returning it.
    #[must_use]
    pub fn compile(pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(regex) => Self {
                pattern: Some(regex),
                error: None,
            },
            Err(e) => Self {
                pattern: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// A whitelist with no pattern configured. Admits nothing.
    #[must_use]
    pub fn none() -> Self {
        Self {
            pattern: None,
            error: Some("no whitelist pattern configured".to_string()),
        }
    }

    /// Whether a usable pattern is present.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.pattern.is_some()
    }

    /// Whether `origin_system_id` contains a match for the pattern.
    ///
    /// Unanchored: the pattern may match anywhere in the value.
    #[must_use]
    pub fn matches(&self, origin_system_id: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|p| p.is_match(origin_system_id))
    }

    /// Compile error message, if the whitelist is in an error state.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Source text of the configured pattern.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }
}
