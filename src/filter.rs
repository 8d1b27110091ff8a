//! Suffix filtering for file selection.
//!
//! Suffixes are literal: no globbing and no regular expressions. A file name
//! matching any exclusion suffix is rejected before inclusion is considered.

/// Outcome of testing a file name against a [`SuffixFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<'a> {
    /// Rejected by the given exclusion suffix.
    Excluded(&'a str),
    /// Accepted by the given inclusion suffix.
    Included(&'a str),
    /// No inclusion suffix matched.
    Unmatched,
}

impl Verdict<'_> {
    /// Returns true if the file should be selected.
    #[must_use]
    pub const fn is_included(&self) -> bool {
        matches!(self, Self::Included(_))
    }
}

/// Include/exclude suffix sets applied to file names.
#[derive(Debug, Clone, Default)]
pub struct SuffixFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl SuffixFilter {
    /// Creates a filter from inclusion and exclusion suffixes.
    pub fn new<I, E, S, T>(include: I, exclude: E) -> Self
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            include: include.into_iter().map(Into::into).collect(),
            exclude: exclude.into_iter().map(Into::into).collect(),
        }
    }

    /// Inclusion suffixes in the order they were given.
    #[must_use]
    pub fn include_suffixes(&self) -> &[String] {
        &self.include
    }

    /// Exclusion suffixes in the order they were given.
    #[must_use]
    pub fn exclude_suffixes(&self) -> &[String] {
        &self.exclude
    }

    /// Tests a file name. Exclusion takes precedence over inclusion.
    #[must_use]
    pub fn verdict(&self, file_name: &str) -> Verdict<'_> {
        if let Some(suffix) = self.exclude.iter().find(|s| file_name.ends_with(s.as_str())) {
            return Verdict::Excluded(suffix.as_str());
        }

        self.include
            .iter()
            .find(|s| file_name.ends_with(s.as_str()))
            .map_or(Verdict::Unmatched, |s| Verdict::Included(s.as_str()))
    }

    /// Returns true if the file name passes the filter.
    #[must_use]
    pub fn should_process(&self, file_name: &str) -> bool {
        self.verdict(file_name).is_included()
    }
}
