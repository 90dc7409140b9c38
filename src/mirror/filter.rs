//! Inclusion rules applied to discovered references and implied directories.

/// Why a reference was accepted or skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// The reference should be mirrored.
    Accept,
    /// The reference ends with a rejected suffix.
    RejectedSuffix(String),
    /// The reference starts with `.` followed by an excluded prefix.
    ExcludedPath(String),
}

impl FilterDecision {
    /// True for [`FilterDecision::Accept`].
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Reject-suffix and exclude-prefix rules for one mirror job.
///
/// Both checks are plain string tests. Empty entries never match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorFilter {
    reject_suffixes: Vec<String>,
    exclude_prefixes: Vec<String>,
}

impl MirrorFilter {
    /// Builds a filter, dropping empty entries.
    #[must_use]
    pub fn new<S, P>(reject_suffixes: S, exclude_prefixes: P) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let keep = |values: Vec<String>| -> Vec<String> {
            values.into_iter().filter(|v| !v.is_empty()).collect()
        };
        Self {
            reject_suffixes: keep(reject_suffixes.into_iter().map(Into::into).collect()),
            exclude_prefixes: keep(exclude_prefixes.into_iter().map(Into::into).collect()),
        }
    }

    /// Classifies `reference`. Suffix rules are checked before prefix rules.
    #[must_use]
    pub fn check(&self, reference: &str) -> FilterDecision {
        if let Some(suffix) = self
            .reject_suffixes
            .iter()
            .find(|suffix| reference.ends_with(suffix.as_str()))
        {
            return FilterDecision::RejectedSuffix(suffix.clone());
        }

        if let Some(prefix) = self.exclude_prefixes.iter().find(|prefix| {
            reference
                .strip_prefix('.')
                .is_some_and(|rest| rest.starts_with(prefix.as_str()))
        }) {
            return FilterDecision::ExcludedPath(prefix.clone());
        }

        FilterDecision::Accept
    }

    /// Shorthand for `self.check(reference).is_accepted()`.
    #[must_use]
    pub fn should_download(&self, reference: &str) -> bool {
        self.check(reference).is_accepted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(reject: &[&str], exclude: &[&str]) -> MirrorFilter {
        MirrorFilter::new(reject.iter().copied(), exclude.iter().copied())
    }

    #[test]
    fn test_filter_scenario() {
        let f = filter(&[".css"], &["assets"]);
        assert_eq!(f.check("c.css"), FilterDecision::RejectedSuffix(".css".into()));
        assert_eq!(
            f.check(".assets/x.png"),
            FilterDecision::ExcludedPath("assets".into())
        );
        assert_eq!(f.check("img/x.png"), FilterDecision::Accept);
    }

    #[test]
    fn test_exclude_needs_leading_dot() {
        let f = filter(&[], &["assets"]);
        assert!(f.should_download("assets/x.png"));
        assert!(f.should_download("/assets/x.png"));
        // "./assets" is "." + "/assets", which does not start with "assets".
        assert!(f.should_download("./assets/x.png"));
    }

    #[test]
    fn test_exclude_with_slash_prefix_matches_dot_slash_references() {
        let f = filter(&[], &["/img"]);
        assert!(!f.should_download("./img/logo.png"));
        assert!(f.should_download("/img/logo.png"));
    }

    #[test]
    fn test_empty_entries_are_ignored() {
        let f = filter(&["", ""], &[""]);
        assert_eq!(f, MirrorFilter::default());
        assert!(f.should_download("anything.css"));
        assert!(f.should_download(".hidden"));
    }

    #[test]
    fn test_suffix_checked_before_prefix() {
        let f = filter(&[".gif"], &["img"]);
        assert_eq!(
            f.check(".img/a.gif"),
            FilterDecision::RejectedSuffix(".gif".into())
        );
    }

    #[test]
    fn test_suffix_without_dot_matches_plain_ending() {
        let f = filter(&["gif"], &[]);
        assert!(!f.should_download("/images/anim.gif"));
        assert!(f.should_download("/images/anim.gifx"));
    }
}
