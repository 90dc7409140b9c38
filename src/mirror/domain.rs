//! Site directory naming.

use std::sync::LazyLock;

use regex::Regex;

use super::error::MirrorError;

/// Optional `www.`, then the first host-like token. Applied after the scheme is removed.
#[allow(clippy::expect_used)]
static HOST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:www\.)?([a-zA-Z0-9.-]+)").expect("host regex is valid") // Static pattern, safe to panic
});

/// Names the directory a mirror of `url` is saved under.
///
/// The scheme and a leading `www.` are dropped and the host is cut at the
/// first character outside `[a-zA-Z0-9.-]` (port, path, credentials).
///
/// # Errors
///
/// Returns [`MirrorError::Domain`] when no host-like token follows the scheme.
///
/// # Examples
///
/// ```
/// use wget_core::mirror::site_directory_name;
///
/// assert_eq!(site_directory_name("https://www.example.com/page").unwrap(), "example.com");
/// assert_eq!(site_directory_name("http://sub.example.org").unwrap(), "sub.example.org");
/// ```
pub fn site_directory_name(url: &str) -> Result<String, MirrorError> {
    let trimmed = url.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);

    HOST_PATTERN
        .captures(without_scheme)
        .and_then(|captures| captures.get(1))
        .map(|host| host.as_str().trim_matches('.'))
        .filter(|host| !host.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| MirrorError::Domain {
            url: url.to_string(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_site_directory_name_strips_scheme_and_www() {
        assert_eq!(
            site_directory_name("https://www.example.com/page").unwrap(),
            "example.com"
        );
    }

    #[test]
    fn test_site_directory_name_keeps_subdomain() {
        assert_eq!(
            site_directory_name("http://sub.example.org").unwrap(),
            "sub.example.org"
        );
    }

    #[test]
    fn test_site_directory_name_stops_at_port() {
        assert_eq!(
            site_directory_name("http://127.0.0.1:8080/index.html").unwrap(),
            "127.0.0.1"
        );
    }

    #[test]
    fn test_site_directory_name_without_scheme() {
        assert_eq!(site_directory_name("www.rust-lang.org/learn").unwrap(), "rust-lang.org");
    }

    #[test]
    fn test_site_directory_name_rejects_hostless_input() {
        assert!(matches!(
            site_directory_name("https://"),
            Err(MirrorError::Domain { .. })
        ));
        assert!(matches!(
            site_directory_name("https:///path"),
            Err(MirrorError::Domain { .. })
        ));
        assert!(matches!(site_directory_name(""), Err(MirrorError::Domain { .. })));
    }
}
