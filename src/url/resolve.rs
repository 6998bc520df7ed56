//! Link resolution and classification

use url::Url;

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url)
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Returns true if the URL path ends in one of the given extensions
///
/// Extensions are given without the leading dot and compared case-insensitively.
/// Query strings and fragments are ignored.
pub fn has_allowed_extension(url: &Url, extensions: &[String]) -> bool {
    let path = url.path().to_ascii_lowercase();
    extensions.iter().any(|ext| {
        let suffix = format!(".{}", ext.to_ascii_lowercase());
        path.ends_with(&suffix)
    })
}

/// Returns true if a listing link points at an index page rather than an item
pub fn is_excluded_link(link: &str, marker: &str) -> bool {
    !marker.is_empty() && link.contains(marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/library/papers.html").unwrap()
    }

    fn exts() -> Vec<String> {
        ["pdf", "xlsx", "xls", "csv", "docx", "zip"]
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn test_resolve_relative_link() {
        let url = resolve_link("/files/wp-01.pdf", &base_url()).unwrap();
        assert_eq!(url.as_str(), "https://example.com/files/wp-01.pdf");
    }

    #[test]
    fn test_resolve_relative_path_link() {
        let url = resolve_link("papers/2024.html", &base_url()).unwrap();
        assert_eq!(url.as_str(), "https://example.com/library/papers/2024.html");
    }

    #[test]
    fn test_skip_special_schemes() {
        assert!(resolve_link("javascript:void(0)", &base_url()).is_none());
        assert!(resolve_link("mailto:test@example.com", &base_url()).is_none());
        assert!(resolve_link("tel:+1234567890", &base_url()).is_none());
        assert!(resolve_link("data:text/html,<h1>x</h1>", &base_url()).is_none());
        assert!(resolve_link("#section", &base_url()).is_none());
        assert!(resolve_link("   ", &base_url()).is_none());
    }

    #[test]
    fn test_allowed_extension_case_insensitive() {
        let url = Url::parse("https://example.com/files/Report.PDF").unwrap();
        assert!(has_allowed_extension(&url, &exts()));
    }

    #[test]
    fn test_allowed_extension_ignores_query() {
        let url = Url::parse("https://example.com/data.xlsx?version=2").unwrap();
        assert!(has_allowed_extension(&url, &exts()));
    }

    #[test]
    fn test_disallowed_extension() {
        let html = Url::parse("https://example.com/papers/wp-01.html").unwrap();
        let pdf_dir = Url::parse("https://example.com/pdf/").unwrap();
        assert!(!has_allowed_extension(&html, &exts()));
        assert!(!has_allowed_extension(&pdf_dir, &exts()));
    }

    #[test]
    fn test_xls_does_not_match_xlsx_only_list() {
        let url = Url::parse("https://example.com/data.xls").unwrap();
        assert!(!has_allowed_extension(&url, &["xlsx".to_string()]));
    }

    #[test]
    fn test_excluded_link() {
        assert!(is_excluded_link(
            "https://example.com/library/working-papers/series.html",
            "series.html"
        ));
        assert!(!is_excluded_link(
            "https://example.com/library/working-papers/2024/wp-01.html",
            "series.html"
        ));
        assert!(!is_excluded_link("https://example.com/anything", ""));
    }
}
