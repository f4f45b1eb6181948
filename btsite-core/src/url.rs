//! Relative link resolution.

use ::url::Url;

use crate::errors::SiteError;

/// Resolves `reference` against `base` following RFC 3986 reference resolution.
///
/// Absolute references are returned unchanged (modulo normalisation);
/// protocol-relative and path-relative references inherit the base's scheme,
/// host and path.
///
/// # Errors
/// - `SiteError::UrlParse` - `base` is not an absolute URL, or `reference`
///   cannot be resolved against it
pub fn join_url(base: &str, reference: &str) -> Result<String, SiteError> {
    let base_url = Url::parse(base).map_err(|e| SiteError::UrlParse {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    let resolved = base_url.join(reference).map_err(|e| SiteError::UrlParse {
        url: reference.to_string(),
        reason: e.to_string(),
    })?;
    Ok(resolved.into())
}

/// Whether `url` parses on its own, without a base.
pub(crate) fn is_absolute(url: &str) -> bool {
    Url::parse(url).is_ok()
}

/// Resolves a detail-page link unless it is already absolute.
pub(crate) fn resolve_page_link(base: &str, link: &str) -> Result<String, SiteError> {
    if link.starts_with("http") {
        Ok(link.to_string())
    } else {
        join_url(base, link)
    }
}

/// Resolves a download link unless it is already absolute or a magnet URI.
pub(crate) fn resolve_download_link(base: &str, link: &str) -> Result<String, SiteError> {
    if link.starts_with("http") || link.starts_with("magnet") {
        Ok(link.to_string())
    } else {
        join_url(base, link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path_relative() {
        assert_eq!(
            join_url("https://x.example/a/b/", "c.php?id=1").unwrap(),
            "https://x.example/a/b/c.php?id=1"
        );
        assert_eq!(
            join_url("https://x.example/a/b", "c.php?id=1").unwrap(),
            "https://x.example/a/c.php?id=1"
        );
    }

    #[test]
    fn test_join_absolute_reference_passes_through() {
        assert_eq!(
            join_url("https://x.example/a/b/", "https://other.example/z").unwrap(),
            "https://other.example/z"
        );
    }

    #[test]
    fn test_join_protocol_and_root_relative() {
        assert_eq!(
            join_url("https://x.example/a/b/", "//cdn.example/t.torrent").unwrap(),
            "https://cdn.example/t.torrent"
        );
        assert_eq!(
            join_url("https://x.example/a/b/", "/messages.php?id=9").unwrap(),
            "https://x.example/messages.php?id=9"
        );
    }

    #[test]
    fn test_join_rejects_invalid_base() {
        let result = join_url("not a url", "c.php");
        assert!(matches!(
            result,
            Err(SiteError::UrlParse { url, .. }) if url == "not a url"
        ));
    }

    #[test]
    fn test_is_absolute() {
        assert!(is_absolute("https://site.example/messages.php?page=1"));
        assert!(!is_absolute("messages.php?page=1"));
        assert!(!is_absolute("/messages.php"));
        assert!(!is_absolute(""));
    }

    #[test]
    fn test_download_links_keep_magnets() {
        let magnet = "magnet:?xt=urn:btih:abcdef";
        assert_eq!(
            resolve_download_link("https://x.example/", magnet).unwrap(),
            magnet
        );
        assert_eq!(
            resolve_download_link("https://x.example/torrents.php", "download.php?id=3").unwrap(),
            "https://x.example/download.php?id=3"
        );
        assert_eq!(
            resolve_page_link("https://x.example/", "http://y.example/details.php").unwrap(),
            "http://y.example/details.php"
        );
    }
}
