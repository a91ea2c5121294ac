use url::Url;

/// Normalise a link so that two spellings of the same article compare equal.
///
/// The canonical form keeps scheme, host (lower-cased), non-default port and
/// path. Query strings and fragments are dropped, so `/wiki/X#History` and
/// `/wiki/X` share one key. Anything that is not an absolute http(s) URL
/// yields `None`.
pub fn canonicalize(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;

    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.host_str()?;

    url.set_fragment(None);
    url.set_query(None);

    Some(url.to_string())
}

/// Root of the host a crawl started on; relative article links resolve
/// against this.
pub fn origin_of(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    url.host_str()?;
    url.join("/").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_is_dropped() {
        assert_eq!(
            canonicalize("https://en.wikipedia.org/wiki/Rust#History"),
            canonicalize("https://en.wikipedia.org/wiki/Rust")
        );
        assert_eq!(
            canonicalize("https://en.wikipedia.org/wiki/Rust#History").unwrap(),
            "https://en.wikipedia.org/wiki/Rust"
        );
    }

    #[test]
    fn test_query_is_dropped() {
        assert_eq!(
            canonicalize("https://en.wikipedia.org/wiki/Rust?oldid=42").unwrap(),
            "https://en.wikipedia.org/wiki/Rust"
        );
    }

    #[test]
    fn test_host_is_lowercased() {
        assert_eq!(
            canonicalize("https://EN.Wikipedia.ORG/wiki/Rust").unwrap(),
            "https://en.wikipedia.org/wiki/Rust"
        );
    }

    #[test]
    fn test_default_port_is_dropped() {
        assert_eq!(
            canonicalize("https://en.wikipedia.org:443/wiki/Rust").unwrap(),
            "https://en.wikipedia.org/wiki/Rust"
        );
    }

    #[test]
    fn test_path_case_is_preserved() {
        assert_ne!(
            canonicalize("https://en.wikipedia.org/wiki/rust"),
            canonicalize("https://en.wikipedia.org/wiki/Rust")
        );
    }

    #[test]
    fn test_rejects_relative_and_foreign_schemes() {
        assert_eq!(canonicalize("/wiki/Rust"), None);
        assert_eq!(canonicalize("mailto:someone@example.com"), None);
        assert_eq!(canonicalize("ftp://example.com/file"), None);
        assert_eq!(canonicalize(""), None);
    }

    #[test]
    fn test_origin_of() {
        let origin = origin_of("https://en.wikipedia.org/wiki/Python_(programming_language)").unwrap();
        assert_eq!(origin.as_str(), "https://en.wikipedia.org/");

        let origin = origin_of("http://127.0.0.1:8080/wiki/A?x=1#y").unwrap();
        assert_eq!(origin.as_str(), "http://127.0.0.1:8080/");

        assert!(origin_of("not a url").is_none());
    }
}
