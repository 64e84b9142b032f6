//! Domain name extraction from visited URLs

/// Extract the registrable host of a URL as stored in `domains.domain_name`
///
/// Requires a `scheme://` prefix. Userinfo, port, path, query and fragment are
/// dropped, the host is lower-cased and a leading `www.` removed. Returns
/// `None` when no host remains (e.g. `file:///tmp/x`, `about:blank`).
pub fn extract_domain(url: &str) -> Option<String> {
    let (_, rest) = url.trim().split_once("://")?;
    host_of(rest)
}

/// Normalize user-typed whitelist input
///
/// Accepts either a full URL or a bare host such as `docs.rs/tokio`.
pub fn normalize_domain_input(input: &str) -> Option<String> {
    let input = input.trim();
    if input.contains("://") {
        return extract_domain(input);
    }
    host_of(input)
}

fn host_of(rest: &str) -> Option<String> {
    let authority = rest
        .split(|c| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or("");

    // userinfo@host
    let host_port = authority.rsplit('@').next().unwrap_or("");

    let host = if let Some(stripped) = host_port.strip_prefix('[') {
        // IPv6 literal keeps its brackets off
        stripped.split(']').next().unwrap_or("")
    } else {
        host_port.split(':').next().unwrap_or("")
    };

    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let host = host.strip_prefix("www.").map(str::to_string).unwrap_or(host);

    if host.is_empty() || host.chars().any(char::is_whitespace) {
        None
    } else {
        Some(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_https() {
        assert_eq!(
            extract_domain("https://github.com/tokio-rs/axum").as_deref(),
            Some("github.com")
        );
    }

    #[test]
    fn test_extract_strips_www_port_and_userinfo() {
        assert_eq!(
            extract_domain("http://user:pw@WWW.Example.COM:8080/a?b=c#d").as_deref(),
            Some("example.com")
        );
    }

    #[test]
    fn test_extract_keeps_subdomains() {
        assert_eq!(
            extract_domain("https://docs.google.com/document/d/1").as_deref(),
            Some("docs.google.com")
        );
    }

    #[test]
    fn test_extract_query_without_path() {
        assert_eq!(
            extract_domain("https://bing.com?q=rust").as_deref(),
            Some("bing.com")
        );
    }

    #[test]
    fn test_extract_ipv6_literal() {
        assert_eq!(extract_domain("http://[::1]:3000/").as_deref(), Some("::1"));
    }

    #[test]
    fn test_extract_rejects_missing_host() {
        assert_eq!(extract_domain("file:///etc/hosts"), None);
        assert_eq!(extract_domain("about:blank"), None);
        assert_eq!(extract_domain(""), None);
        assert_eq!(extract_domain("not a url"), None);
    }

    #[test]
    fn test_normalize_accepts_bare_host() {
        assert_eq!(
            normalize_domain_input("  www.Docs.rs/tokio ").as_deref(),
            Some("docs.rs")
        );
        assert_eq!(
            normalize_domain_input("https://news.ycombinator.com/").as_deref(),
            Some("news.ycombinator.com")
        );
        assert_eq!(normalize_domain_input("   "), None);
    }
}
