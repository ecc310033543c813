//! HTML Sanitizer Seam
//!
//! Rich-text bodies arrive as raw HTML from the admin editor and must be
//! cleaned before storage. The sanitizer library itself is an external
//! collaborator; [`HtmlSanitizer`] is the seam the services depend on.
//!
//! [`RestrictedSanitizer`] is the conservative built-in implementation:
//! it removes script/style blocks, inline event handlers, and
//! `javascript:` URLs, and only keeps iframes whose `src` points at an
//! allow-listed video host. Deployments wanting a full allow-list parser
//! can substitute their own implementation behind the trait.

use regex::Regex;

/// Collaborator contract: clean untrusted rich-text HTML.
pub trait HtmlSanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> String;
}

/// Video hosts whose iframes survive sanitization.
const DEFAULT_IFRAME_HOSTS: &[&str] = &[
    "www.youtube.com",
    "youtube.com",
    "www.youtube-nocookie.com",
    "player.vimeo.com",
];

/// Regex-based sanitizer enforcing the fixed allow-list contract.
pub struct RestrictedSanitizer {
    allowed_iframe_hosts: Vec<String>,
    script_block: Regex,
    style_block: Regex,
    event_attr: Regex,
    js_url_attr: Regex,
    iframe_tag: Regex,
    iframe_src: Regex,
}

impl RestrictedSanitizer {
    pub fn new(allowed_iframe_hosts: Vec<String>) -> Self {
        Self {
            allowed_iframe_hosts,
            script_block: Regex::new(r"(?is)<script\b.*?</script\s*>").expect("valid regex"),
            style_block: Regex::new(r"(?is)<style\b.*?</style\s*>").expect("valid regex"),
            event_attr: Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#)
                .expect("valid regex"),
            js_url_attr: Regex::new(
                r#"(?i)\s+(href|src)\s*=\s*("javascript:[^"]*"|'javascript:[^']*'|javascript:[^\s>]+)"#,
            )
            .expect("valid regex"),
            iframe_tag: Regex::new(r"(?is)<iframe\b[^>]*>.*?</iframe\s*>|<iframe\b[^>]*/?>")
                .expect("valid regex"),
            iframe_src: Regex::new(r#"(?i)src\s*=\s*["']?https?://([^/"'\s>]+)"#)
                .expect("valid regex"),
        }
    }

    fn iframe_allowed(&self, iframe: &str) -> bool {
        match self.iframe_src.captures(iframe) {
            Some(caps) => {
                let host = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                self.allowed_iframe_hosts.iter().any(|h| h == host)
            }
            None => false,
        }
    }
}

impl Default for RestrictedSanitizer {
    fn default() -> Self {
        Self::new(
            DEFAULT_IFRAME_HOSTS
                .iter()
                .map(|h| h.to_string())
                .collect(),
        )
    }
}

impl HtmlSanitizer for RestrictedSanitizer {
    fn sanitize(&self, html: &str) -> String {
        let cleaned = self.script_block.replace_all(html, "");
        let cleaned = self.style_block.replace_all(&cleaned, "");

        // Drop iframes pointing anywhere but the video-host allow-list
        let cleaned = self
            .iframe_tag
            .replace_all(&cleaned, |caps: &regex::Captures| {
                let tag = caps.get(0).map(|m| m.as_str()).unwrap_or("");
                if self.iframe_allowed(tag) {
                    tag.to_string()
                } else {
                    String::new()
                }
            });

        let cleaned = self.event_attr.replace_all(&cleaned, "");
        let cleaned = self.js_url_attr.replace_all(&cleaned, "");

        cleaned.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitizer() -> RestrictedSanitizer {
        RestrictedSanitizer::default()
    }

    #[test]
    fn test_strips_script_blocks() {
        let out = sanitizer().sanitize("<p>hi</p><script>alert(1)</script><p>bye</p>");
        assert_eq!(out, "<p>hi</p><p>bye</p>");
    }

    #[test]
    fn test_strips_event_handlers() {
        let out = sanitizer().sanitize(r#"<img src="/a.png" onerror="alert(1)">"#);
        assert_eq!(out, r#"<img src="/a.png">"#);
    }

    #[test]
    fn test_strips_javascript_urls() {
        let out = sanitizer().sanitize(r#"<a href="javascript:alert(1)">x</a>"#);
        assert_eq!(out, "<a>x</a>");
    }

    #[test]
    fn test_allows_video_host_iframe() {
        let html = r#"<iframe src="https://www.youtube.com/embed/abc"></iframe>"#;
        assert_eq!(sanitizer().sanitize(html), html);
    }

    #[test]
    fn test_drops_other_iframes() {
        let out = sanitizer().sanitize(r#"<iframe src="https://evil.example/x"></iframe><p>k</p>"#);
        assert_eq!(out, "<p>k</p>");
    }

    #[test]
    fn test_keeps_regular_markup() {
        let html = r#"<table><tr><td><a href="/x">link</a></td></tr></table>"#;
        assert_eq!(sanitizer().sanitize(html), html);
    }
}
