/// Helpers for turning feed payloads into post-ready text

/// HTML helpers for entry summaries
pub mod html {
    use scraper::Html;

    /// Text content of an HTML fragment, entities decoded, tags dropped.
    /// Line breaks between text nodes are kept as they appear in the markup.
    pub fn to_text(html: &str) -> String {
        Html::parse_fragment(html).root_element().text().collect()
    }

    /// Everything before the first newline.
    pub fn first_line(text: &str) -> &str {
        let line = text.split('\n').next().unwrap_or_default();
        line.strip_suffix('\r').unwrap_or(line)
    }

    /// Plain-text summary: markup stripped, first line only.
    pub fn summarize(html: &str) -> String {
        first_line(&to_text(html)).to_string()
    }
}

/// URL helpers
pub mod url {
    use url::Url;

    /// Validate feed/instance URL format
    pub fn is_http_url(url_str: &str) -> bool {
        if let Ok(url) = Url::parse(url_str) {
            (url.scheme() == "http" || url.scheme() == "https") && url.host().is_some()
        } else {
            false
        }
    }
}
