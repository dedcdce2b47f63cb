//! Meta attribute lookup in rendered HTML

use scraper::{Html, Selector};

use super::DocumentAttributes;

/// An HTML page, queried the way a browser would answer
/// `document.querySelector("meta[name=...]").getAttribute("content")`.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    html: String,
}

impl HtmlDocument {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

impl DocumentAttributes for HtmlDocument {
    fn meta_content(&self, name: &str) -> Option<String> {
        let selector = Selector::parse(&format!("meta[name=\"{}\"]", name)).ok()?;
        let document = Html::parse_document(&self.html);

        // First matching tag wins, even without a content attribute.
        document
            .select(&selector)
            .next()?
            .value()
            .attr("content")
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_lookup() {
        let doc = HtmlDocument::new(
            r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <meta name="csrf-token" content="abc">
    <meta content='https://example.ingest/42' name='sentry-dsn' />
  </head>
</html>"#,
        );

        assert_eq!(
            doc.meta_content("sentry-dsn").as_deref(),
            Some("https://example.ingest/42")
        );
        assert_eq!(doc.meta_content("csrf-token").as_deref(), Some("abc"));
        assert_eq!(doc.meta_content("missing"), None);
    }

    #[test]
    fn test_unquoted_and_escaped_values() {
        let doc = HtmlDocument::new(
            r#"<META NAME=sentry-dsn CONTENT="https://k@o1.ingest/7?a=1&amp;b=2">"#,
        );

        assert_eq!(
            doc.meta_content("sentry-dsn").as_deref(),
            Some("https://k@o1.ingest/7?a=1&b=2")
        );
    }

    #[test]
    fn test_tag_without_content() {
        let doc = HtmlDocument::new(r#"<meta name="sentry-dsn"><meta name="sentry-dsn" content="x">"#);

        assert_eq!(doc.meta_content("sentry-dsn"), None);
    }

    #[test]
    fn test_commented_out_tag_is_ignored() {
        let doc = HtmlDocument::new(
            r#"<!-- <meta name="sentry-dsn" content="https://stale/1"> --><meta name="sentry-dsn" content="https://live/2">"#,
        );

        assert_eq!(doc.meta_content("sentry-dsn").as_deref(), Some("https://live/2"));
    }

    #[test]
    fn test_angle_bracket_inside_value() {
        let doc = HtmlDocument::new(r#"<meta name="sentry-dsn" content="https://k@o/1?a=>b">"#);

        assert_eq!(doc.meta_content("sentry-dsn").as_deref(), Some("https://k@o/1?a=>b"));
    }

    #[test]
    fn test_numeric_entities_are_decoded() {
        let doc = HtmlDocument::new(
            r#"<meta name="sentry-dsn" content="https:&#x2F;&#x2F;o.ingest&#47;42">"#,
        );

        assert_eq!(doc.meta_content("sentry-dsn").as_deref(), Some("https://o.ingest/42"));
    }
}
