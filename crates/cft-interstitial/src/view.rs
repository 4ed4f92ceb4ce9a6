//! What the warning page shows.

use cft_types::config::DisplayMode;

use crate::intent::NavigationIntent;

/// Rendered description of the blocked destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningView {
    /// Decoded hostname, the primary warning text.
    pub host: String,
    /// Decoded path, query and fragment. Present only in full mode.
    pub detail: Option<String>,
    pub mode: DisplayMode,
}

impl WarningView {
    pub fn new(intent: &NavigationIntent, mode: DisplayMode) -> Self {
        let detail = match mode {
            DisplayMode::HostOnly => None,
            DisplayMode::Full => Some(intent.display_detail()),
        };
        Self {
            host: intent.display_host(),
            detail,
            mode,
        }
    }

    /// The target line: host, plus the de-emphasized detail in full mode.
    pub fn to_html(&self) -> String {
        let mut html = format!(
            "<p class=\"target\"><span class=\"host\">{}</span>",
            escape_html(&self.host)
        );
        if let Some(detail) = &self.detail {
            html.push_str(&format!(
                "<small class=\"detail\">{}</small>",
                escape_html(detail)
            ));
        }
        html.push_str("</p>");
        html
    }

    /// A complete warning document with its two actions: go back and
    /// open the isolated view.
    pub fn page_html(&self) -> String {
        format!(
            "<!DOCTYPE html><html><head><meta charset=\"UTF-8\">\
             <title>Content Farm Terminator</title></head><body>\
             <h1>This page is blocked</h1>{}\
             <button id=\"back\">Go back</button>\
             <button id=\"view\">View in isolated mode</button>\
             </body></html>",
            self.to_html()
        )
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(raw: &str) -> NavigationIntent {
        NavigationIntent::parse(raw).unwrap()
    }

    #[test]
    fn host_only_hides_path() {
        let view = WarningView::new(&intent("https://例え.テスト/page?x=1#f"), DisplayMode::HostOnly);
        assert_eq!(view.host, "例え.テスト");
        assert_eq!(view.detail, None);
        assert_eq!(
            view.to_html(),
            "<p class=\"target\"><span class=\"host\">例え.テスト</span></p>"
        );
    }

    #[test]
    fn full_mode_adds_secondary_detail() {
        let view = WarningView::new(&intent("https://例え.テスト/page?x=1#f"), DisplayMode::Full);
        assert_eq!(view.detail.as_deref(), Some("/page?x=1#f"));
        assert!(view.to_html().contains("<small class=\"detail\">/page?x=1#f</small>"));
    }

    #[test]
    fn detail_is_escaped() {
        let view = WarningView::new(
            &intent("https://a.test/%3Cscript%3E?q=%22x%22&y=1"),
            DisplayMode::Full,
        );
        let html = view.to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("/&lt;script&gt;?q=&quot;x&quot;&amp;y=1"));
    }

    #[test]
    fn page_contains_actions() {
        let html = WarningView::new(&intent("https://farm.test/"), DisplayMode::HostOnly).page_html();
        assert!(html.contains("id=\"back\""));
        assert!(html.contains("id=\"view\""));
        assert_eq!(html.matches("<button").count(), 2);
        assert!(html.contains("farm.test"));
    }
}
