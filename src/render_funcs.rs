//! HTML rendering of the news container contents

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::text_funcs::RenderedItem;

pub const UNAVAILABLE_MESSAGE: &str =
    "Es konnten keine Nachrichten geladen werden. Bitte versuchen Sie es später erneut.";
pub const LOAD_FAILED_MESSAGE: &str =
    "Fehler beim Laden der Nachrichten. Bitte versuchen Sie es später erneut.";

/// Final state of the container after one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsView {
    /// Feed loaded; may be empty
    Items(Vec<RenderedItem>),
    /// Upstream answered without `status: "ok"`
    Unavailable,
    /// Transport or decoding failure
    LoadFailed,
}

impl NewsView {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            NewsView::Items(_) => None,
            NewsView::Unavailable => Some(UNAVAILABLE_MESSAGE),
            NewsView::LoadFailed => Some(LOAD_FAILED_MESSAGE),
        }
    }
}

/// Render the inner HTML of the container for `view`.
pub fn render_view(view: &NewsView) -> String {
    match view {
        NewsView::Items(items) => items.iter().map(render_item).collect(),
        NewsView::Unavailable | NewsView::LoadFailed => {
            format!("<p>{}</p>\n", view.message().unwrap_or_default())
        }
    }
}

/// One `news-item` block. Text is escaped; links are limited to http(s).
pub fn render_item(item: &RenderedItem) -> String {
    format!(
        concat!(
            "<div class=\"news-item\">\n",
            "  <a href=\"{href}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"news-title\">{title}</a>\n",
            "  <p class=\"news-date\">{date}</p>\n",
            "  <p class=\"news-desc\">{preview}</p>\n",
            "</div>\n",
        ),
        href = encode_double_quoted_attribute(safe_href(&item.link)),
        title = encode_text(&item.title),
        date = encode_text(&item.formatted_date),
        preview = encode_text(&item.preview_text),
    )
}

/// `link` if it is an absolute http(s) URL, `#` otherwise.
pub fn safe_href(link: &str) -> &str {
    let link = link.trim();
    let scheme_ok = ["http://", "https://"].iter().any(|scheme| {
        link.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });
    if scheme_ok { link } else { "#" }
}
