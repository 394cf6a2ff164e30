//! Turning feed items into display-ready text
//!
//! Everything here is pure: no network, no output.

use chrono::{DateTime, Locale, NaiveDate, NaiveDateTime, Utc};

use crate::config::Limits;
use crate::feed_funcs::FeedItem;

/// Appended to a preview that was cut short
pub const ELLIPSIS: &str = " …";

/// Display-ready form of a `FeedItem`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedItem {
    pub title: String,
    pub link: String,
    pub formatted_date: String,
    pub preview_text: String,
}

/// Take the first `limits.max_items` entries in feed order and render them.
pub fn transform_items(items: &[FeedItem], limits: Limits) -> Vec<RenderedItem> {
    items
        .iter()
        .take(limits.max_items)
        .map(|item| transform_item(item, limits.preview_words))
        .collect()
}

pub fn transform_item(item: &FeedItem, preview_words: usize) -> RenderedItem {
    let plain = strip_html(item.description.as_deref().unwrap_or_default());

    RenderedItem {
        title: item.title.clone().unwrap_or_default(),
        link: item.link.clone().unwrap_or_default(),
        formatted_date: item
            .pub_date
            .as_deref()
            .and_then(parse_pub_date)
            .map(|date| format_german_date(&date))
            .unwrap_or_default(),
        preview_text: preview_text(&plain, preview_words),
    }
}

/// Reduce HTML to its text content.
/// - `<script>` and `<style>` blocks are dropped entirely
/// - tags and comments are removed without inserting whitespace
/// - entities are decoded, then the ends are trimmed
pub fn strip_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let mut buf = html.to_string();
    for tag in ["script", "style"] {
        let open = format!("<{tag}");
        let close = format!("</{tag}>");
        loop {
            // ASCII lowercasing keeps byte offsets aligned with `buf`
            let lower = buf.to_ascii_lowercase();
            let Some(start) = find_tag_open(&lower, &open) else {
                break;
            };
            match lower[start..].find(&close) {
                Some(end_rel) => buf.replace_range(start..start + end_rel + close.len(), ""),
                None => buf.truncate(start),
            }
        }
    }

    let mut text = String::with_capacity(buf.len());
    let mut rest = buf.as_str();
    while let Some(pos) = rest.find('<') {
        text.push_str(&rest[..pos]);
        let after = &rest[pos..];
        if after.starts_with("<!--") {
            rest = match after.find("-->") {
                Some(end) => &after[end + 3..],
                None => "",
            };
        } else if starts_markup(after) {
            rest = match after.find('>') {
                Some(end) => &after[end + 1..],
                None => "",
            };
        } else {
            // a bare `<` is text
            text.push('<');
            rest = &after[1..];
        }
    }
    text.push_str(rest);

    html_escape::decode_html_entities(&text).trim().to_string()
}

/// First `open` (e.g. `<script`) that is a whole tag name, not a prefix of one.
fn find_tag_open(lower: &str, open: &str) -> Option<usize> {
    lower.match_indices(open).map(|(pos, _)| pos).find(|&pos| {
        matches!(
            lower[pos + open.len()..].chars().next(),
            Some(c) if c == '>' || c == '/' || c.is_ascii_whitespace()
        )
    })
}

fn starts_markup(s: &str) -> bool {
    matches!(
        s.chars().nth(1),
        Some(c) if c.is_ascii_alphabetic() || c == '/' || c == '!' || c == '?'
    )
}

/// First `max_words` whitespace-separated tokens joined by single spaces,
/// followed by `ELLIPSIS` when anything was cut.
pub fn preview_text(plain: &str, max_words: usize) -> String {
    let words: Vec<&str> = plain.split_whitespace().collect();
    let mut preview = words
        .iter()
        .take(max_words)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if words.len() > max_words {
        preview.push_str(ELLIPSIS);
    }
    preview
}

/// Zone-less datetime shapes, read as UTC. `%.f` also matches no fraction.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse the date shapes seen in feeds: RFC 3339, the proxy's
/// `YYYY-MM-DD HH:MM:SS` and ISO 8601 without offset (both UTC, optional
/// fractional seconds), RFC 2822 and a bare `YYYY-MM-DD`.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    if let Some(date) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(date.and_utc());
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}

/// German long form, e.g. `1. Mai 2023`
pub fn format_german_date(date: &DateTime<Utc>) -> String {
    date.format_localized("%-d. %B %Y", Locale::de_DE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (1..=n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_strip_html_removes_tags_and_decodes_entities() {
        let html = "  <p>Bitcoin &amp; Ether <strong>steigen</strong> &uuml;ber&nbsp;Nacht</p>\n";
        assert_eq!(strip_html(html), "Bitcoin & Ether steigen über\u{a0}Nacht");
    }

    #[test]
    fn test_strip_html_leaves_no_tag_characters() {
        let html = r#"<div class="x"><img src="a.png" alt="a"/><a href="https://x.test">Link</a><br>Text<!-- hidden --></div>"#;
        let text = strip_html(html);
        assert_eq!(text, "LinkText");
        assert!(!text.contains('<') && !text.contains('>'));
    }

    #[test]
    fn test_strip_html_drops_script_and_style() {
        let html = "<style>p { color: red }</style>Hallo <SCRIPT>alert('x')</SCRIPT>Welt";
        assert_eq!(strip_html(html), "Hallo Welt");
    }

    #[test]
    fn test_strip_html_keeps_tags_that_only_start_like_script() {
        assert_eq!(
            strip_html("<scripture>Psalm 23</scripture> und <styled-x>Stil</styled-x>"),
            "Psalm 23 und Stil"
        );
    }

    #[test]
    fn test_strip_html_keeps_bare_less_than() {
        assert_eq!(strip_html("1 < 2 <b>ok</b>"), "1 < 2 ok");
    }

    #[test]
    fn test_strip_html_unclosed_tag_and_empty() {
        assert_eq!(strip_html("Text <a href="), "Text");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn test_preview_short_text_has_no_ellipsis() {
        assert_eq!(preview_text("  eins \n zwei\tdrei ", 40), "eins zwei drei");
        assert_eq!(preview_text(&words(40), 40), words(40));
    }

    #[test]
    fn test_preview_truncates_to_word_limit() {
        let preview = preview_text(&words(41), 40);
        assert!(preview.ends_with(ELLIPSIS));
        let body = preview.strip_suffix(ELLIPSIS).unwrap();
        assert_eq!(body.split(' ').count(), 40);
        assert_eq!(body, words(40));
    }

    #[test]
    fn test_preview_empty_text() {
        assert_eq!(preview_text("", 40), "");
        assert_eq!(preview_text("   ", 40), "");
    }

    #[test]
    fn test_german_date_formats() {
        let cases = [
            ("2023-05-01T00:00:00Z", "1. Mai 2023"),
            ("2023-03-15 18:30:00", "15. März 2023"),
            ("Tue, 12 Dec 2023 09:00:00 +0000", "12. Dezember 2023"),
            ("2024-01-09", "9. Januar 2024"),
        ];
        for (raw, expected) in cases {
            let date = parse_pub_date(raw).unwrap_or_else(|| panic!("unparsed: {raw}"));
            assert_eq!(format_german_date(&date), expected, "input: {raw}");
        }
    }

    #[test]
    fn test_zoneless_and_fractional_dates() {
        let cases = [
            ("2023-05-01T10:00:00", "1. Mai 2023"),
            ("2023-05-01T23:59:59.250", "1. Mai 2023"),
            ("2023-06-02 08:15:30.5", "2. Juni 2023"),
        ];
        for (raw, expected) in cases {
            let date = parse_pub_date(raw).unwrap_or_else(|| panic!("unparsed: {raw}"));
            assert_eq!(format_german_date(&date), expected, "input: {raw}");
        }
    }

    #[test]
    fn test_offset_dates_are_normalized_to_utc() {
        let date = parse_pub_date("2023-05-01T01:30:00+02:00").unwrap();
        assert_eq!(format_german_date(&date), "30. April 2023");
    }

    #[test]
    fn test_unparseable_date() {
        assert!(parse_pub_date("gestern").is_none());
        let item = FeedItem {
            pub_date: Some("gestern".to_string()),
            ..Default::default()
        };
        assert_eq!(transform_item(&item, 40).formatted_date, "");
    }

    #[test]
    fn test_transform_item() {
        let item = FeedItem {
            title: Some("Kurs steigt".to_string()),
            link: Some("https://news.test/1".to_string()),
            pub_date: Some("2023-05-01 12:00:00".to_string()),
            description: Some(format!("<p>{}</p>", words(45))),
        };
        let rendered = transform_item(&item, 40);
        assert_eq!(rendered.title, "Kurs steigt");
        assert_eq!(rendered.link, "https://news.test/1");
        assert_eq!(rendered.formatted_date, "1. Mai 2023");
        assert_eq!(rendered.preview_text, format!("{}{}", words(40), ELLIPSIS));
    }

    #[test]
    fn test_transform_missing_fields() {
        let rendered = transform_item(&FeedItem::default(), 40);
        assert_eq!(rendered, RenderedItem::default());
    }

    #[test]
    fn test_transform_items_keeps_order_and_limit() {
        let items: Vec<FeedItem> = (0..15)
            .map(|i| FeedItem {
                title: Some(format!("Item {i}")),
                ..Default::default()
            })
            .collect();

        let rendered = transform_items(&items, Limits::default());
        assert_eq!(rendered.len(), 10);
        for (i, item) in rendered.iter().enumerate() {
            assert_eq!(item.title, format!("Item {i}"));
        }

        assert_eq!(transform_items(&items[..3], Limits::default()).len(), 3);
        assert!(transform_items(&[], Limits::default()).is_empty());
    }
}
